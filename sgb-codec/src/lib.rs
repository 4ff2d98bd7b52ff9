//! SGB Codec - Typed value decoder, encoder and size calculator
//!
//! This crate converts between the byte stream of an SGB scene file and the
//! typed value containers owned by the document model:
//!
//! - [`ValueReader`] decodes bytes from a seekable channel into a container
//!   whose tag the schema has already established
//! - [`ValueWriter`] encodes a container back out, byte-for-byte
//! - [`ValueSizer`] computes the exact encoded length without any I/O
//!
//! All three derive their version-dependent behavior from a [`FormatContext`]
//! supplied by the owning document. A reader or writer is bound to exactly one
//! channel and one context for its lifetime; parallel decodes of independent
//! streams use independent instances.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod reader;
pub mod sizer;
pub mod writer;

// Re-export commonly used types
pub use sgb_format::{ByteMatrix, Limits, Payload, Result, SgbError, TypeTag, Value, Version};

pub use context::FormatContext;
pub use reader::ValueReader;
pub use sizer::ValueSizer;
pub use writer::ValueWriter;
