//! Error types for the SGB codec

use thiserror::Error;

use crate::types::TypeTag;

/// SGB codec error types
#[derive(Debug, Error)]
pub enum SgbError {
    /// The channel yielded fewer bytes than the tag's layout requires.
    #[error("Unexpected end of stream")]
    UnexpectedEof,
    /// A declared string length exceeds the configured maximum.
    #[error("String length 0x{0:x} exceeds the configured maximum")]
    StringTooLong(i64),
    /// A declared length field is negative.
    #[error("Negative length field: {0}")]
    NegativeLength(i32),
    /// A terminated line overran its byte cap without a newline.
    #[error("Line exceeds {0} bytes without a terminator")]
    UnterminatedLine(usize),
    /// The document rejected the decoded header string.
    #[error("Header string rejected by the document")]
    HeaderRejected,
    /// A blob read was attempted on a container with no allocated payload.
    #[error("No payload allocated for blob")]
    MissingPayload,
    /// The container's payload does not match its type tag.
    #[error("Payload does not match tag {0:?}")]
    TagMismatch(TypeTag),
    /// I/O operation failed while reading or writing the channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SgbError>;
