//! Serialized size calculator

use sgb_format::strings::{latin1_len, short_string_payload};
use sgb_format::{TypeTag, Value, Version};

use crate::context::FormatContext;

/// Computes the exact number of bytes [`crate::ValueWriter`] would produce
/// for a value, without touching any channel.
///
/// Fixed-width tags resolve through [`TypeTag::fixed_size`]; variable-length
/// tags apply the same shared truncation rules the writer uses, so the two
/// cannot disagree. Used by the document model to plan record layouts and
/// validate stream offsets.
pub struct ValueSizer {
    bool32: bool,
}

impl ValueSizer {
    /// Derive the version-dependent sizing flags from a document context.
    pub fn new<C: FormatContext>(ctx: &C) -> Self {
        Self {
            bool32: ctx.is_scene_document() && Version(ctx.version()).has_32bit_bools(),
        }
    }

    /// The encoded length of `val` in bytes.
    pub fn size(&self, val: &Value) -> usize {
        if let Some(n) = val.tag().fixed_size() {
            return n;
        }

        match val.tag() {
            TypeTag::Bool => {
                if self.bool32 {
                    4
                } else {
                    1
                }
            }
            TypeTag::SizedString => 4 + latin1_len(val.as_str().unwrap_or("")),
            TypeTag::SizedString16 => 2 + latin1_len(val.as_str().unwrap_or("")),
            TypeTag::ShortString => 1 + short_string_payload(val.as_str().unwrap_or("")).len(),
            TypeTag::Text => 4 + latin1_len(val.as_str().unwrap_or("")),
            TypeTag::HeaderString | TypeTag::LineString => {
                latin1_len(val.as_str().unwrap_or("")) + 1
            }
            TypeTag::ByteArray => 4 + val.as_bytes().map_or(0, <[u8]>::len),
            TypeTag::StringPalette => 4 + val.as_bytes().map_or(0, <[u8]>::len) + 4,
            TypeTag::ByteMatrix => match &val.payload {
                sgb_format::Payload::ByteMatrix(m) => 4 + 4 + m.len(),
                _ => 8,
            },
            TypeTag::Blob => val.as_bytes().map_or(0, <[u8]>::len),
            _ => 0,
        }
    }
}
