//! Input limits
//!
//! Declared lengths above these bounds are treated as corrupt input, not
//! merely large input.

/// Limits applied to length-prefixed fields while decoding.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum accepted declared length for sized strings and free text.
    pub max_string_len: i32,
    /// Maximum accepted declared length for a string palette block.
    pub max_palette_len: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_string_len: 0x8000,
            max_palette_len: 0xFFFF,
        }
    }
}
