//! Type tag enumeration
//!
//! Every field value in an SGB file is one of these kinds. A tag names exactly
//! one wire layout and exactly one in-memory payload representation; the
//! decoder, encoder and size calculator all dispatch over this enum.

/// Type tag for a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// No value; zero bytes on the wire.
    None,
    /// Boolean; one byte, or four in old-format streams.
    Bool,
    /// Unsigned 8-bit integer.
    Byte,
    /// Unsigned 16-bit integer.
    Word,
    /// 16-bit bit-flag field.
    Flags,
    /// 16-bit integer.
    Short,
    /// 16-bit index into the record type table.
    BlockTypeIndex,
    /// Signed 32-bit integer.
    Int,
    /// Unsigned 32-bit integer.
    UInt,
    /// Unsigned 32-bit integer that is always little-endian on the wire.
    LittleU32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    UInt64,
    /// 32-bit offset into a string palette.
    StringOffset,
    /// 32-bit index into the string table.
    StringIndex,
    /// Signed 32-bit record reference.
    Link,
    /// Signed 32-bit reference to a parent record.
    ParentLink,
    /// IEEE-754 single-precision float.
    Float,
    /// Half-precision float, widened to f32 in memory.
    HalfFloat,
    /// Byte-quantized float in [-1, +1].
    NormByte,
    /// Three byte-quantized components in [-1, +1].
    ByteVector3,
    /// Three signed 16-bit components in [-1, +1].
    ShortVector3,
    /// Three unsigned 16-bit components in [0, 1].
    UShortVector3,
    /// Three half-precision components.
    HalfVector3,
    /// Two half-precision components.
    HalfVector2,
    /// Four byte-quantized components packed into 32 bits.
    ByteVector4,
    /// Four components packed into 10-10-10-2 bits.
    UDecVector4,
    /// Two single-precision components.
    Vector2,
    /// Three single-precision components.
    Vector3,
    /// Four single-precision components.
    Vector4,
    /// RGB color, three single-precision components.
    Color3,
    /// RGBA color, four single-precision components.
    Color4,
    /// RGBA color packed into four bytes.
    ByteColor4,
    /// RGBA color packed into four bytes in B,G,R,A wire order.
    ByteColor4Bgra,
    /// Quaternion stored W,X,Y,Z on the wire.
    QuatWxyz,
    /// Quaternion stored X,Y,Z,W on the wire.
    QuatXyzw,
    /// 3x3 matrix of row-major floats.
    Matrix3,
    /// 4x4 matrix of row-major floats.
    Matrix4,
    /// Three 16-bit vertex indices.
    Triangle,
    /// String with a 32-bit length prefix.
    SizedString,
    /// String with a 16-bit length prefix.
    SizedString16,
    /// String with a one-byte length prefix and a NUL terminator.
    ShortString,
    /// Free text with a 32-bit length prefix.
    Text,
    /// Newline-terminated file header line, capped at 80 bytes.
    HeaderString,
    /// Newline-terminated line, capped at 255 bytes.
    LineString,
    /// Fixed 8-byte character field, zero-padded.
    Char8String,
    /// Opaque bytes with a 32-bit length prefix.
    ByteArray,
    /// Length-prefixed palette block with a redundant trailing length.
    StringPalette,
    /// Two 32-bit dimensions followed by width * height raw bytes.
    ByteMatrix,
    /// The stream's format version word.
    FileVersion,
    /// Packed 64-bit vertex layout descriptor, passed through opaquely.
    VertexDesc,
    /// Raw bytes whose length is established by the owning document.
    Blob,
}

impl TypeTag {
    /// Wire length for tags whose size depends on neither payload nor format
    /// version. Returns `None` for variable-length and version-dependent tags.
    ///
    /// This is the single source of truth shared by the encoder and the size
    /// calculator for fixed-width layouts.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            TypeTag::None => Some(0),
            TypeTag::Byte | TypeTag::NormByte => Some(1),
            TypeTag::Word
            | TypeTag::Flags
            | TypeTag::Short
            | TypeTag::BlockTypeIndex
            | TypeTag::HalfFloat => Some(2),
            TypeTag::ByteVector3 => Some(3),
            TypeTag::Int
            | TypeTag::UInt
            | TypeTag::LittleU32
            | TypeTag::StringOffset
            | TypeTag::StringIndex
            | TypeTag::Link
            | TypeTag::ParentLink
            | TypeTag::Float
            | TypeTag::FileVersion
            | TypeTag::HalfVector2
            | TypeTag::ByteVector4
            | TypeTag::UDecVector4
            | TypeTag::ByteColor4
            | TypeTag::ByteColor4Bgra => Some(4),
            TypeTag::ShortVector3
            | TypeTag::UShortVector3
            | TypeTag::HalfVector3
            | TypeTag::Triangle => Some(6),
            TypeTag::Int64 | TypeTag::UInt64 | TypeTag::VertexDesc | TypeTag::Vector2 => Some(8),
            TypeTag::Char8String => Some(8),
            TypeTag::Vector3 | TypeTag::Color3 => Some(12),
            TypeTag::Vector4 | TypeTag::Color4 | TypeTag::QuatWxyz | TypeTag::QuatXyzw => Some(16),
            TypeTag::Matrix3 => Some(36),
            TypeTag::Matrix4 => Some(64),
            // Bool is version-dependent; everything below depends on payload.
            TypeTag::Bool
            | TypeTag::SizedString
            | TypeTag::SizedString16
            | TypeTag::ShortString
            | TypeTag::Text
            | TypeTag::HeaderString
            | TypeTag::LineString
            | TypeTag::ByteArray
            | TypeTag::StringPalette
            | TypeTag::ByteMatrix
            | TypeTag::Blob => None,
        }
    }

    /// True for tags that store text in the container.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            TypeTag::SizedString
                | TypeTag::SizedString16
                | TypeTag::ShortString
                | TypeTag::Text
                | TypeTag::HeaderString
                | TypeTag::LineString
                | TypeTag::Char8String
        )
    }

}
