//! Tagged value container
//!
//! A [`Value`] pairs an immutable [`TypeTag`] with the payload the document
//! model reads and edits. Scalar payloads are stored inline; strings, byte
//! arrays and matrices are owned out-of-line and deep-copied on clone. The
//! payload representation for a tag is fixed: the decoder, encoder and size
//! calculator all assume the pairing established by [`Value::new`].

use crate::types::TypeTag;

/// Payload storage for a [`Value`].
///
/// The active variant is determined by the container's tag; swapping in a
/// variant that does not belong to the tag makes the codec report a
/// tag-mismatch failure rather than guessing a layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No payload (the no-value tag, or an unallocated blob).
    None,
    /// Unsigned 8-bit scalar.
    U8(u8),
    /// Unsigned 16-bit scalar.
    U16(u16),
    /// Unsigned 32-bit scalar. Booleans are kept raw here so nonzero file
    /// values round-trip unchanged.
    U32(u32),
    /// Unsigned 64-bit scalar.
    U64(u64),
    /// Signed 32-bit scalar (links).
    I32(i32),
    /// Single-precision float.
    F32(f32),
    /// Up to four float components; unused lanes hold the decoder's fill.
    Vec4([f32; 4]),
    /// Three 16-bit vertex indices.
    Triangle([u16; 3]),
    /// Owned text.
    Text(String),
    /// Owned raw bytes.
    Bytes(Vec<u8>),
    /// 3x3 row-major float matrix.
    Matrix3(Box<[f32; 9]>),
    /// 4x4 row-major float matrix.
    Matrix4(Box<[f32; 16]>),
    /// Two-dimensional byte grid.
    ByteMatrix(ByteMatrix),
}

/// Row-major byte grid with owned storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteMatrix {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl ByteMatrix {
    /// Create a zero-filled matrix with the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Wrap existing row-major bytes. The data length must be width * height.
    pub fn from_bytes(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the grid holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major byte storage.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable row-major byte storage.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// A typed field value.
///
/// The tag is set at construction and never changes; all mutation goes
/// through the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    tag: TypeTag,
    /// Current payload. Must stay on the representation [`Value::new`]
    /// establishes for the tag.
    pub payload: Payload,
}

impl Value {
    /// Create a value with the canonical empty payload for `tag`.
    pub fn new(tag: TypeTag) -> Self {
        let payload = match tag {
            TypeTag::None | TypeTag::Blob => Payload::None,
            TypeTag::Byte => Payload::U8(0),
            TypeTag::Word | TypeTag::Flags | TypeTag::Short | TypeTag::BlockTypeIndex => {
                Payload::U16(0)
            }
            TypeTag::Bool
            | TypeTag::Int
            | TypeTag::UInt
            | TypeTag::LittleU32
            | TypeTag::StringOffset
            | TypeTag::StringIndex
            | TypeTag::FileVersion => Payload::U32(0),
            TypeTag::Int64 | TypeTag::UInt64 | TypeTag::VertexDesc => Payload::U64(0),
            TypeTag::Link | TypeTag::ParentLink => Payload::I32(-1),
            TypeTag::Float | TypeTag::HalfFloat | TypeTag::NormByte => Payload::F32(0.0),
            TypeTag::ByteVector3
            | TypeTag::ShortVector3
            | TypeTag::UShortVector3
            | TypeTag::HalfVector3
            | TypeTag::HalfVector2
            | TypeTag::ByteVector4
            | TypeTag::UDecVector4
            | TypeTag::Vector2
            | TypeTag::Vector3
            | TypeTag::Vector4
            | TypeTag::Color3
            | TypeTag::Color4
            | TypeTag::ByteColor4
            | TypeTag::ByteColor4Bgra
            | TypeTag::QuatWxyz
            | TypeTag::QuatXyzw => Payload::Vec4([0.0; 4]),
            TypeTag::Triangle => Payload::Triangle([0; 3]),
            TypeTag::SizedString
            | TypeTag::SizedString16
            | TypeTag::ShortString
            | TypeTag::Text
            | TypeTag::HeaderString
            | TypeTag::LineString
            | TypeTag::Char8String => Payload::Text(String::new()),
            TypeTag::ByteArray | TypeTag::StringPalette => Payload::Bytes(Vec::new()),
            TypeTag::Matrix3 => Payload::Matrix3(Box::new([0.0; 9])),
            TypeTag::Matrix4 => Payload::Matrix4(Box::new([0.0; 16])),
            TypeTag::ByteMatrix => Payload::ByteMatrix(ByteMatrix::default()),
        };
        Self { tag, payload }
    }

    /// The immutable type tag.
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Unsigned 32-bit payload, if that is the active representation.
    pub fn as_u32(&self) -> Option<u32> {
        match self.payload {
            Payload::U8(v) => Some(u32::from(v)),
            Payload::U16(v) => Some(u32::from(v)),
            Payload::U32(v) => Some(v),
            _ => None,
        }
    }

    /// Unsigned 64-bit payload.
    pub fn as_u64(&self) -> Option<u64> {
        match self.payload {
            Payload::U64(v) => Some(v),
            _ => self.as_u32().map(u64::from),
        }
    }

    /// Signed 32-bit payload (links).
    pub fn as_i32(&self) -> Option<i32> {
        match self.payload {
            Payload::I32(v) => Some(v),
            _ => None,
        }
    }

    /// Float payload.
    pub fn as_f32(&self) -> Option<f32> {
        match self.payload {
            Payload::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Component payload of vector, color and quaternion tags.
    pub fn as_vec4(&self) -> Option<[f32; 4]> {
        match self.payload {
            Payload::Vec4(v) => Some(v),
            _ => None,
        }
    }

    /// Text payload of string tags.
    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Byte payload of array, palette and blob tags.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Set a scalar payload, keeping the current unsigned representation.
    pub fn set_u32(&mut self, v: u32) {
        match &mut self.payload {
            Payload::U8(p) => *p = v as u8,
            Payload::U16(p) => *p = v as u16,
            Payload::U32(p) => *p = v,
            Payload::U64(p) => *p = u64::from(v),
            _ => {}
        }
    }

    /// Set a signed link payload.
    pub fn set_i32(&mut self, v: i32) {
        if let Payload::I32(p) = &mut self.payload {
            *p = v;
        }
    }

    /// Set a float payload.
    pub fn set_f32(&mut self, v: f32) {
        if let Payload::F32(p) = &mut self.payload {
            *p = v;
        }
    }

    /// Set the component payload of a vector, color or quaternion tag.
    pub fn set_vec4(&mut self, v: [f32; 4]) {
        if let Payload::Vec4(p) = &mut self.payload {
            *p = v;
        }
    }

    /// Set the text payload of a string tag.
    pub fn set_text(&mut self, s: impl Into<String>) {
        if let Payload::Text(p) = &mut self.payload {
            *p = s.into();
        }
    }

    /// Set the byte payload of an array or palette tag. For blobs this also
    /// allocates the payload and thereby fixes the wire length.
    pub fn set_bytes(&mut self, bytes: Vec<u8>) {
        match self.tag {
            TypeTag::ByteArray | TypeTag::StringPalette | TypeTag::Blob => {
                self.payload = Payload::Bytes(bytes);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pairs_tag_with_canonical_payload() {
        assert_eq!(Value::new(TypeTag::Bool).payload, Payload::U32(0));
        assert_eq!(Value::new(TypeTag::Link).payload, Payload::I32(-1));
        assert_eq!(Value::new(TypeTag::Blob).payload, Payload::None);
        assert_eq!(
            Value::new(TypeTag::Vector3).payload,
            Payload::Vec4([0.0; 4])
        );
        assert_eq!(
            Value::new(TypeTag::ShortString).payload,
            Payload::Text(String::new())
        );
    }

    #[test]
    fn test_tag_is_immutable_after_construction() {
        let mut v = Value::new(TypeTag::Float);
        v.set_f32(2.5);
        assert_eq!(v.tag(), TypeTag::Float);
        assert_eq!(v.as_f32(), Some(2.5));
    }

    #[test]
    fn test_typed_setters_ignore_mismatched_tags() {
        let mut v = Value::new(TypeTag::Float);
        v.set_text("ignored");
        assert_eq!(v.as_f32(), Some(0.0));
        assert_eq!(v.as_str(), None);
    }

    #[test]
    fn test_clone_deep_copies_out_of_line_payloads() {
        let mut a = Value::new(TypeTag::ByteArray);
        a.set_bytes(vec![1, 2, 3]);
        let b = a.clone();
        a.set_bytes(vec![9]);
        assert_eq!(b.as_bytes(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_blob_allocation_via_set_bytes() {
        let mut blob = Value::new(TypeTag::Blob);
        assert_eq!(blob.payload, Payload::None);
        blob.set_bytes(vec![0; 16]);
        assert_eq!(blob.as_bytes().map(<[u8]>::len), Some(16));
    }

    #[test]
    fn test_byte_matrix_dimensions() {
        let m = ByteMatrix::new(3, 2);
        assert_eq!(m.width(), 3);
        assert_eq!(m.height(), 2);
        assert_eq!(m.len(), 6);
        assert!(!m.is_empty());
    }
}
