//! Typed value encoder

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use sgb_format::packed;
use sgb_format::strings::{short_string_payload, to_latin1};
use sgb_format::version::{LEGACY_VENDOR_MAGIC, LEGACY_VENDOR_PREFIX};
use sgb_format::{Payload, Result, SgbError, TypeTag, Value, Version};

use crate::context::FormatContext;

/// Encodes typed values onto a byte channel, mirroring the decoder's
/// per-tag layouts byte for byte.
///
/// The writer derives its version flags from the context independently of
/// any reader instance. Output is always little-endian; big-endian streams
/// are a read-only legacy.
pub struct ValueWriter<'a, W: Write, C: FormatContext> {
    channel: &'a mut W,
    ctx: &'a C,
    bool32: bool,
    link_adjust: bool,
}

impl<'a, W: Write, C: FormatContext> ValueWriter<'a, W, C> {
    /// Bind a writer to a channel and a document context.
    pub fn new(channel: &'a mut W, ctx: &'a C) -> Self {
        let scene = ctx.is_scene_document();
        let version = Version(ctx.version());
        Self {
            channel,
            ctx,
            bool32: scene && version.has_32bit_bools(),
            link_adjust: scene && version.stores_one_based_links(),
        }
    }

    /// Encode one value. Returns false on any short write; the caller must
    /// treat that as a fatal save error.
    pub fn write(&mut self, val: &Value) -> bool {
        self.write_value(val).is_ok()
    }

    /// Encode one value, reporting the failure cause.
    pub fn write_value(&mut self, val: &Value) -> Result<()> {
        match val.tag() {
            TypeTag::None => Ok(()),
            TypeTag::Bool => {
                let v = want_u32(val)?;
                if self.bool32 {
                    self.write_u32(v)
                } else {
                    self.write_u8(v as u8)
                }
            }
            TypeTag::Byte => self.write_u8(want_u32(val)? as u8),
            TypeTag::Word | TypeTag::Flags | TypeTag::Short | TypeTag::BlockTypeIndex => {
                self.write_u16(want_u32(val)? as u16)
            }
            TypeTag::StringOffset
            | TypeTag::StringIndex
            | TypeTag::Int
            | TypeTag::UInt
            | TypeTag::LittleU32 => self.write_u32(want_u32(val)?),
            TypeTag::Int64 | TypeTag::UInt64 => self.write_u64(want_u64(val)?),
            TypeTag::FileVersion => {
                // Round-trip shim: files from the legacy vendor tool carry
                // its magic in place of the stored version.
                let stored = want_u32(val)?;
                let word = match self.ctx.header_string() {
                    Some(header) if header.starts_with(LEGACY_VENDOR_PREFIX) => {
                        LEGACY_VENDOR_MAGIC
                    }
                    _ => stored,
                };
                self.write_u32(word)
            }
            TypeTag::Link | TypeTag::ParentLink => {
                let mut link = want_i32(val)?;
                if self.link_adjust {
                    link = link.wrapping_add(1);
                }
                self.write_i32(link)
            }
            TypeTag::Float => self.write_f32(want_f32(val)?),
            TypeTag::HalfFloat => self.write_u16(packed::pack_half(want_f32(val)?)),
            TypeTag::NormByte => self.write_u8(packed::pack_byte_norm(want_f32(val)?)),
            TypeTag::ByteVector3 => {
                let v = want_vec4(val)?;
                self.write_all(&[
                    packed::pack_byte_norm(v[0]),
                    packed::pack_byte_norm(v[1]),
                    packed::pack_byte_norm(v[2]),
                ])
            }
            TypeTag::ShortVector3 => {
                let v = want_vec4(val)?;
                for c in &v[..3] {
                    self.write_i16(packed::pack_snorm16(*c))?;
                }
                Ok(())
            }
            TypeTag::UShortVector3 => {
                let v = want_vec4(val)?;
                for c in &v[..3] {
                    self.write_u16(packed::pack_unorm16(*c))?;
                }
                Ok(())
            }
            TypeTag::HalfVector3 => {
                let v = want_vec4(val)?;
                for c in &v[..3] {
                    self.write_u16(packed::pack_half(*c))?;
                }
                Ok(())
            }
            TypeTag::HalfVector2 => {
                let v = want_vec4(val)?;
                for c in &v[..2] {
                    self.write_u16(packed::pack_half(*c))?;
                }
                Ok(())
            }
            TypeTag::Vector3 | TypeTag::Color3 => {
                let v = want_vec4(val)?;
                for c in &v[..3] {
                    self.write_f32(*c)?;
                }
                Ok(())
            }
            TypeTag::Vector4 | TypeTag::Color4 | TypeTag::QuatWxyz => {
                let v = want_vec4(val)?;
                for c in &v {
                    self.write_f32(*c)?;
                }
                Ok(())
            }
            TypeTag::QuatXyzw => {
                // Canonical order is w,x,y,z; the wire wants x,y,z,w.
                let v = want_vec4(val)?;
                for c in [v[1], v[2], v[3], v[0]] {
                    self.write_f32(c)?;
                }
                Ok(())
            }
            TypeTag::ByteVector4 => {
                let v = want_vec4(val)?;
                self.write_all(&[
                    packed::pack_byte_norm(v[0]),
                    packed::pack_byte_norm(v[1]),
                    packed::pack_byte_norm(v[2]),
                    packed::pack_byte_norm(v[3]),
                ])
            }
            TypeTag::UDecVector4 => self.write_u32(packed::pack_udec(want_vec4(val)?)),
            TypeTag::Triangle => {
                let t = want_triangle(val)?;
                for i in &t {
                    self.write_u16(*i)?;
                }
                Ok(())
            }
            TypeTag::Matrix3 => match &val.payload {
                Payload::Matrix3(m) => {
                    for f in m.iter() {
                        self.write_f32(*f)?;
                    }
                    Ok(())
                }
                _ => Err(SgbError::TagMismatch(val.tag())),
            },
            TypeTag::Matrix4 => match &val.payload {
                Payload::Matrix4(m) => {
                    for f in m.iter() {
                        self.write_f32(*f)?;
                    }
                    Ok(())
                }
                _ => Err(SgbError::TagMismatch(val.tag())),
            },
            TypeTag::Vector2 => {
                let v = want_vec4(val)?;
                for c in &v[..2] {
                    self.write_f32(*c)?;
                }
                Ok(())
            }
            TypeTag::ByteColor4 => self.write_u32(packed::pack_byte_color4(want_vec4(val)?)),
            TypeTag::ByteColor4Bgra => {
                let c = want_vec4(val)?;
                self.write_u32(packed::pack_byte_color4([c[2], c[1], c[0], c[3]]))
            }
            TypeTag::SizedString => {
                let content = to_latin1(want_str(val)?);
                self.write_u32(content.len() as u32)?;
                self.write_all(&content)
            }
            TypeTag::SizedString16 => {
                let content = to_latin1(want_str(val)?);
                self.write_u16(content.len() as u16)?;
                self.write_all(&content)
            }
            TypeTag::ShortString => {
                let payload = short_string_payload(want_str(val)?);
                self.write_u8(payload.len() as u8)?;
                self.write_all(&payload)
            }
            TypeTag::Text => {
                let content = to_latin1(want_str(val)?);
                self.write_i32(content.len() as i32)?;
                self.write_all(&content)
            }
            TypeTag::HeaderString | TypeTag::LineString => {
                let content = to_latin1(want_str(val)?);
                self.write_all(&content)?;
                self.write_all(b"\n")
            }
            TypeTag::Char8String => {
                let mut content = to_latin1(want_str(val)?);
                content.truncate(8);
                content.resize(8, 0);
                self.write_all(&content)
            }
            TypeTag::ByteArray => {
                let bytes = want_bytes(val)?;
                self.write_u32(bytes.len() as u32)?;
                self.write_all(bytes)
            }
            TypeTag::StringPalette => {
                let bytes = want_bytes(val)?;
                self.write_u32(bytes.len() as u32)?;
                self.write_all(bytes)?;
                // Redundant trailing copy of the length word.
                self.write_u32(bytes.len() as u32)
            }
            TypeTag::ByteMatrix => match &val.payload {
                Payload::ByteMatrix(m) => {
                    self.write_i32(m.width() as i32)?;
                    self.write_i32(m.height() as i32)?;
                    self.write_all(m.data())
                }
                _ => Err(SgbError::TagMismatch(val.tag())),
            },
            TypeTag::VertexDesc => self.write_u64(want_u64(val)?),
            TypeTag::Blob => match &val.payload {
                Payload::Bytes(bytes) => self.write_all(bytes),
                // An unallocated blob writes nothing and succeeds.
                Payload::None => Ok(()),
                _ => Err(SgbError::TagMismatch(val.tag())),
            },
        }
    }

    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.channel.write_u8(v).map_err(map_io)
    }

    fn write_u16(&mut self, v: u16) -> Result<()> {
        self.channel.write_u16::<LittleEndian>(v).map_err(map_io)
    }

    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.channel.write_i16::<LittleEndian>(v).map_err(map_io)
    }

    fn write_u32(&mut self, v: u32) -> Result<()> {
        self.channel.write_u32::<LittleEndian>(v).map_err(map_io)
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.channel.write_i32::<LittleEndian>(v).map_err(map_io)
    }

    fn write_u64(&mut self, v: u64) -> Result<()> {
        self.channel.write_u64::<LittleEndian>(v).map_err(map_io)
    }

    fn write_f32(&mut self, v: f32) -> Result<()> {
        self.write_u32(v.to_bits())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.channel.write_all(bytes).map_err(map_io)
    }
}

fn map_io(e: io::Error) -> SgbError {
    SgbError::Io(e)
}

fn want_u32(val: &Value) -> Result<u32> {
    val.as_u32().ok_or(SgbError::TagMismatch(val.tag()))
}

fn want_u64(val: &Value) -> Result<u64> {
    val.as_u64().ok_or(SgbError::TagMismatch(val.tag()))
}

fn want_i32(val: &Value) -> Result<i32> {
    val.as_i32().ok_or(SgbError::TagMismatch(val.tag()))
}

fn want_f32(val: &Value) -> Result<f32> {
    val.as_f32().ok_or(SgbError::TagMismatch(val.tag()))
}

fn want_vec4(val: &Value) -> Result<[f32; 4]> {
    val.as_vec4().ok_or(SgbError::TagMismatch(val.tag()))
}

fn want_str(val: &Value) -> Result<&str> {
    val.as_str().ok_or(SgbError::TagMismatch(val.tag()))
}

fn want_bytes(val: &Value) -> Result<&[u8]> {
    val.as_bytes().ok_or(SgbError::TagMismatch(val.tag()))
}

fn want_triangle(val: &Value) -> Result<[u16; 3]> {
    match val.payload {
        Payload::Triangle(t) => Ok(t),
        _ => Err(SgbError::TagMismatch(val.tag())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx {
        version: u32,
        scene: bool,
        header: Option<String>,
    }

    impl FormatContext for Ctx {
        fn version(&self) -> u32 {
            self.version
        }
        fn is_scene_document(&self) -> bool {
            self.scene
        }
        fn header_string(&self) -> Option<String> {
            self.header.clone()
        }
        fn set_header_string(&mut self, _text: &str, version: u32) -> bool {
            self.version = version;
            true
        }
    }

    fn write_one(ctx: &Ctx, val: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = ValueWriter::new(&mut out, ctx);
        assert!(writer.write(val));
        out
    }

    fn scene_ctx(version: u32) -> Ctx {
        Ctx {
            version,
            scene: true,
            header: None,
        }
    }

    #[test]
    fn test_link_adjustment_writes_one_based() {
        let ctx = scene_ctx(0x0303_000C);
        let mut link = Value::new(TypeTag::Link);
        link.set_i32(-1);
        assert_eq!(write_one(&ctx, &link), 0i32.to_le_bytes());

        let ctx = scene_ctx(0x1400_0004);
        assert_eq!(write_one(&ctx, &link), (-1i32).to_le_bytes());
    }

    #[test]
    fn test_legacy_vendor_header_forces_magic() {
        let mut ctx = scene_ctx(0x0A01_0000);
        ctx.header = Some("NS NetStream File".to_owned());
        let mut version = Value::new(TypeTag::FileVersion);
        version.set_u32(0x0A01_0000);
        assert_eq!(write_one(&ctx, &version), 0x08F3_5232u32.to_le_bytes());

        ctx.header = Some("Scene Graph Binary File".to_owned());
        assert_eq!(write_one(&ctx, &version), 0x0A01_0000u32.to_le_bytes());
    }

    #[test]
    fn test_short_string_truncation() {
        let ctx = scene_ctx(0x1400_0004);
        let mut s = Value::new(TypeTag::ShortString);
        s.set_text("a".repeat(300));
        let out = write_one(&ctx, &s);
        assert_eq!(out.len(), 256);
        assert_eq!(out[0], 255);
        assert_eq!(out[255], 0);
    }

    #[test]
    fn test_char8_zero_pads() {
        let ctx = scene_ctx(0x1400_0004);
        let mut s = Value::new(TypeTag::Char8String);
        s.set_text("abc");
        assert_eq!(write_one(&ctx, &s), b"abc\0\0\0\0\0");
    }

    #[test]
    fn test_line_string_appends_newline() {
        let ctx = scene_ctx(0x1400_0004);
        let mut s = Value::new(TypeTag::LineString);
        s.set_text("hello");
        assert_eq!(write_one(&ctx, &s), b"hello\n");
    }

    #[test]
    fn test_sized_string16_length_prefix() {
        let ctx = scene_ctx(0x1400_0004);
        let mut s = Value::new(TypeTag::SizedString16);
        s.set_text("ab");
        assert_eq!(write_one(&ctx, &s), [2, 0, b'a', b'b']);
    }

    #[test]
    fn test_empty_blob_write_succeeds() {
        let ctx = scene_ctx(0x1400_0004);
        let blob = Value::new(TypeTag::Blob);
        assert!(write_one(&ctx, &blob).is_empty());
    }

    #[test]
    fn test_packed_vector_clamps_silently() {
        let ctx = scene_ctx(0x1400_0004);
        let mut v = Value::new(TypeTag::ShortVector3);
        v.set_vec4([2.0, -2.0, 0.0, 0.0]);
        let out = write_one(&ctx, &v);
        assert_eq!(&out[..2], &32767i16.to_le_bytes());
        assert_eq!(&out[2..4], &(-32768i16).to_le_bytes());
    }

    #[test]
    fn test_string_palette_trailing_length() {
        let ctx = scene_ctx(0x1400_0004);
        let mut p = Value::new(TypeTag::StringPalette);
        p.set_bytes(b"ab\0cd\0".to_vec());
        let out = write_one(&ctx, &p);
        assert_eq!(out.len(), 4 + 6 + 4);
        assert_eq!(&out[..4], &6u32.to_le_bytes());
        assert_eq!(&out[10..], &6u32.to_le_bytes());
    }
}
