//! Typed value decoder

use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use tracing::{debug, warn};

use sgb_format::packed;
use sgb_format::strings::from_latin1;
use sgb_format::version::{canonical_file_version, canonical_header_version};
use sgb_format::{ByteMatrix, Limits, Payload, Result, SgbError, TypeTag, Value, Version};

use crate::context::FormatContext;

/// Byte cap when scanning for the header line's newline terminator.
const HEADER_LINE_CAP: usize = 80;
/// Byte cap when scanning for an ordinary line's newline terminator.
const LINE_CAP: usize = 255;

/// Decodes typed values from a seekable byte channel.
///
/// The reader is bound to one channel and one [`FormatContext`] for its
/// lifetime. Version-derived flags are computed at construction and again
/// after the header-string callback; the byte-order flag is set only while
/// decoding the version field and then governs every subsequent multi-byte
/// read in the stream.
pub struct ValueReader<'a, R: Read + Seek, C: FormatContext> {
    channel: &'a mut R,
    ctx: &'a mut C,
    bool32: bool,
    link_adjust: bool,
    big_endian: bool,
    limits: Limits,
}

impl<'a, R: Read + Seek, C: FormatContext> ValueReader<'a, R, C> {
    /// Bind a reader to a channel and a document context.
    pub fn new(channel: &'a mut R, ctx: &'a mut C) -> Self {
        Self::with_limits(channel, ctx, Limits::default())
    }

    /// Bind a reader with explicit input limits.
    pub fn with_limits(channel: &'a mut R, ctx: &'a mut C, limits: Limits) -> Self {
        let mut reader = Self {
            channel,
            ctx,
            bool32: false,
            link_adjust: false,
            big_endian: false,
            limits,
        };
        reader.refresh();
        reader
    }

    /// Recompute the version-derived flags from the context. Also clears the
    /// byte-order flag; a stream declares big-endian order again, if at all,
    /// while its version field is decoded.
    fn refresh(&mut self) {
        let scene = self.ctx.is_scene_document();
        let version = Version(self.ctx.version());
        self.bool32 = scene && version.has_32bit_bools();
        self.link_adjust = scene && version.stores_one_based_links();
        self.big_endian = false;
    }

    /// Whether the stream has declared big-endian byte order.
    pub fn big_endian(&self) -> bool {
        self.big_endian
    }

    /// Decode one value, consuming exactly the bytes its tag's layout
    /// mandates. Returns false on any short read, channel error or malformed
    /// framing; the caller must abort the current record.
    pub fn read(&mut self, val: &mut Value) -> bool {
        self.read_value(val).is_ok()
    }

    /// Rewind the channel to the start of the stream.
    pub fn reset(&mut self) -> bool {
        self.channel.seek(SeekFrom::Start(0)).is_ok()
    }

    /// Decode one value, reporting the failure cause.
    pub fn read_value(&mut self, val: &mut Value) -> Result<()> {
        match val.tag() {
            TypeTag::None => Ok(()),
            TypeTag::Bool => {
                let v = if self.bool32 {
                    self.read_u32()?
                } else {
                    u32::from(self.read_u8()?)
                };
                val.payload = Payload::U32(v);
                Ok(())
            }
            TypeTag::Byte => {
                val.payload = Payload::U8(self.read_u8()?);
                Ok(())
            }
            TypeTag::Word | TypeTag::Flags | TypeTag::Short | TypeTag::BlockTypeIndex => {
                val.payload = Payload::U16(self.read_u16()?);
                Ok(())
            }
            TypeTag::StringOffset | TypeTag::StringIndex | TypeTag::Int | TypeTag::UInt => {
                val.payload = Payload::U32(self.read_u32()?);
                Ok(())
            }
            TypeTag::LittleU32 => {
                // Forces little-endian regardless of the stream's declared
                // byte order.
                val.payload = Payload::U32(self.read_u32_le()?);
                Ok(())
            }
            TypeTag::Int64 | TypeTag::UInt64 => {
                val.payload = Payload::U64(self.read_u64()?);
                Ok(())
            }
            TypeTag::Link | TypeTag::ParentLink => {
                let mut link = self.read_i32()?;
                if self.link_adjust {
                    link = link.wrapping_sub(1);
                }
                val.payload = Payload::I32(link);
                Ok(())
            }
            TypeTag::Float => {
                val.payload = Payload::F32(self.read_f32()?);
                Ok(())
            }
            TypeTag::HalfFloat => {
                val.payload = Payload::F32(packed::unpack_half(self.read_u16()?));
                Ok(())
            }
            TypeTag::NormByte => {
                val.payload = Payload::F32(packed::unpack_byte_norm(self.read_u8()?));
                Ok(())
            }
            TypeTag::ByteVector3 => {
                let mut b = [0u8; 3];
                self.read_exact(&mut b)?;
                // The fourth lane unpacks an implicit zero pad byte.
                val.payload = Payload::Vec4([
                    packed::unpack_byte_norm(b[0]),
                    packed::unpack_byte_norm(b[1]),
                    packed::unpack_byte_norm(b[2]),
                    packed::unpack_byte_norm(0),
                ]);
                Ok(())
            }
            TypeTag::ShortVector3 => {
                let x = self.read_i16()?;
                let y = self.read_i16()?;
                let z = self.read_i16()?;
                val.payload = Payload::Vec4([
                    packed::unpack_snorm16(x),
                    packed::unpack_snorm16(y),
                    packed::unpack_snorm16(z),
                    0.0,
                ]);
                Ok(())
            }
            TypeTag::UShortVector3 => {
                let x = self.read_u16()?;
                let y = self.read_u16()?;
                let z = self.read_u16()?;
                val.payload = Payload::Vec4([
                    packed::unpack_unorm16(x),
                    packed::unpack_unorm16(y),
                    packed::unpack_unorm16(z),
                    0.0,
                ]);
                Ok(())
            }
            TypeTag::HalfVector3 => {
                let x = packed::unpack_half(self.read_u16()?);
                let y = packed::unpack_half(self.read_u16()?);
                let z = packed::unpack_half(self.read_u16()?);
                val.payload = Payload::Vec4([x, y, z, 0.0]);
                Ok(())
            }
            TypeTag::HalfVector2 => {
                let x = packed::unpack_half(self.read_u16()?);
                let y = packed::unpack_half(self.read_u16()?);
                val.payload = Payload::Vec4([x, y, 0.0, 0.0]);
                Ok(())
            }
            TypeTag::Vector3 | TypeTag::Color3 => {
                let x = self.read_f32()?;
                let y = self.read_f32()?;
                let z = self.read_f32()?;
                val.payload = Payload::Vec4([x, y, z, 0.0]);
                Ok(())
            }
            TypeTag::Vector4 | TypeTag::Color4 | TypeTag::QuatWxyz => {
                val.payload = Payload::Vec4(self.read_vec4()?);
                Ok(())
            }
            TypeTag::QuatXyzw => {
                // Stored x,y,z,w; rotate into the canonical w,x,y,z order.
                let v = self.read_vec4()?;
                val.payload = Payload::Vec4([v[3], v[0], v[1], v[2]]);
                Ok(())
            }
            TypeTag::ByteVector4 => {
                let b = self.read_u32()?.to_le_bytes();
                val.payload = Payload::Vec4([
                    packed::unpack_byte_norm(b[0]),
                    packed::unpack_byte_norm(b[1]),
                    packed::unpack_byte_norm(b[2]),
                    packed::unpack_byte_norm(b[3]),
                ]);
                Ok(())
            }
            TypeTag::UDecVector4 => {
                val.payload = Payload::Vec4(packed::unpack_udec(self.read_u32()?));
                Ok(())
            }
            TypeTag::Triangle => {
                let a = self.read_u16()?;
                let b = self.read_u16()?;
                let c = self.read_u16()?;
                val.payload = Payload::Triangle([a, b, c]);
                Ok(())
            }
            TypeTag::Matrix3 => {
                let mut raw = [0u8; 36];
                self.read_exact(&mut raw)?;
                let mut m = [0.0f32; 9];
                for (f, chunk) in m.iter_mut().zip(raw.chunks_exact(4)) {
                    *f = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                }
                val.payload = Payload::Matrix3(Box::new(m));
                Ok(())
            }
            TypeTag::Matrix4 => {
                let mut raw = [0u8; 64];
                self.read_exact(&mut raw)?;
                let mut m = [0.0f32; 16];
                for (f, chunk) in m.iter_mut().zip(raw.chunks_exact(4)) {
                    *f = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                }
                val.payload = Payload::Matrix4(Box::new(m));
                Ok(())
            }
            TypeTag::Vector2 => {
                let x = self.read_f32()?;
                let y = self.read_f32()?;
                val.payload = Payload::Vec4([x, y, 0.0, 0.0]);
                Ok(())
            }
            TypeTag::ByteColor4 => {
                val.payload = Payload::Vec4(packed::unpack_byte_color4(self.read_u32()?));
                Ok(())
            }
            TypeTag::ByteColor4Bgra => {
                let c = packed::unpack_byte_color4(self.read_u32()?);
                val.payload = Payload::Vec4([c[2], c[1], c[0], c[3]]);
                Ok(())
            }
            TypeTag::SizedString | TypeTag::SizedString16 => {
                let len = if val.tag() == TypeTag::SizedString16 {
                    i32::from(self.read_u16()?)
                } else {
                    self.read_i32()?
                };

                if len > self.limits.max_string_len || len < 0 {
                    warn!(len, "declared string length out of range");
                    val.payload = Payload::Text(format!("<string too long (0x{len:x})>"));
                    return Err(SgbError::StringTooLong(i64::from(len)));
                }

                let mut content = vec![0u8; len as usize];
                self.read_exact(&mut content)?;
                val.payload = Payload::Text(String::from_utf8_lossy(&content).into_owned());
                Ok(())
            }
            TypeTag::ShortString => {
                let len = usize::from(self.read_u8()?);
                let mut content = vec![0u8; len];
                self.read_exact(&mut content)?;
                // The wire payload carries a NUL terminator; only the text
                // before it is the value.
                let end = content.iter().position(|&b| b == 0).unwrap_or(len);
                val.payload = Payload::Text(from_latin1(&content[..end]));
                Ok(())
            }
            TypeTag::Text => {
                // Raw length prefix; not routed through the byte-order flag.
                let len = self.read_i32_le()?;

                if len > self.limits.max_string_len || len < 0 {
                    warn!(len, "declared text length out of range");
                    val.payload = Payload::Text("<string too long>".to_owned());
                    return Err(SgbError::StringTooLong(i64::from(len)));
                }

                let mut content = vec![0u8; len as usize];
                self.read_exact(&mut content)?;
                val.payload = Payload::Text(String::from_utf8_lossy(&content).into_owned());
                Ok(())
            }
            TypeTag::ByteArray => {
                let len = self.read_i32_le()?;
                if len < 0 {
                    return Err(SgbError::NegativeLength(len));
                }

                let mut bytes = Vec::new();
                self.channel
                    .by_ref()
                    .take(len as u64)
                    .read_to_end(&mut bytes)
                    .map_err(map_io)?;
                let full = bytes.len() == len as usize;
                val.payload = Payload::Bytes(bytes);
                if !full {
                    return Err(SgbError::UnexpectedEof);
                }
                Ok(())
            }
            TypeTag::StringPalette => {
                let len = self.read_i32_le()?;
                if len < 0 {
                    return Err(SgbError::NegativeLength(len));
                }
                if len > self.limits.max_palette_len {
                    return Err(SgbError::StringTooLong(i64::from(len)));
                }

                let mut bytes = Vec::new();
                self.channel
                    .by_ref()
                    .take(len as u64)
                    .read_to_end(&mut bytes)
                    .map_err(map_io)?;
                val.payload = Payload::Bytes(bytes);

                // Redundant trailing length word; discarded, and its absence
                // is tolerated.
                let mut trailing = [0u8; 4];
                let _ = self.read_at_most(&mut trailing)?;
                Ok(())
            }
            TypeTag::ByteMatrix => {
                let width = self.read_i32_le()?;
                let height = self.read_i32_le()?;
                if width < 0 {
                    return Err(SgbError::NegativeLength(width));
                }
                if height < 0 {
                    return Err(SgbError::NegativeLength(height));
                }

                let mut matrix = ByteMatrix::new(width as usize, height as usize);
                let got = self.read_at_most(matrix.data_mut())?;
                let full = got == matrix.len();
                val.payload = Payload::ByteMatrix(matrix);
                if !full {
                    return Err(SgbError::UnexpectedEof);
                }
                Ok(())
            }
            TypeTag::HeaderString => {
                let line = self.read_line_capped(HEADER_LINE_CAP)?;
                // The version word after the header is peeked, not consumed;
                // it decodes again as the version field proper.
                let version = canonical_header_version(self.peek_u32_le()?);

                let text = String::from_utf8_lossy(&line).into_owned();
                val.payload = Payload::Text(text.clone());

                let accepted = self.ctx.set_header_string(&text, version);
                self.refresh();
                if !accepted {
                    return Err(SgbError::HeaderRejected);
                }
                debug!(version = %Version(version), "header string registered");
                Ok(())
            }
            TypeTag::LineString => {
                let line = self.read_line_capped(LINE_CAP)?;
                val.payload = Payload::Text(String::from_utf8_lossy(&line).into_owned());
                Ok(())
            }
            TypeTag::Char8String => {
                let mut bytes = Vec::with_capacity(8);
                for _ in 0..8 {
                    match self.read_u8_opt()? {
                        Some(b) => bytes.push(b),
                        None => break,
                    }
                }
                // Strip the encoder's zero padding.
                while bytes.last() == Some(&0) {
                    bytes.pop();
                }
                val.payload = Payload::Text(String::from_utf8_lossy(&bytes).into_owned());
                Ok(())
            }
            TypeTag::FileVersion => {
                let raw = self.read_u32_le()?;

                if self.ctx.is_scene_document()
                    && Version(self.ctx.version()).carries_endian_flag()
                {
                    // The byte after the version word declares the stream's
                    // byte order; zero means big-endian.
                    if let Some(flag) = self.peek_u8()? {
                        self.big_endian = flag == 0;
                        if self.big_endian {
                            debug!("stream declares big-endian byte order");
                        }
                    }
                }

                let version = canonical_file_version(raw);
                if version != raw {
                    debug!(raw, version, "legacy vendor version remapped");
                }
                val.payload = Payload::U32(version);
                Ok(())
            }
            TypeTag::VertexDesc => {
                val.payload = Payload::U64(self.read_u64()?);
                Ok(())
            }
            TypeTag::Blob => match &mut val.payload {
                Payload::Bytes(bytes) => self.read_exact(bytes),
                _ => Err(SgbError::MissingPayload),
            },
        }
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.channel.read_u8().map_err(map_io)
    }

    fn read_u8_opt(&mut self) -> Result<Option<u8>> {
        let mut b = [0u8; 1];
        loop {
            match self.channel.read(&mut b) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(b[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SgbError::Io(e)),
            }
        }
    }

    fn read_u16(&mut self) -> Result<u16> {
        if self.big_endian {
            self.channel.read_u16::<BigEndian>().map_err(map_io)
        } else {
            self.channel.read_u16::<LittleEndian>().map_err(map_io)
        }
    }

    fn read_i16(&mut self) -> Result<i16> {
        self.read_u16().map(|v| v as i16)
    }

    fn read_u32(&mut self) -> Result<u32> {
        if self.big_endian {
            self.channel.read_u32::<BigEndian>().map_err(map_io)
        } else {
            self.channel.read_u32::<LittleEndian>().map_err(map_io)
        }
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.read_u32().map(|v| v as i32)
    }

    fn read_u64(&mut self) -> Result<u64> {
        if self.big_endian {
            self.channel.read_u64::<BigEndian>().map_err(map_io)
        } else {
            self.channel.read_u64::<LittleEndian>().map_err(map_io)
        }
    }

    fn read_f32(&mut self) -> Result<f32> {
        self.read_u32().map(f32::from_bits)
    }

    fn read_vec4(&mut self) -> Result<[f32; 4]> {
        let a = self.read_f32()?;
        let b = self.read_f32()?;
        let c = self.read_f32()?;
        let d = self.read_f32()?;
        Ok([a, b, c, d])
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        self.channel.read_u32::<LittleEndian>().map_err(map_io)
    }

    fn read_i32_le(&mut self) -> Result<i32> {
        self.read_u32_le().map(|v| v as i32)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.channel.read_exact(buf).map_err(map_io)
    }

    /// Read up to `buf.len()` bytes, stopping early at channel exhaustion.
    fn read_at_most(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.channel.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SgbError::Io(e)),
            }
        }
        Ok(filled)
    }

    /// Peek the next little-endian word without consuming it. Missing bytes
    /// at the end of the channel read as zero.
    fn peek_u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        let got = self.read_at_most(&mut buf)?;
        self.channel
            .seek(SeekFrom::Current(-(got as i64)))
            .map_err(SgbError::Io)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Peek one byte without consuming it.
    fn peek_u8(&mut self) -> Result<Option<u8>> {
        match self.read_u8_opt()? {
            Some(b) => {
                self.channel
                    .seek(SeekFrom::Current(-1))
                    .map_err(SgbError::Io)?;
                Ok(Some(b))
            }
            None => Ok(None),
        }
    }

    /// Read bytes until a newline, channel exhaustion, or the cap. Hitting
    /// the cap without a terminator is malformed framing.
    fn read_line_capped(&mut self, cap: usize) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            match self.read_u8_opt()? {
                None | Some(b'\n') => break,
                Some(b) => {
                    line.push(b);
                    if line.len() > cap - 2 {
                        return Err(SgbError::UnterminatedLine(cap));
                    }
                }
            }
        }
        Ok(line)
    }
}

fn map_io(e: io::Error) -> SgbError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        SgbError::UnexpectedEof
    } else {
        SgbError::Io(e)
    }
}
