//! Quantization helpers for packed scalar and vector encodings
//!
//! Pure pack/unpack pairs with no I/O. The decoder and encoder must go
//! through these shared functions so both directions agree on the exact
//! quantization formula per bit width. Packing clamps silently to the
//! representable range; it never fails.

use half::f16;

/// Unpack a byte quantized over [-1, +1].
pub fn unpack_byte_norm(b: u8) -> f32 {
    (f32::from(b) / 255.0) * 2.0 - 1.0
}

/// Pack a float into a byte quantized over [-1, +1].
pub fn pack_byte_norm(f: f32) -> u8 {
    (f * 127.5 + 127.5).round().clamp(0.0, 255.0) as u8
}

/// Unpack a signed 16-bit component quantized over [-1, +1].
pub fn unpack_snorm16(v: i16) -> f32 {
    f32::from(v) / 32767.0
}

/// Pack a float into a signed 16-bit component. The input range clamps to
/// the full two's-complement range, matching the wire format.
pub fn pack_snorm16(f: f32) -> i16 {
    (f * 32767.0).clamp(-32768.0, 32767.0).round() as i16
}

/// Unpack an unsigned 16-bit component quantized over [0, 1].
pub fn unpack_unorm16(v: u16) -> f32 {
    f32::from(v) / 65535.0
}

/// Pack a float into an unsigned 16-bit component.
pub fn pack_unorm16(f: f32) -> u16 {
    (f * 65535.0).clamp(0.0, 65535.0).round() as u16
}

/// Widen a half-precision bit pattern to f32.
pub fn unpack_half(bits: u16) -> f32 {
    f16::from_bits(bits).to_f32()
}

/// Narrow an f32 to a half-precision bit pattern.
pub fn pack_half(f: f32) -> u16 {
    f16::from_f32(f).to_bits()
}

/// Unpack a 10-10-10-2 word into four components centered on [-1, +1].
/// X, y and z occupy the low three 10-bit fields; w the top two bits.
pub fn unpack_udec(v: u32) -> [f32; 4] {
    [
        (v & 0x3FF) as f32 / 511.5 - 1.0,
        ((v >> 10) & 0x3FF) as f32 / 511.5 - 1.0,
        ((v >> 20) & 0x3FF) as f32 / 511.5 - 1.0,
        ((v >> 30) & 0x3) as f32 / 1.5 - 1.0,
    ]
}

/// Pack four components into a 10-10-10-2 word, clamping each to [-1, +1].
pub fn pack_udec(c: [f32; 4]) -> u32 {
    let q10 = |f: f32| ((f + 1.0) * 511.5).round().clamp(0.0, 1023.0) as u32;
    let q2 = |f: f32| ((f + 1.0) * 1.5).round().clamp(0.0, 3.0) as u32;
    q10(c[0]) | (q10(c[1]) << 10) | (q10(c[2]) << 20) | (q2(c[3]) << 30)
}

/// Unpack an RGBA color stored as one byte per channel.
pub fn unpack_byte_color4(v: u32) -> [f32; 4] {
    let b = v.to_le_bytes();
    [
        f32::from(b[0]) / 255.0,
        f32::from(b[1]) / 255.0,
        f32::from(b[2]) / 255.0,
        f32::from(b[3]) / 255.0,
    ]
}

/// Pack an RGBA color into one byte per channel.
pub fn pack_byte_color4(c: [f32; 4]) -> u32 {
    let q = |f: f32| (f * 255.0).round().clamp(0.0, 255.0) as u8;
    u32::from_le_bytes([q(c[0]), q(c[1]), q(c[2]), q(c[3])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_byte_norm_endpoints() {
        assert_eq!(unpack_byte_norm(0), -1.0);
        assert_eq!(unpack_byte_norm(255), 1.0);
        assert_eq!(pack_byte_norm(-1.0), 0);
        assert_eq!(pack_byte_norm(1.0), 255);
        // Out-of-range input clamps instead of failing.
        assert_eq!(pack_byte_norm(7.0), 255);
        assert_eq!(pack_byte_norm(-7.0), 0);
    }

    #[test]
    fn test_snorm16_clamps_to_wire_range() {
        assert_eq!(pack_snorm16(1.0), 32767);
        assert_eq!(pack_snorm16(-1.5), -32768);
        assert_eq!(pack_snorm16(0.0), 0);
        assert_eq!(unpack_snorm16(32767), 1.0);
    }

    #[test]
    fn test_unorm16_endpoints() {
        assert_eq!(pack_unorm16(0.0), 0);
        assert_eq!(pack_unorm16(1.0), 65535);
        assert_eq!(pack_unorm16(-0.5), 0);
        assert_eq!(unpack_unorm16(65535), 1.0);
    }

    #[test]
    fn test_half_widening() {
        assert_eq!(unpack_half(pack_half(1.0)), 1.0);
        assert_eq!(unpack_half(pack_half(-0.5)), -0.5);
        assert_eq!(unpack_half(0), 0.0);
    }

    #[test]
    fn test_udec_field_layout() {
        let packed = pack_udec([1.0, -1.0, 0.0, 1.0]);
        assert_eq!(packed & 0x3FF, 1023);
        assert_eq!((packed >> 10) & 0x3FF, 0);
        assert_eq!((packed >> 20) & 0x3FF, 512);
        assert_eq!(packed >> 30, 3);
    }

    #[test]
    fn test_byte_color4_channel_order() {
        let packed = pack_byte_color4([1.0, 0.0, 0.0, 1.0]);
        assert_eq!(packed.to_le_bytes(), [255, 0, 0, 255]);
        let unpacked = unpack_byte_color4(0xFF00_00FF);
        assert_eq!(unpacked, [1.0, 0.0, 0.0, 1.0]);
    }

    proptest! {
        #[test]
        fn prop_byte_norm_quantization_bound(f in -1.0f32..=1.0) {
            let rt = unpack_byte_norm(pack_byte_norm(f));
            prop_assert!((rt - f).abs() <= 1.0 / 127.5);
        }

        #[test]
        fn prop_snorm16_quantization_bound(f in -1.0f32..=1.0) {
            let rt = unpack_snorm16(pack_snorm16(f));
            prop_assert!((rt - f).abs() <= 1.0 / 32767.0);
        }

        #[test]
        fn prop_unorm16_quantization_bound(f in 0.0f32..=1.0) {
            let rt = unpack_unorm16(pack_unorm16(f));
            prop_assert!((rt - f).abs() <= 1.0 / 65535.0);
        }

        #[test]
        fn prop_udec_roundtrip_is_stable(v in any::<u32>()) {
            // Quantize once, then pack/unpack must be exact.
            let once = unpack_udec(v);
            let twice = unpack_udec(pack_udec(once));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_byte_color4_roundtrip_exact(v in any::<u32>()) {
            prop_assert_eq!(pack_byte_color4(unpack_byte_color4(v)), v);
        }

        #[test]
        fn prop_half_bits_roundtrip(bits in any::<u16>()) {
            let f = unpack_half(bits);
            // NaN payloads are not required to round-trip bit-exactly.
            prop_assume!(!f.is_nan());
            prop_assert_eq!(pack_half(f), bits);
        }
    }
}
