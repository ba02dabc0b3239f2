//! The two 16-bit float encodings used for compact vertex data.
//!
//! Both follow the usual sign/5-bit-exponent/10-bit-mantissa split, but they
//! are not IEEE 754 half-precision: the original exporter's conversion maps
//! an all-ones exponent to a large finite value instead of infinity/NaN.
//! A later exporter generation fixed exactly that case; both layouts occur
//! in the wild, selected by the vertex encoding that carries them.

/// Decodes the original exporter's 16-bit float.
///
/// Identical to IEEE half-precision for every finite bit pattern. Patterns
/// with an all-ones exponent decode to finite values around `2^16` instead
/// of infinity/NaN.
#[must_use]
pub fn cry_half_to_f32(bits: u16) -> f32 {
    let mut mantissa = u32::from(bits & 0x03ff);
    let exponent: i32;

    if bits & 0x7c00 != 0 {
        exponent = i32::from((bits >> 10) & 0x1f);
    } else if mantissa != 0 {
        // subnormal: renormalize into the wider f32 exponent range
        let mut e = 1;
        loop {
            e -= 1;
            mantissa <<= 1;
            if mantissa & 0x0400 != 0 {
                break;
            }
        }
        mantissa &= 0x03ff;
        exponent = e;
    } else {
        exponent = -112;
    }

    let result = (u32::from(bits & 0x8000) << 16)
        | (((exponent + 112) as u32) << 23)
        | (mantissa << 13);
    f32::from_bits(result)
}

/// Decodes the later exporter generation's 16-bit float.
///
/// Same layout as [`cry_half_to_f32`], except an all-ones exponent is
/// carried through to f32 infinity/NaN like IEEE half-precision does.
#[must_use]
pub fn dymek_half_to_f32(bits: u16) -> f32 {
    if bits & 0x7c00 == 0x7c00 {
        let result =
            (u32::from(bits & 0x8000) << 16) | (0xff << 23) | (u32::from(bits & 0x03ff) << 13);
        return f32::from_bits(result);
    }
    cry_half_to_f32(bits)
}
