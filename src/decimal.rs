//! Decimal logical type codec: scale-aware numeric values carried as
//! minimal two's-complement byte strings.

use crate::error::{Error, Result};
use crate::value::Datum;

/// Returns 10^exp, or None once it overflows i64.
fn pow10(exp: u32) -> Option<i64> {
    10i64.checked_pow(exp)
}

/// Extracts the unscaled integer from a numeric datum.
///
/// Integral datums are scaled exactly; fractional datums are rounded half
/// away from zero after scaling. Fails when the result exceeds the declared
/// precision or the datum is not numeric.
pub fn unscaled_of(datum: &Datum, precision: u32, scale: u32) -> Result<i64> {
    let unscaled = match *datum {
        Datum::Int(v) => scale_integral(v as i64, scale)?,
        Datum::Long(v) => scale_integral(v, scale)?,
        Datum::Float(v) => scale_fractional(v as f64, scale)?,
        Datum::Double(v) => scale_fractional(v, scale)?,
        _ => return Err(Error::type_mismatch(datum.type_name(), "decimal")),
    };
    if let Some(bound) = pow10(precision) {
        if unscaled.unsigned_abs() >= bound as u64 {
            return Err(Error::DecimalOutOfRange {
                unscaled,
                precision,
            });
        }
    }
    Ok(unscaled)
}

fn scale_integral(value: i64, scale: u32) -> Result<i64> {
    let factor = pow10(scale).ok_or(Error::DecimalTooWide { size: 8 })?;
    value
        .checked_mul(factor)
        .ok_or(Error::DecimalTooWide { size: 8 })
}

fn scale_fractional(value: f64, scale: u32) -> Result<i64> {
    let factor = pow10(scale).ok_or(Error::DecimalTooWide { size: 8 })? as f64;
    let scaled = (value * factor).round();
    if !scaled.is_finite() || scaled < i64::MIN as f64 || scaled > i64::MAX as f64 {
        return Err(Error::DecimalTooWide { size: 8 });
    }
    Ok(scaled as i64)
}

/// Serializes an unscaled value as its shortest two's-complement byte
/// string: big-endian with leading sign-fill bytes stripped while the
/// following byte's high bit still carries the sign. Always at least one
/// byte.
pub fn to_minimal_bytes(unscaled: i64) -> Vec<u8> {
    let be = unscaled.to_be_bytes();
    let fill: u8 = if unscaled < 0 { 0xFF } else { 0x00 };
    let sign_bit = fill & 0x80;

    let mut start = 0;
    while start < be.len() - 1 && be[start] == fill && (be[start + 1] & 0x80) == sign_bit {
        start += 1;
    }
    be[start..].to_vec()
}

/// Serializes an unscaled value sign-filled to exactly `size` bytes, for
/// decimal over `fixed`.
pub fn to_fixed_bytes(unscaled: i64, size: usize) -> Result<Vec<u8>> {
    let minimal = to_minimal_bytes(unscaled);
    if minimal.len() > size {
        return Err(Error::DecimalTooWide { size });
    }
    let fill: u8 = if unscaled < 0 { 0xFF } else { 0x00 };
    let mut out = vec![fill; size - minimal.len()];
    out.extend_from_slice(&minimal);
    Ok(out)
}

/// Recovers the unscaled value from a two's-complement byte string,
/// sign-extending to 64 bits.
pub fn unscaled_from_bytes(bytes: &[u8]) -> Result<i64> {
    if bytes.is_empty() {
        return Ok(0);
    }
    let fill: u8 = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
    if bytes.len() > 8 {
        // Wider payloads must be pure sign extension to fit 64 bits.
        if bytes[..bytes.len() - 8].iter().any(|&b| b != fill) {
            return Err(Error::DecimalTooWide { size: 8 });
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[bytes.len() - 8..]);
        return Ok(i64::from_be_bytes(buf));
    }
    let mut buf = [fill; 8];
    buf[8 - bytes.len()..].copy_from_slice(bytes);
    Ok(i64::from_be_bytes(buf))
}

/// Materializes the decoded unscaled value at the application boundary:
/// `Long` for scale 0, otherwise the scaled-down `Double`.
pub fn datum_from_unscaled(unscaled: i64, scale: u32) -> Datum {
    if scale == 0 {
        Datum::Long(unscaled)
    } else {
        let factor = 10f64.powi(scale as i32);
        Datum::Double(unscaled as f64 / factor)
    }
}
