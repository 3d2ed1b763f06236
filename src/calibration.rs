//! Numeric transforms from raw box fields to standardized units.

use crate::error::{DecodeError, Result};
use crate::rational::Rational;

/// Centimeters per meter. Resolution boxes store grid points per meter.
pub const CM_PER_METER: i64 = 100;

/// Raw resolution of one axis as stored in `resc`/`resd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisResolution {
    pub numerator: u16,
    pub denominator: u16,
    pub exponent: u8,
}

/// `10^exp` in checked integer arithmetic.
pub fn pow10(exp: u8) -> Option<i64> {
    10i64.checked_pow(exp as u32)
}

/// `num * 10^exp` over `denom * 100`: dots per meter with a decimal
/// exponent, converted to dots per centimeter.
///
/// The exponent byte is unsigned, so a byte such as `0xFF` scales by
/// `10^255` and overflows rather than meaning `10^-1`.
pub fn per_meter_to_per_cm(axis: AxisResolution) -> Result<Rational> {
    let scale = pow10(axis.exponent).ok_or_else(|| {
        DecodeError::InvalidValue(format!("resolution exponent {} overflows", axis.exponent))
    })?;
    let numerator = (axis.numerator as i64).checked_mul(scale).ok_or_else(|| {
        DecodeError::InvalidValue(format!(
            "resolution {} * 10^{} overflows",
            axis.numerator, axis.exponent
        ))
    })?;
    Rational::new(numerator, axis.denominator as i64 * CM_PER_METER)
        .ok_or_else(|| DecodeError::InvalidValue("resolution denominator is zero".to_string()))
}
