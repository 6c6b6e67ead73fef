//! 16.16 fixed-point scalar.
//!
//! A single wide representation: 16 fractional bits stored in an `i64`.
//! Products and quotients go through an `i128` intermediate, and every
//! operation saturates instead of wrapping, so no input geometry can make
//! the arithmetic overflow.

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

pub const FIXED_SHIFT: u32 = 16;
pub const FIXED_ONE: i64 = 1 << FIXED_SHIFT;

/// Largest raw magnitude produced by a float conversion.
const FLOAT_LIMIT: f64 = (1i64 << 54) as f64;

/// Quotient returned by [`safe_divide`] instead of an infinity.
pub const DIVIDE_SENTINEL: f64 = 1e20;

/// Divide, returning a large finite sentinel for division by zero.
///
/// `0 / 0` yields 0. The result never is an infinity or NaN produced by the
/// division itself.
#[inline]
pub fn safe_divide(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        if a > 0.0 {
            DIVIDE_SENTINEL
        } else if a < 0.0 {
            -DIVIDE_SENTINEL
        } else {
            0.0
        }
    } else {
        a / b
    }
}

#[inline]
fn clamp_wide(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

// ============================================================================
// Fixed
// ============================================================================

/// Signed fixed-point number with 16 fractional bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed(i64);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(FIXED_ONE);
    pub const HALF: Fixed = Fixed(FIXED_ONE / 2);
    pub const MAX: Fixed = Fixed(i64::MAX);
    pub const MIN: Fixed = Fixed(i64::MIN);

    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Fixed(raw)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn from_int(v: i64) -> Self {
        Fixed(v.saturating_mul(FIXED_ONE))
    }

    /// Convert from 26.6 sub-pixel units.
    #[inline]
    pub fn from_26dot6(v: i64) -> Self {
        Fixed(v.saturating_mul(1 << (FIXED_SHIFT - 6)))
    }

    /// Convert from floating point, rounding to nearest.
    ///
    /// Values outside the representable range clamp; NaN maps to zero.
    #[inline]
    pub fn from_f64(v: f64) -> Self {
        let scaled = (v * FIXED_ONE as f64).round();
        if scaled.is_nan() {
            return Fixed::ZERO;
        }
        Fixed(scaled.clamp(-FLOAT_LIMIT, FLOAT_LIMIT) as i64)
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / FIXED_ONE as f64
    }

    /// Integer part, rounding toward negative infinity.
    #[inline]
    pub fn to_int(self) -> i64 {
        self.0 >> FIXED_SHIFT
    }

    /// Smallest integer not less than the value.
    #[inline]
    pub fn ceil_to_int(self) -> i64 {
        (self.0 >> FIXED_SHIFT) + ((self.0 & (FIXED_ONE - 1)) != 0) as i64
    }

    /// Product with a plain integer.
    #[inline]
    pub fn mul_int(self, rhs: i64) -> Fixed {
        Fixed(self.0.saturating_mul(rhs))
    }
}

impl Add for Fixed {
    type Output = Fixed;
    #[inline]
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    #[inline]
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_sub(rhs.0))
    }
}

/// Fixed-point product with a 128-bit intermediate.
impl Mul for Fixed {
    type Output = Fixed;
    #[inline]
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(clamp_wide((self.0 as i128 * rhs.0 as i128) >> FIXED_SHIFT))
    }
}

/// Fixed-point quotient. Division by zero saturates toward the sign of the
/// dividend.
impl Div for Fixed {
    type Output = Fixed;
    #[inline]
    fn div(self, rhs: Fixed) -> Fixed {
        if rhs.0 == 0 {
            return match self.0 {
                0 => Fixed::ZERO,
                v if v > 0 => Fixed::MAX,
                _ => Fixed::MIN,
            };
        }
        Fixed(clamp_wide(((self.0 as i128) << FIXED_SHIFT) / rhs.0 as i128))
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    #[inline]
    fn neg(self) -> Fixed {
        Fixed(self.0.saturating_neg())
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Fixed) {
        *self = *self + rhs;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(Fixed::ONE.raw(), 65536);
        assert_eq!(Fixed::HALF.raw(), 32768);
        assert_eq!(Fixed::from_int(3).raw(), 3 * 65536);
        assert_eq!(Fixed::from_26dot6(64), Fixed::ONE);
        assert_eq!(Fixed::from_26dot6(32), Fixed::HALF);
    }

    #[test]
    fn test_float_round_trip() {
        assert_eq!(Fixed::from_f64(1.5).raw(), 98304);
        assert_eq!(Fixed::from_f64(-0.25).to_f64(), -0.25);
        assert_eq!(Fixed::from_f64(2.0).to_f64(), 2.0);
    }

    #[test]
    fn test_float_conversion_clamps() {
        assert_eq!(Fixed::from_f64(1e300).raw(), 1i64 << 54);
        assert_eq!(Fixed::from_f64(-1e300).raw(), -(1i64 << 54));
        assert_eq!(Fixed::from_f64(f64::INFINITY).raw(), 1i64 << 54);
        assert_eq!(Fixed::from_f64(f64::NAN), Fixed::ZERO);
    }

    #[test]
    fn test_to_int_floors() {
        assert_eq!(Fixed::from_f64(2.75).to_int(), 2);
        assert_eq!(Fixed::from_f64(-0.25).to_int(), -1);
        assert_eq!(Fixed::from_f64(-2.0).to_int(), -2);
        assert_eq!(Fixed::from_f64(2.25).ceil_to_int(), 3);
        assert_eq!(Fixed::from_f64(2.0).ceil_to_int(), 2);
        assert_eq!(Fixed::from_f64(-2.25).ceil_to_int(), -2);
    }

    #[test]
    fn test_mul_and_div() {
        let a = Fixed::from_f64(1.5);
        let b = Fixed::from_f64(-2.0);
        assert_eq!(a * b, Fixed::from_f64(-3.0));
        assert_eq!(a / b, Fixed::from_f64(-0.75));
        assert_eq!(a.mul_int(4), Fixed::from_int(6));
    }

    #[test]
    fn test_wide_intermediate() {
        let big = Fixed::from_int(1 << 30);
        assert_eq!(big * Fixed::from_int(4), Fixed::from_int(1 << 32));
        assert_eq!(Fixed::MAX * Fixed::from_int(2), Fixed::MAX);
        assert_eq!(Fixed::MAX + Fixed::ONE, Fixed::MAX);
        assert_eq!(Fixed::MIN - Fixed::ONE, Fixed::MIN);
        assert_eq!(-Fixed::MIN, Fixed::MAX);
    }

    #[test]
    fn test_divide_by_zero_saturates() {
        assert_eq!(Fixed::ONE / Fixed::ZERO, Fixed::MAX);
        assert_eq!(-Fixed::ONE / Fixed::ZERO, Fixed::MIN);
        assert_eq!(Fixed::ZERO / Fixed::ZERO, Fixed::ZERO);
    }

    #[test]
    fn test_safe_divide() {
        assert_eq!(safe_divide(1.0, 4.0), 0.25);
        assert_eq!(safe_divide(3.0, 0.0), DIVIDE_SENTINEL);
        assert_eq!(safe_divide(-3.0, 0.0), -DIVIDE_SENTINEL);
        assert_eq!(safe_divide(0.0, 0.0), 0.0);
        assert!(safe_divide(1.0, 0.0).is_finite());
    }
}
