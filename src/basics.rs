//! Foundation types, constants, and coordinate helpers.
//!
//! Points, 26.6 sub-pixel vectors, inclusive integer rectangles and the
//! fill rule. Everything else in the crate depends on these.

use core::ops::{Add, Mul, Sub};

// ============================================================================
// 26.6 sub-pixel coordinates
// ============================================================================

/// Number of fractional bits of the 26.6 input coordinates.
pub const SUBPIXEL_SHIFT: u32 = 6;
/// One pixel in 26.6 units.
pub const SUBPIXEL_ONE: i64 = 1 << SUBPIXEL_SHIFT;
/// Half a pixel in 26.6 units (the pixel center offset).
pub const SUBPIXEL_HALF: i64 = SUBPIXEL_ONE / 2;

/// Largest magnitude a 26.6 coordinate is allowed to take.
///
/// Float input beyond this saturates instead of wrapping.
pub const SUBPIXEL_LIMIT: i64 = 1 << 40;

/// Convert a pixel coordinate to 26.6, rounding to nearest and saturating.
///
/// NaN maps to 0.
#[inline]
pub fn to_26dot6(v: f64) -> i64 {
    let scaled = (v * SUBPIXEL_ONE as f64).round();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(-(SUBPIXEL_LIMIT as f64), SUBPIXEL_LIMIT as f64) as i64
}

/// Convert a 26.6 coordinate back to pixels.
#[inline]
pub fn from_26dot6(v: i64) -> f64 {
    v as f64 / SUBPIXEL_ONE as f64
}

/// Snap a pixel coordinate to the nearest 1/64 pixel.
#[inline]
pub fn snap_to_grid(v: f64) -> f64 {
    (v * SUBPIXEL_ONE as f64).round() / SUBPIXEL_ONE as f64
}

// ============================================================================
// Cover constants
// ============================================================================

pub const COVER_FULL: u8 = 255;

// ============================================================================
// Fill rule
// ============================================================================

/// Policy mapping an accumulated winding number to inside/outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// Inside wherever the winding number is non-zero.
    #[default]
    NonZeroWinding,
    /// Inside wherever the winding number is odd.
    EvenOdd,
}

impl FillRule {
    /// Mask applied with bitwise AND to the running winding accumulator.
    #[inline]
    pub fn winding_mask(self) -> i32 {
        match self {
            FillRule::NonZeroWinding => !0,
            FillRule::EvenOdd => 1,
        }
    }
}

// ============================================================================
// Rect
// ============================================================================

/// A rectangle defined by two corner points.
///
/// For integer rectangles both corners are inclusive: `x1..=x2`, `y1..=y2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<T: Copy> {
    pub x1: T,
    pub y1: T,
    pub x2: T,
    pub y2: T,
}

impl<T: Copy + PartialOrd> Rect<T> {
    pub fn new(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Returns `true` if the rectangle is valid (non-empty).
    pub fn is_valid(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }
}

/// Inclusive rectangle with `i32` coordinates (the clip rectangle type).
pub type RectI = Rect<i32>;
/// Rectangle with `f64` coordinates.
pub type RectD = Rect<f64>;

// ============================================================================
// Point
// ============================================================================

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PointBase<T: Copy> {
    pub x: T,
    pub y: T,
}

impl<T: Copy> PointBase<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Copy + Add<Output = T>> Add for PointBase<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Copy + Sub<Output = T>> Sub for PointBase<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for PointBase<f64> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Floating point point in pixel units.
pub type PointF = PointBase<f64>;

/// Sub-pixel point in 26.6 fixed units.
pub type Vector = PointBase<i64>;

impl PointF {
    /// Squared euclidean length.
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Round to 26.6 with saturation.
    #[inline]
    pub fn to_vector(self) -> Vector {
        Vector::new(to_26dot6(self.x), to_26dot6(self.y))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_26dot6_rounds_and_saturates() {
        assert_eq!(to_26dot6(1.0), 64);
        assert_eq!(to_26dot6(0.5), 32);
        assert_eq!(to_26dot6(-2.25), -144);
        assert_eq!(to_26dot6(1.0 / 128.0), 1);
        assert_eq!(to_26dot6(1e300), SUBPIXEL_LIMIT);
        assert_eq!(to_26dot6(-1e300), -SUBPIXEL_LIMIT);
        assert_eq!(to_26dot6(f64::NAN), 0);
        assert_eq!(to_26dot6(f64::INFINITY), SUBPIXEL_LIMIT);
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(1.0), 1.0);
        assert_eq!(snap_to_grid(1.0 + 1.0 / 256.0), 1.0);
        assert_eq!(snap_to_grid(1.0 + 3.0 / 256.0), 1.0 + 1.0 / 64.0);
    }

    #[test]
    fn test_winding_mask() {
        assert_eq!(FillRule::NonZeroWinding.winding_mask(), !0);
        assert_eq!(FillRule::EvenOdd.winding_mask(), 1);
        assert_eq!(2 & FillRule::EvenOdd.winding_mask(), 0);
        assert_ne!(-2 & FillRule::NonZeroWinding.winding_mask(), 0);
    }

    #[test]
    fn test_rect_valid() {
        assert!(!RectI::new(0, 0, -1, -1).is_valid());
        assert!(RectI::new(2, 3, 2, 3).is_valid());
        assert!(!RectD::new(4.0, 0.0, 1.0, 2.0).is_valid());
    }

    #[test]
    fn test_point_ops() {
        let a = PointF::new(1.0, 2.0);
        let b = PointF::new(3.0, 5.0);
        assert_eq!(b - a, PointF::new(2.0, 3.0));
        assert_eq!(a + b, PointF::new(4.0, 7.0));
        assert_eq!((b - a) * 0.5, PointF::new(1.0, 1.5));
        assert_eq!((b - a).length_squared(), 13.0);
    }

    #[test]
    fn test_vector_conversion() {
        let v = PointF::new(1.5, -0.25).to_vector();
        assert_eq!(v, Vector::new(96, -16));
        assert_eq!(from_26dot6(v.x), 1.5);
        assert_eq!(from_26dot6(v.y), -0.25);
    }
}
