//! Adaptive cubic Bézier flattening in 26.6 units.
//!
//! De Casteljau subdivision driven by an explicit stack. Segments come out
//! in curve order, and subdivision stops after [`MAX_SUBDIVISIONS`] levels
//! whatever the flatness.

use crate::basics::{Vector, SUBPIXEL_ONE};

/// Allowed deviation from the chord, in 26.6 units.
pub const CURVE_FLATNESS: i64 = 16;

/// Deepest subdivision level.
pub const MAX_SUBDIVISIONS: u32 = 32;

type Bezier = [Vector; 4];

#[inline]
fn mid(a: Vector, b: Vector) -> Vector {
    Vector::new((a.x + b.x) >> 1, (a.y + b.y) >> 1)
}

/// Whether a cubic is close enough to its chord to be drawn as a line.
pub fn is_flat(b: &Bezier) -> bool {
    let dx = b[3].x - b[0].x;
    let dy = b[3].y - b[0].y;
    let l = dx.abs() + dy.abs();

    if l > SUBPIXEL_ONE {
        // Distance of each control point from the chord, scaled by its length.
        let cross = |p: Vector| -> i128 {
            ((p.x - b[0].x) as i128 * dy as i128 - (p.y - b[0].y) as i128 * dx as i128).abs()
        };
        let d = cross(b[1]) + cross(b[2]);
        d <= CURVE_FLATNESS as i128 * l as i128
    } else {
        let dd = (b[0].x - b[1].x).abs()
            + (b[0].y - b[1].y).abs()
            + (b[0].x - b[2].x).abs()
            + (b[0].y - b[2].y).abs();
        dd <= CURVE_FLATNESS
    }
}

/// Split a cubic at t = 0.5.
pub fn split(b: &Bezier) -> (Bezier, Bezier) {
    let ab = mid(b[0], b[1]);
    let bc = mid(b[1], b[2]);
    let cd = mid(b[2], b[3]);
    let abc = mid(ab, bc);
    let bcd = mid(bc, cd);
    let m = mid(abc, bcd);
    ([b[0], ab, abc, m], [m, bcd, cd, b[3]])
}

/// Flatten the cubic `p0, p1, p2, p3`, calling `emit(from, to)` for every
/// line segment in order from `p0` to `p3`.
pub fn flatten_cubic<F>(p0: Vector, p1: Vector, p2: Vector, p3: Vector, mut emit: F)
where
    F: FnMut(Vector, Vector),
{
    let mut stack: [(Bezier, u32); MAX_SUBDIVISIONS as usize + 1] =
        [([Vector::default(); 4], 0); MAX_SUBDIVISIONS as usize + 1];
    stack[0] = ([p0, p1, p2, p3], 0);
    let mut top = 1;

    while top > 0 {
        top -= 1;
        let (bezier, level) = stack[top];

        if level >= MAX_SUBDIVISIONS || is_flat(&bezier) {
            emit(bezier[0], bezier[3]);
            continue;
        }

        let (left, right) = split(&bezier);
        stack[top] = (right, level + 1);
        stack[top + 1] = (left, level + 1);
        top += 2;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: i64, y: i64) -> Vector {
        Vector::new(x, y)
    }

    fn collect(p0: Vector, p1: Vector, p2: Vector, p3: Vector) -> Vec<(Vector, Vector)> {
        let mut out = Vec::new();
        flatten_cubic(p0, p1, p2, p3, |a, b| out.push((a, b)));
        out
    }

    #[test]
    fn test_straight_cubic_is_one_segment() {
        let segs = collect(v(0, 0), v(320, 320), v(640, 640), v(960, 960));
        assert_eq!(segs, vec![(v(0, 0), v(960, 960))]);

        // Control points on the chord but out of order are still flat.
        let segs = collect(v(0, 0), v(640, 0), v(128, 0), v(640, 0));
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn test_curved_cubic_subdivides_in_order() {
        let p0 = v(0, 0);
        let p3 = v(1280, 0);
        let segs = collect(p0, v(0, 1280), v(1280, 1280), p3);
        assert!(segs.len() > 4, "only {} segments", segs.len());
        assert_eq!(segs.first().map(|s| s.0), Some(p0));
        assert_eq!(segs.last().map(|s| s.1), Some(p3));
        for w in segs.windows(2) {
            assert_eq!(w[0].1, w[1].0, "segments not contiguous");
        }
    }

    #[test]
    fn test_flattened_points_stay_near_curve() {
        let b = [v(0, 0), v(0, 2560), v(2560, 2560), v(2560, 0)];
        let segs = collect(b[0], b[1], b[2], b[3]);
        // The curve never leaves the control polygon's bounding box.
        for (a, _) in &segs {
            assert!(a.x >= 0 && a.x <= 2560);
            assert!(a.y >= 0 && a.y <= 1920 + 1);
        }
        // Apex of the curve at t = 0.5 is 0.75 of the control height.
        let apex = segs.iter().map(|s| s.1.y).max().unwrap_or(0);
        assert!((apex - 1920).abs() <= 2, "apex {}", apex);
    }

    #[test]
    fn test_tiny_cubic_is_flat() {
        let segs = collect(v(0, 0), v(2, 3), v(5, 1), v(8, 0));
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn test_degenerate_loop_terminates() {
        let segs = collect(v(0, 0), v(1 << 38, 1 << 38), v(-(1 << 38), 1 << 38), v(0, 0));
        assert!(!segs.is_empty());
        assert_eq!(segs.first().map(|s| s.0), Some(v(0, 0)));
        assert_eq!(segs.last().map(|s| s.1), Some(v(0, 0)));
    }

    #[test]
    fn test_split_midpoint() {
        let (l, r) = split(&[v(0, 0), v(0, 64), v(64, 64), v(64, 0)]);
        assert_eq!(l[3], r[0]);
        assert_eq!(l[3], v(32, 48));
        assert_eq!(l[0], v(0, 0));
        assert_eq!(r[3], v(64, 0));
    }
}
