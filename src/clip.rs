//! Parametric segment clipping against a rectangle.
//!
//! Used by the line stroker. Each axis is clipped in turn, and endpoints
//! that land on a side are snapped exactly onto it.

use crate::basics::{PointF, RectD};

// ============================================================================
// Segment clipping
// ============================================================================

/// Clip one coordinate axis of the segment `a → b` to the open interval
/// `(lo, hi)`. Returns false when nothing is left.
fn clip_axis(a: &mut PointF, b: &mut PointF, lo: f64, hi: f64, vertical: bool) -> bool {
    let get = |p: &PointF| if vertical { p.y } else { p.x };
    let (oa, ob) = (get(&*a), get(&*b));
    let d = ob - oa;

    if d == 0.0 {
        return oa > lo && oa < hi;
    }

    let mut t0 = (lo - oa) / d;
    let mut t1 = (hi - oa) / d;
    if t0 > t1 {
        std::mem::swap(&mut t0, &mut t1);
    }
    let t_min = t0.max(0.0);
    let t_max = t1.min(1.0);
    if t_min >= t_max {
        return false;
    }

    let (pa, pb) = (*a, *b);
    let delta = pb - pa;
    if t_min > 0.0 {
        *a = pa + delta * t_min;
        let v = if d > 0.0 { lo } else { hi };
        if vertical {
            a.y = v;
        } else {
            a.x = v;
        }
    }
    if t_max < 1.0 {
        *b = pa + delta * t_max;
        let v = if d > 0.0 { hi } else { lo };
        if vertical {
            b.y = v;
        } else {
            b.x = v;
        }
    }
    true
}

/// Clip the segment `a → b` to `rect`, keeping its direction.
///
/// Segments lying exactly on a boundary, or entirely outside, yield `None`.
pub fn clip_segment(a: PointF, b: PointF, rect: &RectD) -> Option<(PointF, PointF)> {
    let (mut a, mut b) = (a, b);
    if !clip_axis(&mut a, &mut b, rect.x1, rect.x2, false) {
        return None;
    }
    if !clip_axis(&mut a, &mut b, rect.y1, rect.y2, true) {
        return None;
    }
    Some((a, b))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_segment_inside() {
        let r = RectD::new(0.0, 0.0, 10.0, 10.0);
        let a = PointF::new(1.0, 2.0);
        let b = PointF::new(8.0, 9.0);
        assert_eq!(clip_segment(a, b, &r), Some((a, b)));
    }

    #[test]
    fn test_clip_segment_crossing() {
        let r = RectD::new(0.0, 0.0, 10.0, 10.0);
        let (a, b) = clip_segment(PointF::new(-5.0, 5.0), PointF::new(15.0, 5.0), &r)
            .expect("segment crosses the box");
        assert_eq!(a, PointF::new(0.0, 5.0));
        assert_eq!(b, PointF::new(10.0, 5.0));

        // Direction is preserved.
        let (a, b) = clip_segment(PointF::new(5.0, 20.0), PointF::new(5.0, -20.0), &r)
            .expect("segment crosses the box");
        assert_eq!(a, PointF::new(5.0, 10.0));
        assert_eq!(b, PointF::new(5.0, 0.0));
    }

    #[test]
    fn test_clip_segment_rejects() {
        let r = RectD::new(0.0, 0.0, 10.0, 10.0);
        assert!(clip_segment(PointF::new(-5.0, -1.0), PointF::new(15.0, -1.0), &r).is_none());
        // On the boundary.
        assert!(clip_segment(PointF::new(0.0, 2.0), PointF::new(0.0, 8.0), &r).is_none());
        assert!(clip_segment(PointF::new(11.0, 0.0), PointF::new(20.0, 10.0), &r).is_none());
    }
}
