//! Single segment line rasterizer.
//!
//! A stroked segment is drawn directly as spans without building an edge
//! list. Axis-aligned segments take a column-run path; everything else is
//! drawn as an oriented quad whose anti-aliased coverage is computed exactly
//! per pixel.

use crate::basics::{snap_to_grid, PointF, RectD, RectI, COVER_FULL};
use crate::clip::clip_segment;
use crate::fixed::{safe_divide, Fixed};
use crate::span::SpanBuffer;

/// Coordinate delta below which a segment counts as axis aligned.
const AXIS_EPSILON: f64 = 1.0 / 64.0;

/// Sample offset applied to aliased lines in legacy rounding mode.
const LEGACY_OFFSET: f64 = 31.0 / 64.0;

/// Narrowest width of an aliased stroke.
const MIN_ALIASED_WIDTH: f64 = 1.0;

/// Rendering options of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrokeMode {
    pub antialiased: bool,
    pub legacy_rounding: bool,
}

#[inline]
fn coverage_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * COVER_FULL as f64).round() as u8
}

/// x of the segment `p0 → p1` at height `y`.
#[inline]
fn x_at(p0: PointF, p1: PointF, y: f64) -> f64 {
    let dy = p1.y - p0.y;
    if dy == 0.0 {
        return p0.x;
    }
    p0.x + (y - p0.y) * safe_divide(p1.x - p0.x, dy)
}

/// Area of the unit column `[x, x + 1]` lying left of an edge piece that
/// runs from `lo` to `hi` horizontally across a strip of height `h`.
pub fn intersect_pixel(x: f64, h: f64, lo: f64, hi: f64) -> f64 {
    if hi <= x {
        return 0.0;
    }
    if lo >= x + 1.0 {
        return h;
    }
    if lo >= x && hi <= x + 1.0 {
        return h * ((lo + hi) * 0.5 - x);
    }
    let d = hi - lo;
    if lo < x && hi > x + 1.0 {
        return h * (hi - x - 0.5) / d;
    }
    if lo < x {
        let w = hi - x;
        return h * w * w / (2.0 * d);
    }
    let w = x + 1.0 - lo;
    h - h * w * w / (2.0 * d)
}

/// Boundary of the quad: two segments meeting at `mid`.
#[derive(Debug, Clone, Copy)]
struct Boundary {
    top: PointF,
    mid: PointF,
    bottom: PointF,
}

impl Boundary {
    /// The segment covering the strip around `y`.
    #[inline]
    fn piece(&self, y: f64) -> (PointF, PointF) {
        if y < self.mid.y {
            (self.top, self.mid)
        } else {
            (self.mid, self.bottom)
        }
    }

    #[inline]
    fn x_at(&self, y: f64) -> f64 {
        let (p0, p1) = self.piece(y);
        x_at(p0, p1, y)
    }
}

/// Rasterizes stroked segments, reusing one row accumulation buffer.
#[derive(Debug, Default)]
pub struct LineStroker {
    row: Vec<f64>,
}

impl LineStroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stroke `a → b` with `width` pixels into `buffer`, clipped to the
    /// buffer's clip rectangle.
    pub fn stroke(
        &mut self,
        a: PointF,
        b: PointF,
        width: f64,
        square_cap: bool,
        mode: StrokeMode,
        buffer: &mut SpanBuffer<'_>,
    ) {
        let clip = *buffer.clip();
        if a == b || !(width > 0.0) || !clip.is_valid() {
            return;
        }
        let width = if mode.antialiased {
            width
        } else {
            width.max(MIN_ALIASED_WIDTH)
        };

        let (mut pa, mut pb) = (a, b);
        let length = (pb - pa).length_squared().sqrt();
        if !length.is_finite() || length == 0.0 {
            return;
        }
        if square_cap {
            let ext = (pb - pa) * (0.5 * width / length);
            pa = pa - ext;
            pb = pb + ext;
        }

        let full = (pb - pa).length_squared();
        let mut rel_width = width / full.sqrt();

        let half = 0.5 * rel_width;
        let offs = PointF::new((pb.y - pa.y).abs() * half, (pb.x - pa.x).abs() * half);
        let grown = RectD::new(
            clip.x1 as f64 - offs.x,
            clip.y1 as f64 - offs.y,
            clip.x2 as f64 + 1.0 + offs.x,
            clip.y2 as f64 + 1.0 + offs.y,
        );
        let Some((ca, cb)) = clip_segment(pa, pb, &grown) else {
            return;
        };
        pa = ca;
        pb = cb;

        let clipped = (pb - pa).length_squared();
        if clipped == 0.0 {
            return;
        }
        rel_width *= (full / clipped).sqrt();

        if !mode.antialiased && mode.legacy_rounding {
            let bias = PointF::new(LEGACY_OFFSET, LEGACY_OFFSET);
            pa = pa + bias;
            pb = pb + bias;
        }

        let d = pb - pa;
        if d.y.abs() < AXIS_EPSILON {
            // Swap roles: the stroke of a horizontal segment is a vertical
            // segment as long as the width, as wide as the segment.
            let x = (pa.x + pb.x) * 0.5;
            let y = (pa.y + pb.y) * 0.5;
            let dx = d.x.abs() * 0.5;
            let dy = rel_width * dx;
            pa = PointF::new(x, y - dy);
            pb = PointF::new(x, y + dy);
            rel_width = 1.0 / rel_width;
        }

        let drawn = if (pb.x - pa.x).abs() < AXIS_EPSILON {
            self.vertical(pa, pb, rel_width, mode, &clip, buffer)
        } else {
            self.general(pa, pb, rel_width, mode, &clip, buffer)
        };

        // An aliased stroke missing every pixel center still lights the
        // pixel under its midpoint.
        if !drawn {
            let mid = (pa + pb) * 0.5;
            let (x, y) = (mid.x.floor(), mid.y.floor());
            let inside_x = x >= clip.x1 as f64 && x <= clip.x2 as f64;
            if inside_x && y >= clip.y1 as f64 && y <= clip.y2 as f64 {
                buffer.add_span(x as i32, 1, y as i32, COVER_FULL);
            }
        }
    }

    /// Column run stroke. Both sides are taken on the 1/64 grid around the
    /// segment's mean x. Returns false when an aliased stroke hits no pixel.
    fn vertical(
        &mut self,
        mut pa: PointF,
        mut pb: PointF,
        rel_width: f64,
        mode: StrokeMode,
        clip: &RectI,
        buffer: &mut SpanBuffer<'_>,
    ) -> bool {
        if pa.y > pb.y {
            std::mem::swap(&mut pa, &mut pb);
        }
        let half = 0.5 * rel_width * (pb.y - pa.y);
        let x = (pa.x + pb.x) * 0.5;
        let (x_min, x_max) = (clip.x1 as f64, clip.x2 as f64 + 1.0);
        let (y_min, y_max) = (clip.y1 as f64, clip.y2 as f64 + 1.0);
        let left = snap_to_grid(x - half).clamp(x_min, x_max);
        let right = snap_to_grid(x + half).clamp(x_min, x_max);
        let top = snap_to_grid(pa.y).clamp(y_min, y_max);
        let bottom = snap_to_grid(pb.y).clamp(y_min, y_max);

        if left >= right || top >= bottom {
            return mode.antialiased;
        }

        if mode.antialiased {
            let i_left = left.floor() as i32;
            let i_right = right.floor() as i32;
            let left_width = (i_left + 1) as f64 - left;
            let right_width = right - i_right as f64;

            let top = Fixed::from_f64(top);
            let bottom = Fixed::from_f64(bottom);
            for y in top.to_int()..bottom.ceil_to_int() {
                let row_top = Fixed::from_int(y).max(top);
                let row_bottom = Fixed::from_int(y + 1).min(bottom);
                let h = (row_bottom - row_top).to_f64();
                if h <= 0.0 {
                    continue;
                }
                let y = y as i32;

                if i_left == i_right {
                    buffer.add_span(i_left, 1, y, coverage_byte(h * (right - left)));
                    continue;
                }
                if left_width == 1.0 {
                    buffer.add_span(i_left, (i_right - i_left) as u32, y, coverage_byte(h));
                } else {
                    buffer.add_span(i_left, 1, y, coverage_byte(h * left_width));
                    if i_right - i_left > 1 {
                        buffer.add_span(
                            i_left + 1,
                            (i_right - i_left - 1) as u32,
                            y,
                            coverage_byte(h),
                        );
                    }
                }
                if right_width > 0.0 {
                    buffer.add_span(i_right, 1, y, coverage_byte(h * right_width));
                }
            }
        } else {
            let i_top = ((top + 0.5).floor() as i32).max(clip.y1);
            let i_bottom = ((bottom - 0.5).floor() as i32).min(clip.y2);
            let i_left = ((left + 0.5).floor() as i32).max(clip.x1);
            let i_right = ((right - 0.5).floor() as i32).min(clip.x2);
            if i_right < i_left || i_bottom < i_top {
                return false;
            }
            let len = (i_right - i_left + 1) as u32;
            for y in i_top..=i_bottom {
                buffer.add_span(i_left, len, y, COVER_FULL);
            }
        }
        true
    }

    fn general(
        &mut self,
        mut pa: PointF,
        mut pb: PointF,
        rel_width: f64,
        mode: StrokeMode,
        clip: &RectI,
        buffer: &mut SpanBuffer<'_>,
    ) -> bool {
        if pa.y > pb.y {
            std::mem::swap(&mut pa, &mut pb);
        }
        let d = pb - pa;
        let perp = PointF::new(d.y, -d.x) * (0.5 * rel_width);

        let (top, left, right, bottom) = if d.x > 0.0 {
            (pa + perp, pa - perp, pb + perp, pb - perp)
        } else {
            (pa - perp, pb - perp, pa + perp, pb + perp)
        };
        let snap = |p: PointF| PointF::new(snap_to_grid(p.x), snap_to_grid(p.y));
        let (top, left, right, bottom) = (snap(top), snap(left), snap(right), snap(bottom));

        let lb = Boundary {
            top,
            mid: left,
            bottom,
        };
        let rb = Boundary {
            top,
            mid: right,
            bottom,
        };

        if mode.antialiased {
            self.quad_aa(&lb, &rb, clip, buffer);
            true
        } else {
            quad_aliased(&lb, &rb, clip, buffer)
        }
    }

    fn quad_aa(&mut self, lb: &Boundary, rb: &Boundary, clip: &RectI, buffer: &mut SpanBuffer<'_>) {
        let (top_y, bottom_y) = (lb.top.y, lb.bottom.y);
        if bottom_y <= top_y {
            return;
        }
        let first = (top_y.floor() as i64).max(clip.y1 as i64);
        let last = ((bottom_y.ceil() as i64) - 1).min(clip.y2 as i64);

        for y in first..=last {
            let y0 = (y as f64).max(top_y);
            let y1 = ((y + 1) as f64).min(bottom_y);
            if y1 <= y0 {
                continue;
            }

            let mut cuts = [y0, y1, y1, y1];
            let mut n = 1;
            for c in [lb.mid.y, rb.mid.y] {
                if c > y0 && c < y1 {
                    cuts[n] = c;
                    n += 1;
                }
            }
            cuts[n] = y1;
            cuts[1..n].sort_by(f64::total_cmp);

            // Column range touched by this row.
            let mut x_lo = f64::INFINITY;
            let mut x_hi = f64::NEG_INFINITY;
            for &c in &cuts[..=n] {
                x_lo = x_lo.min(lb.x_at(c.max(y0)));
                x_hi = x_hi.max(rb.x_at(c.min(y1)));
            }
            let col_lo = (x_lo.floor() as i64).max(clip.x1 as i64);
            let col_hi = (x_hi.floor() as i64).min(clip.x2 as i64);
            if col_hi < col_lo {
                continue;
            }

            self.row.clear();
            self.row.resize((col_hi - col_lo + 1) as usize, 0.0);

            for strip in cuts[..=n].windows(2) {
                let (s0, s1) = (strip[0], strip[1]);
                let h = s1 - s0;
                if h <= 0.0 {
                    continue;
                }
                let ym = (s0 + s1) * 0.5;
                let (l0, l1) = lb.piece(ym);
                let (r0, r1) = rb.piece(ym);
                let (la, lz) = (x_at(l0, l1, s0), x_at(l0, l1, s1));
                let (ra, rz) = (x_at(r0, r1, s0), x_at(r0, r1, s1));
                let (l_lo, l_hi) = (la.min(lz), la.max(lz));
                let (r_lo, r_hi) = (ra.min(rz), ra.max(rz));

                for (i, acc) in self.row.iter_mut().enumerate() {
                    let x = (col_lo + i as i64) as f64;
                    *acc += intersect_pixel(x, h, r_lo, r_hi) - intersect_pixel(x, h, l_lo, l_hi);
                }
            }

            emit_row(&self.row, col_lo as i32, y as i32, buffer);
        }
    }
}

/// Emit runs of equal coverage from a row accumulation buffer.
fn emit_row(row: &[f64], x0: i32, y: i32, buffer: &mut SpanBuffer<'_>) {
    let mut start = 0usize;
    while start < row.len() {
        let cov = coverage_byte(row[start]);
        let mut end = start + 1;
        while end < row.len() && coverage_byte(row[end]) == cov {
            end += 1;
        }
        buffer.add_span(x0 + start as i32, (end - start) as u32, y, cov);
        start = end;
    }
}

/// Center sampled quad. Returns false when no pixel center is inside.
fn quad_aliased(lb: &Boundary, rb: &Boundary, clip: &RectI, buffer: &mut SpanBuffer<'_>) -> bool {
    let mut drawn = false;
    let (top_y, bottom_y) = (lb.top.y, lb.bottom.y);
    let first = ((top_y + 0.5).floor() as i64).max(clip.y1 as i64);
    let last = ((bottom_y - 0.5).floor() as i64).min(clip.y2 as i64);

    for y in first..=last {
        let yc = y as f64 + 0.5;
        if yc <= top_y || yc > bottom_y {
            continue;
        }
        let xl = lb.x_at(yc);
        let xr = rb.x_at(yc);
        let x0 = ((xl - 0.5).ceil() as i64).max(clip.x1 as i64);
        let x1 = ((xr - 0.5).ceil() as i64 - 1).min(clip.x2 as i64);
        if x1 >= x0 {
            buffer.add_span(x0 as i32, (x1 - x0 + 1) as u32, y as i32, COVER_FULL);
            drawn = true;
        }
    }
    drawn
}

// ============================================================================
// Tests
// ============================================================================
