//! Anti-aliased polygon fill.
//!
//! Edges are accumulated into the [`CellAccumulator`]; the sweep then turns
//! the sorted cells of each row into fractional coverage spans. Coverage is
//! area exact, so every pixel receives the fraction of its square covered
//! by the shape. Adjacent runs of equal coverage on a row are merged into
//! one span.

use log::{debug, trace};

use crate::basics::{FillRule, RectI, Vector, COVER_FULL};
use crate::cells::{Cell, CellAccumulator};
use crate::flatten::flatten_cubic;
use crate::outline::EdgeSink;
use crate::scan_converter::SCRATCH_LIMIT;
use crate::span::{Span, SpanBuffer};

/// Accumulates one anti-aliased shape and sweeps it into spans.
pub struct CoverageRasterizer {
    cells: CellAccumulator,
    fill_rule: FillRule,
    clip: RectI,
    active: bool,
}

impl CoverageRasterizer {
    pub fn new() -> Self {
        Self {
            cells: CellAccumulator::new(),
            fill_rule: FillRule::NonZeroWinding,
            clip: RectI::new(0, 0, -1, -1),
            active: false,
        }
    }

    /// Start a new shape clipped to `clip`.
    pub fn reset(&mut self, clip: RectI, fill_rule: FillRule) {
        self.cells.reset(&clip);
        self.fill_rule = fill_rule;
        self.clip = clip;
        self.active = true;
    }

    /// Add a straight edge in 26.6 units.
    pub fn add_edge(&mut self, a: Vector, b: Vector) {
        debug_assert!(self.active, "edge added outside reset/sweep");
        self.cells.line(a, b);
    }

    /// Add a cubic Bézier in 26.6 units, flattened into edges.
    pub fn add_curve(&mut self, p0: Vector, p1: Vector, p2: Vector, p3: Vector) {
        flatten_cubic(p0, p1, p2, p3, |a, b| self.add_edge(a, b));
    }

    /// Map a signed winding-weighted coverage to a coverage byte.
    pub fn alpha(&self, coverage: f64) -> u8 {
        let c = match self.fill_rule {
            FillRule::NonZeroWinding => coverage.abs().min(1.0),
            FillRule::EvenOdd => ((coverage + 1.0).rem_euclid(2.0) - 1.0).abs(),
        };
        (c * COVER_FULL as f64).round() as u8
    }

    /// Queue a run, merging it into `pending` when it continues it.
    fn emit(
        &self,
        pending: &mut Option<Span>,
        buffer: &mut SpanBuffer<'_>,
        x: i64,
        len: i64,
        y: i32,
        alpha: u8,
    ) {
        let last = (x + len - 1).min(self.clip.x2 as i64);
        if alpha == 0 || last < x {
            return;
        }
        let (x, len) = (x as i32, (last - x + 1) as u32);
        if let Some(p) = pending {
            if p.y == y && p.coverage == alpha && p.x as i64 + p.len as i64 == x as i64 {
                p.len += len;
                return;
            }
            buffer.add_span(p.x, p.len, p.y, p.coverage);
        }
        *pending = Some(Span::new(x, len, y, alpha));
    }

    /// Emit the coverage of the accumulated shape and reset for the next.
    pub fn sweep(&mut self, buffer: &mut SpanBuffer<'_>) {
        debug_assert!(self.active, "sweep without reset");
        self.active = false;
        self.cells.sort();

        let cells = self.cells.cells();
        if let (Some(first), Some(last)) = (cells.first(), cells.last()) {
            trace!(
                "coverage sweep: {} cells, rows {}..={}",
                cells.len(),
                first.y,
                last.y
            );
        }

        let mut pending: Option<Span> = None;
        let mut rest = cells;
        while let Some(head) = rest.first() {
            let y = head.y;
            let end = rest.iter().position(|c| c.y != y).unwrap_or(rest.len());
            self.sweep_row(&rest[..end], y, &mut pending, buffer);
            rest = &rest[end..];
        }
        if let Some(p) = pending {
            buffer.add_span(p.x, p.len, p.y, p.coverage);
        }

        if self.cells.capacity() > SCRATCH_LIMIT * 16 {
            debug!("coverage: releasing {} cells", self.cells.capacity());
            self.cells.shrink_to(SCRATCH_LIMIT);
        }
        self.cells.reset(&self.clip);
    }

    /// One row of cells in column order.
    fn sweep_row(
        &self,
        row: &[Cell],
        y: i32,
        pending: &mut Option<Span>,
        buffer: &mut SpanBuffer<'_>,
    ) {
        let mut acc = 0.0;
        let mut i = 0;
        while i < row.len() {
            let x = row[i].x;
            let (mut cover, mut area) = (0.0, 0.0);
            while i < row.len() && row[i].x == x {
                cover += row[i].cover;
                area += row[i].area;
                i += 1;
            }

            let mut run_start = x;
            if area != 0.0 {
                let alpha = self.alpha(acc + cover - area);
                self.emit(pending, buffer, x, 1, y, alpha);
                run_start = x + 1;
            }
            acc += cover;
            if let Some(next) = row.get(i) {
                if next.x > run_start {
                    let alpha = self.alpha(acc);
                    self.emit(pending, buffer, run_start, next.x - run_start, y, alpha);
                }
            }
        }
    }
}

impl Default for CoverageRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeSink for CoverageRasterizer {
    fn line(&mut self, a: Vector, b: Vector) {
        self.add_edge(a, b);
    }

    fn cubic(&mut self, p0: Vector, p1: Vector, p2: Vector, p3: Vector) {
        self.add_curve(p0, p1, p2, p3);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::PointF;
    use crate::outline::Outline;
    use crate::span::SpanRecorder;

    fn v(x: f64, y: f64) -> Vector {
        PointF::new(x, y).to_vector()
    }

    fn fill(points: &[(f64, f64)], clip: RectI, rule: FillRule) -> Vec<Span> {
        let mut ras = CoverageRasterizer::new();
        ras.reset(clip, rule);
        let pts: Vec<PointF> = points.iter().map(|&(x, y)| PointF::new(x, y)).collect();
        Outline::from_polygon(&pts).walk_edges(&mut ras);
        let mut rec = SpanRecorder::new();
        {
            let mut buf = SpanBuffer::new(&mut rec, clip);
            ras.sweep(&mut buf);
        }
        rec.into_spans()
    }

    #[test]
    fn test_alpha() {
        let ras = CoverageRasterizer::new();
        assert_eq!(ras.alpha(0.0), 0);
        assert_eq!(ras.alpha(1.0), 255);
        assert_eq!(ras.alpha(-1.0), 255);
        assert_eq!(ras.alpha(0.5), 128);
        assert_eq!(ras.alpha(-0.25), 64);
        assert_eq!(ras.alpha(3.0), 255);
    }

    #[test]
    fn test_alpha_even_odd_folds() {
        let mut ras = CoverageRasterizer::new();
        ras.reset(RectI::new(0, 0, 9, 9), FillRule::EvenOdd);
        assert_eq!(ras.alpha(2.0), 0);
        assert_eq!(ras.alpha(-2.0), 0);
        assert_eq!(ras.alpha(3.0), 255);
        assert_eq!(ras.alpha(1.5), 128);
        assert_eq!(ras.alpha(-1.5), 128);
    }

    #[test]
    fn test_integer_rect_full_coverage() {
        let spans = fill(
            &[(2.0, 3.0), (8.0, 3.0), (8.0, 9.0), (2.0, 9.0)],
            RectI::new(0, 0, 19, 19),
            FillRule::NonZeroWinding,
        );
        let expected: Vec<Span> = (3..9).map(|y| Span::new(2, 6, y, 255)).collect();
        assert_eq!(spans, expected);
    }

    #[test]
    fn test_triangle_first_row() {
        let spans = fill(
            &[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)],
            RectI::new(0, 0, 19, 19),
            FillRule::NonZeroWinding,
        );
        let row0: Vec<_> = spans.iter().filter(|s| s.y == 0).copied().collect();
        assert_eq!(row0, vec![Span::new(0, 9, 0, 255), Span::new(9, 1, 0, 128)]);
        let row9: Vec<_> = spans.iter().filter(|s| s.y == 9).copied().collect();
        assert_eq!(row9, vec![Span::new(0, 1, 9, 128)]);
        assert!(spans.iter().all(|s| s.y >= 0 && s.y <= 9));
    }

    #[test]
    fn test_half_pixel_rect_edges() {
        let spans = fill(
            &[(1.5, 1.0), (4.5, 1.0), (4.5, 2.0), (1.5, 2.0)],
            RectI::new(0, 0, 9, 9),
            FillRule::NonZeroWinding,
        );
        assert_eq!(
            spans,
            vec![
                Span::new(1, 1, 1, 128),
                Span::new(2, 2, 1, 255),
                Span::new(4, 1, 1, 128),
            ]
        );
    }

    #[test]
    fn test_spans_clamped_to_clip() {
        let clip = RectI::new(2, 2, 5, 5);
        let spans = fill(
            &[(-10.0, -10.0), (30.0, -10.0), (30.0, 30.0), (-10.0, 30.0)],
            clip,
            FillRule::NonZeroWinding,
        );
        let expected: Vec<Span> = (2..=5).map(|y| Span::new(2, 4, y, 255)).collect();
        assert_eq!(spans, expected);
    }

    #[test]
    fn test_reset_discards_previous_shape() {
        let clip = RectI::new(0, 0, 9, 9);
        let mut ras = CoverageRasterizer::new();
        ras.reset(clip, FillRule::NonZeroWinding);
        ras.add_edge(v(1.0, 1.0), v(1.0, 5.0));
        ras.reset(clip, FillRule::NonZeroWinding);
        let mut rec = SpanRecorder::new();
        {
            let mut buf = SpanBuffer::new(&mut rec, clip);
            ras.sweep(&mut buf);
        }
        assert!(rec.spans().is_empty());
    }

    #[test]
    fn test_curve_fill_reaches_apex() {
        let clip = RectI::new(0, 0, 39, 39);
        let mut ras = CoverageRasterizer::new();
        ras.reset(clip, FillRule::NonZeroWinding);
        ras.add_curve(v(0.0, 0.0), v(0.0, 32.0), v(32.0, 32.0), v(32.0, 0.0));
        ras.add_edge(v(32.0, 0.0), v(0.0, 0.0));
        let mut rec = SpanRecorder::new();
        {
            let mut buf = SpanBuffer::new(&mut rec, clip);
            ras.sweep(&mut buf);
        }
        let max_y = rec.spans().iter().map(|s| s.y).max().unwrap_or(0);
        // Apex at 0.75 of the control height.
        assert_eq!(max_y, 23);
    }
}
