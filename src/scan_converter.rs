//! Aliased interval-merge scan converter.
//!
//! Edges enter as 26.6 segments and are stored as [`Line`] records: the
//! fixed-point x at the center of the first covered row, a per-row slope,
//! an inclusive row range and a winding direction. Lines are clipped against
//! the left and right bounds on the way in; the parts outside are replaced by
//! vertical lines pinned to the bound, so the winding to the right of a
//! bound stays correct.
//!
//! `end()` turns the lines into full-coverage spans. Up to
//! [`SMALL_EDGE_COUNT`] lines are swept with a sorted active edge list.
//! Larger inputs are processed in chunks of [`CHUNK_SIZE`] rows, each row
//! collecting its crossings in a binary insertion tree of [`Intersection`]
//! nodes where equal x positions merge their windings.
//!
//! Pixel convention: row `y` belongs to an edge when `a.y < y + 0.5 <= b.y`,
//! and pixel `n` is inside when its center `n + 0.5` lies between two
//! crossings.

use log::{debug, trace};

use crate::basics::{FillRule, Vector, COVER_FULL, SUBPIXEL_HALF, SUBPIXEL_SHIFT};
use crate::fixed::{safe_divide, Fixed};
use crate::flatten::flatten_cubic;
use crate::outline::EdgeSink;
use crate::span::SpanBuffer;

/// Rows processed per interval-merge chunk.
pub const CHUNK_SIZE: i32 = 64;
/// Largest line count handled by the active edge list sweep.
pub const SMALL_EDGE_COUNT: usize = 32;
/// Scratch buffers above this many entries are released after a pass.
pub const SCRATCH_LIMIT: usize = 1024;

/// Coordinate bias applied in legacy rounding mode, in 26.6 units.
pub const COORD_OFFSET: i64 = 32;
/// Rounding term of legacy mode, in 26.6 units.
pub const COORD_ROUNDING: i64 = 1;

// ============================================================================
// Line / Intersection
// ============================================================================

/// One clipped edge spanning the inclusive rows `top..=bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Crossing at the center of row `top`, biased by half a pixel so that
    /// truncation rounds to the nearest pixel boundary.
    pub x: Fixed,
    /// Per-row x increment.
    pub delta: Fixed,
    pub top: i32,
    pub bottom: i32,
    pub winding: i32,
}

/// A crossing node of one row's insertion tree.
///
/// `left` and `right` index into the shared node array; 0 means no child.
/// Index 0 is always a row head, and heads are never children.
#[derive(Debug, Clone, Copy, Default)]
struct Intersection {
    x: i32,
    winding: i32,
    left: u32,
    right: u32,
}

impl Intersection {
    const HEAD: Intersection = Intersection {
        x: i32::MIN,
        winding: 0,
        left: 0,
        right: 0,
    };
}

/// Running winding state of one row, turning inside/outside transitions
/// into spans.
struct RowSweep {
    mask: i32,
    winding: i32,
    start: i32,
}

impl RowSweep {
    fn new(mask: i32) -> Self {
        Self {
            mask,
            winding: 0,
            start: 0,
        }
    }

    #[inline]
    fn cross(&mut self, x: i32, winding: i32, y: i32, spans: &mut SpanBuffer<'_>) {
        let was_inside = self.winding & self.mask != 0;
        self.winding += winding;
        let inside = self.winding & self.mask != 0;
        if inside && !was_inside {
            self.start = x;
        } else if was_inside && !inside && x > self.start {
            spans.add_span(self.start, (x - self.start) as u32, y, COVER_FULL);
        }
    }
}

// ============================================================================
// ScanConverter
// ============================================================================

/// The `begin → (merge_line | merge_curve)* → end` scan conversion engine.
pub struct ScanConverter {
    lines: Vec<Line>,
    intersections: Vec<Intersection>,
    active: Vec<usize>,
    stack: Vec<u32>,
    top: i32,
    bottom: i32,
    left: i32,
    right: i32,
    left_fp: Fixed,
    right_fp: Fixed,
    fill_rule_mask: i32,
    legacy_rounding: bool,
    in_pass: bool,
}

impl ScanConverter {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            intersections: Vec::new(),
            active: Vec::new(),
            stack: Vec::new(),
            top: 0,
            bottom: -1,
            left: 0,
            right: -1,
            left_fp: Fixed::ZERO,
            right_fp: Fixed::ZERO,
            fill_rule_mask: !0,
            legacy_rounding: false,
            in_pass: false,
        }
    }

    /// Bias coordinates by just under half a pixel, so pixels are sampled
    /// near their top-left corner instead of their center.
    pub fn set_legacy_rounding(&mut self, legacy: bool) {
        self.legacy_rounding = legacy;
    }

    #[inline]
    pub fn legacy_rounding(&self) -> bool {
        self.legacy_rounding
    }

    /// Start a pass over the inclusive rows `top..=bottom` and columns
    /// `left..=right`.
    pub fn begin(&mut self, top: i32, bottom: i32, left: i32, right: i32, fill_rule: FillRule) {
        debug_assert!(!self.in_pass, "begin() while a pass is in progress");
        self.lines.clear();
        self.top = top;
        self.bottom = bottom;
        self.left = left;
        self.right = right;
        self.left_fp = Fixed::from_int(left as i64);
        self.right_fp = Fixed::from_int(right as i64 + 1);
        self.fill_rule_mask = fill_rule.winding_mask();
        self.in_pass = true;
    }

    /// Lines accumulated since `begin()`.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Add the edge `a → b` (26.6 units).
    pub fn merge_line(&mut self, a: Vector, b: Vector) {
        debug_assert!(self.in_pass, "merge_line() outside begin()/end()");

        let (mut a, mut b, winding) = if a.y > b.y { (b, a, -1) } else { (a, b, 1) };

        let rounding = if self.legacy_rounding {
            a.x += COORD_OFFSET;
            a.y += COORD_OFFSET;
            b.x += COORD_OFFSET;
            b.y += COORD_OFFSET;
            COORD_ROUNDING
        } else {
            0
        };

        let i_top = (self.top as i64).max((a.y + SUBPIXEL_HALF - rounding) >> SUBPIXEL_SHIFT);
        let i_bottom =
            (self.bottom as i64).min((b.y - SUBPIXEL_HALF - rounding) >> SUBPIXEL_SHIFT);
        if i_top > i_bottom {
            return;
        }
        let mut top = i_top as i32;
        let mut bottom = i_bottom as i32;

        let a_fp = Fixed::HALF + Fixed::from_26dot6(a.x) - Fixed::from_raw(rounding);

        if a.x == b.x {
            self.push_vertical(a_fp.clamp(self.left_fp, self.right_fp), top, bottom, winding);
            return;
        }

        let slope = Fixed::from_f64(safe_divide((b.x - a.x) as f64, (b.y - a.y) as f64));
        let mut x = a_fp
            + slope * (Fixed::from_int(top as i64) + Fixed::HALF - Fixed::from_26dot6(a.y));

        if self.clip(&mut x, &mut top, &mut bottom, slope, self.left_fp, winding) {
            return;
        }
        if self.clip(&mut x, &mut top, &mut bottom, slope, self.right_fp, winding) {
            return;
        }

        self.lines.push(Line {
            x,
            delta: slope,
            top,
            bottom,
            winding,
        });
    }

    /// Add the cubic Bézier `p0, p1, p2, p3` (26.6 units), flattened.
    pub fn merge_curve(&mut self, p0: Vector, p1: Vector, p2: Vector, p3: Vector) {
        flatten_cubic(p0, p1, p2, p3, |a, b| self.merge_line(a, b));
    }

    /// Scan convert everything merged since `begin()` into `spans`.
    pub fn end(&mut self, spans: &mut SpanBuffer<'_>) {
        debug_assert!(self.in_pass, "end() without begin()");
        self.in_pass = false;

        if !self.lines.is_empty() {
            if self.lines.len() <= SMALL_EDGE_COUNT {
                trace!(
                    "active edge sweep: {} lines, rows {}..={}",
                    self.lines.len(),
                    self.top,
                    self.bottom
                );
                self.sweep_active_edges(spans);
            } else {
                trace!(
                    "interval merge: {} lines, rows {}..={}",
                    self.lines.len(),
                    self.top,
                    self.bottom
                );
                self.sweep_chunks(spans);
            }
        }

        self.release_scratch();
    }

    // ========================================================================
    // Clipping
    // ========================================================================

    fn push_vertical(&mut self, x: Fixed, top: i32, bottom: i32, winding: i32) {
        self.lines.push(Line {
            x,
            delta: Fixed::ZERO,
            top,
            bottom,
            winding,
        });
    }

    /// Clip a slanted line against one vertical bound.
    ///
    /// Rows outside the bound become a vertical line pinned to it. Returns
    /// `true` when nothing of the slanted line remains.
    fn clip(
        &mut self,
        x: &mut Fixed,
        top: &mut i32,
        bottom: &mut i32,
        slope: Fixed,
        edge: Fixed,
        winding: i32,
    ) -> bool {
        let right = edge == self.right_fp;

        if *x == edge {
            if (slope > Fixed::ZERO) ^ right {
                return false;
            }
            self.push_vertical(edge, *top, *bottom, winding);
            return true;
        }

        let last = *x + slope.mul_int((*bottom - *top) as i64);

        if last == edge {
            if (slope < Fixed::ZERO) ^ right {
                return false;
            }
            self.push_vertical(edge, *top, *bottom, winding);
            return true;
        }

        if (last < edge) ^ (*x < edge) {
            // Rows from `top` until the line reaches the bound.
            let rows = safe_divide((edge - *x).to_f64(), slope.to_f64()).floor();
            let height = rows.clamp(0.0, (*bottom - *top) as f64) as i32;
            let middle = *top + height;

            if (*x < edge) ^ right {
                // Top part is outside.
                if middle >= *bottom {
                    self.push_vertical(edge, *top, *bottom, winding);
                    return true;
                }
                self.push_vertical(edge, *top, middle, winding);
                *x += slope.mul_int(height as i64 + 1);
                *top = middle + 1;
            } else if middle < *bottom {
                // Bottom part is outside.
                self.push_vertical(edge, middle + 1, *bottom, winding);
                *bottom = middle;
            }
            return false;
        }

        if (*x < edge) ^ right {
            self.push_vertical(edge, *top, *bottom, winding);
            return true;
        }
        false
    }

    // ========================================================================
    // Sweeps
    // ========================================================================

    #[inline]
    fn pixel_x(x: Fixed, left: i32, right: i32) -> i32 {
        x.to_int().clamp(left as i64, right as i64 + 1) as i32
    }

    fn sweep_active_edges(&mut self, spans: &mut SpanBuffer<'_>) {
        let Self {
            lines,
            active,
            left,
            right,
            bottom,
            fill_rule_mask,
            ..
        } = self;
        let (left, right, last_row, mask) = (*left, *right, *bottom, *fill_rule_mask);

        let all_vertical = lines.iter().all(|l| l.delta == Fixed::ZERO);
        lines.sort_by_key(|l| l.top);
        active.clear();

        let mut next = 0;
        let mut y = lines[0].top;

        while y <= last_row {
            while next < lines.len() && lines[next].top == y {
                if all_vertical {
                    let x = lines[next].x;
                    let pos = active.partition_point(|&i| lines[i].x <= x);
                    active.insert(pos, next);
                } else {
                    active.push(next);
                }
                next += 1;
            }

            if active.is_empty() {
                match lines.get(next) {
                    Some(line) => {
                        y = line.top;
                        continue;
                    }
                    None => break,
                }
            }

            if !all_vertical {
                // Nearly sorted from the previous row.
                for i in 1..active.len() {
                    let mut j = i;
                    while j > 0 && lines[active[j - 1]].x > lines[active[j]].x {
                        active.swap(j - 1, j);
                        j -= 1;
                    }
                }
            }

            let mut sweep = RowSweep::new(mask);
            let mut k = 0;
            while k < active.len() {
                let x = Self::pixel_x(lines[active[k]].x, left, right);
                let mut winding = 0;
                while k < active.len() && Self::pixel_x(lines[active[k]].x, left, right) == x {
                    winding += lines[active[k]].winding;
                    k += 1;
                }
                sweep.cross(x, winding, y, spans);
            }

            let mut kept = 0;
            for k in 0..active.len() {
                let i = active[k];
                if lines[i].bottom == y {
                    continue;
                }
                let delta = lines[i].delta;
                lines[i].x += delta;
                active[kept] = i;
                kept += 1;
            }
            active.truncate(kept);

            y += 1;
        }
    }

    fn sweep_chunks(&mut self, spans: &mut SpanBuffer<'_>) {
        let Self {
            lines,
            intersections,
            stack,
            left,
            right,
            fill_rule_mask,
            ..
        } = self;
        let (left, right, mask) = (*left, *right, *fill_rule_mask);

        let first_row = lines.iter().map(|l| l.top).min().unwrap_or(0);
        let last_row = lines.iter().map(|l| l.bottom).max().unwrap_or(-1);

        let mut chunk_top = first_row;
        while chunk_top <= last_row {
            let chunk_bottom = chunk_top.saturating_add(CHUNK_SIZE - 1).min(last_row);
            let rows = (chunk_bottom - chunk_top + 1) as usize;

            intersections.clear();
            intersections.resize(rows, Intersection::HEAD);

            for line in lines.iter() {
                if line.bottom < chunk_top || line.top > chunk_bottom {
                    continue;
                }
                let top = chunk_top.max(line.top);
                let bottom = chunk_bottom.min(line.bottom);
                let mut x = line.x + line.delta.mul_int((top - line.top) as i64);
                for y in top..=bottom {
                    merge_intersection(
                        intersections,
                        (y - chunk_top) as usize,
                        Self::pixel_x(x, left, right),
                        line.winding,
                    );
                    x += line.delta;
                }
            }

            for row in 0..rows {
                emit_row(intersections, stack, row, chunk_top + row as i32, mask, spans);
            }

            if chunk_bottom == i32::MAX {
                break;
            }
            chunk_top = chunk_bottom + 1;
        }
    }

    fn release_scratch(&mut self) {
        if self.intersections.capacity() > SCRATCH_LIMIT {
            debug!(
                "releasing {} intersection nodes",
                self.intersections.capacity()
            );
            self.intersections = Vec::new();
        } else {
            self.intersections.clear();
        }
        self.lines.clear();
        self.lines.shrink_to(SCRATCH_LIMIT);
        self.active.clear();
        self.active.shrink_to(SCRATCH_LIMIT);
        self.stack.clear();
        self.stack.shrink_to(SCRATCH_LIMIT);
    }

    #[cfg(test)]
    fn scratch_capacity(&self) -> usize {
        self.intersections.capacity()
    }
}

impl Default for ScanConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeSink for ScanConverter {
    fn line(&mut self, a: Vector, b: Vector) {
        self.merge_line(a, b);
    }

    fn cubic(&mut self, p0: Vector, p1: Vector, p2: Vector, p3: Vector) {
        self.merge_curve(p0, p1, p2, p3);
    }
}

// ============================================================================
// Interval-merge tree
// ============================================================================

/// Insert the crossing `(x, winding)` into the tree rooted at `head`, or
/// merge it into the node already holding `x`.
fn merge_intersection(nodes: &mut Vec<Intersection>, head: usize, x: i32, winding: i32) {
    let mut current = head;
    loop {
        let node = nodes[current];
        if node.x == x {
            nodes[current].winding += winding;
            return;
        }

        let next = if x < node.x { node.left } else { node.right };
        if next != 0 {
            current = next as usize;
            continue;
        }

        let index = nodes.len() as u32;
        nodes.push(Intersection {
            x,
            winding,
            left: 0,
            right: 0,
        });
        if x < node.x {
            nodes[current].left = index;
        } else {
            nodes[current].right = index;
        }
        return;
    }
}

/// In-order walk of one row's tree, emitting spans where the masked winding
/// is non-zero.
fn emit_row(
    nodes: &[Intersection],
    stack: &mut Vec<u32>,
    head: usize,
    y: i32,
    mask: i32,
    spans: &mut SpanBuffer<'_>,
) {
    let mut sweep = RowSweep::new(mask);
    stack.clear();

    let mut current = Some(head);
    loop {
        while let Some(index) = current {
            stack.push(index as u32);
            current = match nodes[index].left {
                0 => None,
                child => Some(child as usize),
            };
        }

        let Some(index) = stack.pop() else {
            break;
        };
        let node = nodes[index as usize];
        if node.winding != 0 {
            sweep.cross(node.x, node.winding, y, spans);
        }
        current = match node.right {
            0 => None,
            child => Some(child as usize),
        };
    }
}

// ============================================================================
// Tests
// ============================================================================
