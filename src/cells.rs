//! Sparse area/cover cells for anti-aliased fills.
//!
//! Edges arrive in 26.6 units and are cut at every row and column boundary
//! in floating point, so each fragment contributes its exact share. A cell
//! carries `cover`, the signed height of the fragments crossing its pixel,
//! and `area`, that height weighted by the fragments' mean x inside the
//! pixel. The coverage of a pixel is the cover of every cell left of it on
//! its row plus `cover - area` of its own cell.
//!
//! Clipping follows the scan converter: geometry left of the clip becomes
//! vertical cover pinned to the left bound, geometry right of it is pinned
//! to the column just past the right bound, and rows outside are cut away.

use crate::basics::{from_26dot6, RectI, Vector};

/// Coverage accumulated in one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub x: i64,
    pub y: i32,
    pub cover: f64,
    pub area: f64,
}

/// Collects the cells of one shape clipped to a rectangle.
#[derive(Debug)]
pub struct CellAccumulator {
    cells: Vec<Cell>,
    current: Option<Cell>,
    left: i64,
    right: i64,
    top: f64,
    bottom: f64,
    sorted: bool,
}

impl CellAccumulator {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            current: None,
            left: 0,
            right: 0,
            top: 0.0,
            bottom: 0.0,
            sorted: true,
        }
    }

    /// Drop all cells and clip subsequent edges to `clip`.
    pub fn reset(&mut self, clip: &RectI) {
        self.cells.clear();
        self.current = None;
        self.left = clip.x1 as i64;
        self.right = clip.x2 as i64 + 1;
        self.top = clip.y1 as f64;
        self.bottom = clip.y2 as f64 + 1.0;
        self.sorted = true;
    }

    /// Accumulate the edge `a → b`.
    pub fn line(&mut self, a: Vector, b: Vector) {
        if a.y == b.y {
            return;
        }
        let (dir, p, q) = if a.y < b.y { (1.0, a, b) } else { (-1.0, b, a) };
        let (x0, y0) = (from_26dot6(p.x), from_26dot6(p.y));
        let (x1, y1) = (from_26dot6(q.x), from_26dot6(q.y));

        let top = y0.max(self.top);
        let bottom = y1.min(self.bottom);
        if top >= bottom {
            return;
        }
        self.sorted = false;

        let dxdy = (x1 - x0) / (y1 - y0);
        let x_at = |y: f64| {
            if y == y1 {
                x1
            } else {
                x0 + (y - y0) * dxdy
            }
        };

        let first = top.floor() as i64;
        let last = bottom.ceil() as i64 - 1;
        let (mut xa, mut ya) = (x_at(top), top);
        for row in first..=last {
            let yb = ((row + 1) as f64).min(bottom);
            let xb = x_at(yb);
            self.row(row as i32, (xa, ya), (xb, yb), dir);
            xa = xb;
            ya = yb;
        }
    }

    /// Split the piece of an edge inside one row at the column boundaries
    /// within the clip.
    fn row(&mut self, y: i32, from: (f64, f64), to: (f64, f64), dir: f64) {
        let (xa, ya) = from;
        let (xb, yb) = to;
        let first = (xa.min(xb).floor() as i64 + 1).max(self.left);
        let last = (xa.max(xb).ceil() as i64 - 1).min(self.right);

        let mut start = from;
        if first <= last {
            let dydx = (yb - ya) / (xb - xa);
            let mut cut = |k: i64, acc: &mut Self| {
                let x = k as f64;
                let end = (x, ya + (x - xa) * dydx);
                acc.fragment(y, start, end, dir);
                start = end;
            };
            if xa < xb {
                for k in first..=last {
                    cut(k, self);
                }
            } else {
                for k in (first..=last).rev() {
                    cut(k, self);
                }
            }
        }
        self.fragment(y, start, to, dir);
    }

    /// Add a fragment lying within a single column, or beyond a bound.
    fn fragment(&mut self, y: i32, from: (f64, f64), to: (f64, f64), dir: f64) {
        let cover = (to.1 - from.1) * dir;
        if cover == 0.0 {
            return;
        }
        let mid = (from.0 + to.0) * 0.5;
        if mid < self.left as f64 {
            self.add(self.left, y, cover, 0.0);
        } else if mid >= self.right as f64 {
            self.add(self.right, y, cover, 0.0);
        } else {
            let column = mid.floor();
            self.add(column as i64, y, cover, cover * (mid - column));
        }
    }

    #[inline]
    fn add(&mut self, x: i64, y: i32, cover: f64, area: f64) {
        match &mut self.current {
            Some(cell) if cell.x == x && cell.y == y => {
                cell.cover += cover;
                cell.area += area;
            }
            current => {
                if let Some(done) = current.replace(Cell { x, y, cover, area }) {
                    self.cells.push(done);
                }
            }
        }
    }

    /// Order the cells by row, then column. Cells sharing a pixel stay
    /// separate and are adjacent afterwards.
    pub fn sort(&mut self) {
        if let Some(cell) = self.current.take() {
            self.cells.push(cell);
        }
        if !self.sorted {
            self.cells.sort_unstable_by_key(|c| (c.y, c.x));
            self.sorted = true;
        }
    }

    /// The cells, in row and column order after [`sort`](Self::sort).
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn capacity(&self) -> usize {
        self.cells.capacity()
    }

    pub fn shrink_to(&mut self, limit: usize) {
        self.cells.shrink_to(limit);
    }
}

impl Default for CellAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
