//! Input geometry: 26.6 outlines and floating point paths.
//!
//! Both formats are walked into an [`EdgeSink`] as lines and cubic curves
//! in 26.6 units, closing every contour or subpath on the way.

use crate::basics::{to_26dot6, PointF, RectD, Vector};

// ============================================================================
// EdgeSink
// ============================================================================

/// Receiver of the edges of a shape, in 26.6 units.
pub trait EdgeSink {
    fn line(&mut self, a: Vector, b: Vector);
    fn cubic(&mut self, p0: Vector, p1: Vector, p2: Vector, p3: Vector);
}

// ============================================================================
// Outline
// ============================================================================

/// Role of an outline point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointTag {
    OnCurve,
    /// Control point of a cubic Bézier; comes in pairs.
    Cubic,
}

/// Points, per-point tags and contour end indices, all in 26.6 units.
///
/// `contours[i]` is the index of the last point of contour `i`. Every
/// contour is closed: its last point joins its first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub points: Vec<Vector>,
    pub tags: Vec<PointTag>,
    pub contours: Vec<usize>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a single-contour outline from on-curve pixel coordinates.
    pub fn from_polygon(points: &[PointF]) -> Self {
        let mut outline = Outline::new();
        for (i, p) in points.iter().enumerate() {
            if i == 0 {
                outline.move_to(p.to_vector());
            } else {
                outline.line_to(p.to_vector());
            }
        }
        outline.close_contour();
        outline
    }

    /// Start a new contour, closing the current one.
    pub fn move_to(&mut self, p: Vector) {
        self.close_contour();
        self.points.push(p);
        self.tags.push(PointTag::OnCurve);
    }

    pub fn line_to(&mut self, p: Vector) {
        self.points.push(p);
        self.tags.push(PointTag::OnCurve);
    }

    pub fn cubic_to(&mut self, c1: Vector, c2: Vector, p: Vector) {
        self.points.extend_from_slice(&[c1, c2, p]);
        self.tags
            .extend_from_slice(&[PointTag::Cubic, PointTag::Cubic, PointTag::OnCurve]);
    }

    /// End the current contour, if it has any points.
    pub fn close_contour(&mut self) {
        let start = self.contours.last().map_or(0, |&end| end + 1);
        if self.points.len() > start {
            self.contours.push(self.points.len() - 1);
        }
    }

    /// Smallest and largest y over all points.
    pub fn y_extent(&self) -> Option<(i64, i64)> {
        let min = self.points.iter().map(|p| p.y).min()?;
        let max = self.points.iter().map(|p| p.y).max()?;
        Some((min, max))
    }

    /// Feed every contour to `sink`.
    pub fn walk_edges<S: EdgeSink + ?Sized>(&self, sink: &mut S) {
        let mut start = 0;
        for &end in &self.contours {
            if end >= self.points.len() || end < start {
                break;
            }
            self.walk_contour(start, end, sink);
            start = end + 1;
        }
    }

    fn walk_contour<S: EdgeSink + ?Sized>(&self, start: usize, end: usize, sink: &mut S) {
        let first = self.points[start];
        // Index past the end wraps back to the contour start.
        let at = |i: usize| if i <= end { self.points[i] } else { first };
        let tag = |i: usize| self.tags.get(i).copied().unwrap_or(PointTag::OnCurve);

        let mut current = first;
        let mut j = start + 1;
        while j <= end {
            if tag(j) == PointTag::Cubic {
                let to = at(j + 2);
                sink.cubic(current, at(j), at(j + 1), to);
                current = to;
                j += 3;
            } else {
                sink.line(current, self.points[j]);
                current = self.points[j];
                j += 1;
            }
        }
        if current != first {
            sink.line(current, first);
        }
    }
}

// ============================================================================
// Path
// ============================================================================

/// One element of a [`Path`], in pixel units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathElement {
    MoveTo(PointF),
    LineTo(PointF),
    CubicTo(PointF, PointF, PointF),
}

impl PathElement {
    /// Point the element ends at.
    pub fn end_point(&self) -> PointF {
        match *self {
            PathElement::MoveTo(p) | PathElement::LineTo(p) | PathElement::CubicTo(_, _, p) => p,
        }
    }
}

/// Ordered list of move, line and cubic elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    elements: Vec<PathElement>,
    subpath_start: PointF,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// True for a path without any drawing element.
    pub fn is_empty(&self) -> bool {
        match self.elements.as_slice() {
            [] => true,
            [PathElement::MoveTo(_)] => true,
            _ => false,
        }
    }

    /// The last point, or the origin for an empty path.
    pub fn current_point(&self) -> PointF {
        self.elements
            .last()
            .map_or(PointF::new(0.0, 0.0), PathElement::end_point)
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = PointF::new(x, y);
        self.subpath_start = p;
        self.elements.push(PathElement::MoveTo(p));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.elements.push(PathElement::LineTo(PointF::new(x, y)));
    }

    pub fn cubic_to(&mut self, c1: PointF, c2: PointF, to: PointF) {
        self.elements.push(PathElement::CubicTo(c1, c2, to));
    }

    /// Quadratic curve, stored as the equivalent cubic.
    pub fn quad_to(&mut self, c: PointF, to: PointF) {
        let from = self.current_point();
        let c1 = from + (c - from) * (2.0 / 3.0);
        let c2 = to + (c - to) * (2.0 / 3.0);
        self.cubic_to(c1, c2, to);
    }

    /// Close the current subpath with a line back to its start.
    pub fn close_subpath(&mut self) {
        if self.is_empty() {
            return;
        }
        let start = self.subpath_start;
        if self.current_point() != start {
            self.line_to(start.x, start.y);
        }
    }

    /// Bounding box of every point, control points included.
    pub fn control_point_rect(&self) -> Option<RectD> {
        let mut points = self.elements.iter().flat_map(|e| match *e {
            PathElement::MoveTo(p) | PathElement::LineTo(p) => [Some(p), None, None],
            PathElement::CubicTo(c1, c2, p) => [Some(c1), Some(c2), Some(p)],
        });
        let first = points.next().flatten()?;
        let mut r = RectD::new(first.x, first.y, first.x, first.y);
        for p in points.flatten() {
            r.x1 = r.x1.min(p.x);
            r.y1 = r.y1.min(p.y);
            r.x2 = r.x2.max(p.x);
            r.y2 = r.y2.max(p.y);
        }
        Some(r)
    }

    /// Vertical extent in 26.6 units, rounded outward.
    pub fn y_extent(&self) -> Option<(i64, i64)> {
        let r = self.control_point_rect()?;
        Some((
            to_26dot6((r.y1 * 64.0).floor() / 64.0),
            to_26dot6((r.y2 * 64.0).ceil() / 64.0),
        ))
    }

    /// Feed every subpath to `sink`, closing each with a line back to its
    /// start. A path not starting with a move begins at the origin.
    pub fn walk_edges<S: EdgeSink + ?Sized>(&self, sink: &mut S) {
        let mut first = Vector::new(0, 0);
        let mut last = first;

        for (i, element) in self.elements.iter().enumerate() {
            match *element {
                PathElement::MoveTo(p) => {
                    if i != 0 && first != last {
                        sink.line(last, first);
                    }
                    first = p.to_vector();
                    last = first;
                }
                PathElement::LineTo(p) => {
                    let p = p.to_vector();
                    sink.line(last, p);
                    last = p;
                }
                PathElement::CubicTo(c1, c2, p) => {
                    let p = p.to_vector();
                    sink.cubic(last, c1.to_vector(), c2.to_vector(), p);
                    last = p;
                }
            }
        }
        if first != last {
            sink.line(last, first);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
