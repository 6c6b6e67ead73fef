//! Rasterizer façade.
//!
//! Holds the configuration (anti-aliasing, legacy rounding, clip rectangle)
//! and the span consumer, and routes each shape to the engine that draws
//! it: the interval-merge [`ScanConverter`] for aliased fills, the cell
//! based [`CoverageRasterizer`] for anti-aliased fills and the
//! [`LineStroker`] for single stroked segments.

use log::trace;

use crate::basics::{FillRule, PointF, RectI, SUBPIXEL_HALF, SUBPIXEL_SHIFT};
use crate::coverage::CoverageRasterizer;
use crate::outline::{EdgeSink, Outline, Path};
use crate::scan_converter::{ScanConverter, COORD_OFFSET, COORD_ROUNDING};
use crate::span::{SpanBuffer, SpanConsumer};
use crate::stroke::{LineStroker, StrokeMode};

/// Converts outlines, paths and lines into spans for a consumer.
///
/// Nothing is drawn until a consumer is set with [`Rasterizer::initialize`]
/// and a valid clip rectangle with [`Rasterizer::set_clip_rect`].
pub struct Rasterizer<C: SpanConsumer> {
    antialiased: bool,
    legacy_rounding: bool,
    clip_rect: RectI,
    consumer: Option<C>,
    scan_converter: ScanConverter,
    coverage: CoverageRasterizer,
    stroker: LineStroker,
}

impl<C: SpanConsumer> Rasterizer<C> {
    pub fn new() -> Self {
        Self {
            antialiased: false,
            legacy_rounding: false,
            clip_rect: RectI::new(0, 0, -1, -1),
            consumer: None,
            scan_converter: ScanConverter::new(),
            coverage: CoverageRasterizer::new(),
            stroker: LineStroker::new(),
        }
    }

    /// Bind the consumer that receives every span.
    pub fn initialize(&mut self, consumer: C) {
        self.consumer = Some(consumer);
    }

    pub fn consumer(&self) -> Option<&C> {
        self.consumer.as_ref()
    }

    pub fn consumer_mut(&mut self) -> Option<&mut C> {
        self.consumer.as_mut()
    }

    /// Detach and return the consumer.
    pub fn take_consumer(&mut self) -> Option<C> {
        self.consumer.take()
    }

    pub fn set_antialiased(&mut self, antialiased: bool) {
        self.antialiased = antialiased;
    }

    #[inline]
    pub fn antialiased(&self) -> bool {
        self.antialiased
    }

    /// Aliased output samples pixels near their top-left corner instead of
    /// their center.
    pub fn set_legacy_rounding(&mut self, legacy: bool) {
        self.legacy_rounding = legacy;
        self.scan_converter.set_legacy_rounding(legacy);
    }

    #[inline]
    pub fn legacy_rounding(&self) -> bool {
        self.legacy_rounding
    }

    /// Inclusive device clip. An inverted rectangle suppresses all output.
    pub fn set_clip_rect(&mut self, clip: RectI) {
        self.clip_rect = clip;
    }

    #[inline]
    pub fn clip_rect(&self) -> RectI {
        self.clip_rect
    }

    /// Fill `outline` with `fill_rule`.
    pub fn rasterize_outline(&mut self, outline: &Outline, fill_rule: FillRule) {
        if outline.points.len() < 3 || outline.contours.is_empty() {
            return;
        }
        let Some(extent) = outline.y_extent() else {
            return;
        };
        self.fill(extent, fill_rule, |sink| outline.walk_edges(sink));
    }

    /// Fill `path` with `fill_rule`. Open subpaths are closed implicitly.
    pub fn rasterize_path(&mut self, path: &Path, fill_rule: FillRule) {
        if path.is_empty() {
            return;
        }
        let Some(extent) = path.y_extent() else {
            return;
        };
        self.fill(extent, fill_rule, |sink| path.walk_edges(sink));
    }

    fn fill<W>(&mut self, (min_y, max_y): (i64, i64), fill_rule: FillRule, walk: W)
    where
        W: Fn(&mut dyn EdgeSink),
    {
        let clip = self.clip_rect;
        if !clip.is_valid() {
            return;
        }
        debug_assert!(self.consumer.is_some(), "rasterizing before initialize()");
        let Some(consumer) = self.consumer.as_mut() else {
            return;
        };

        let (first, last) = if self.antialiased {
            (min_y >> SUBPIXEL_SHIFT, (max_y - 1) >> SUBPIXEL_SHIFT)
        } else {
            let r = if self.legacy_rounding {
                COORD_OFFSET - COORD_ROUNDING
            } else {
                0
            };
            (
                (min_y + SUBPIXEL_HALF + r) >> SUBPIXEL_SHIFT,
                (max_y - SUBPIXEL_HALF + r) >> SUBPIXEL_SHIFT,
            )
        };
        let first = first.max(clip.y1 as i64);
        let last = last.min(clip.y2 as i64);
        if first > last {
            return;
        }
        trace!(
            "fill rows {}..={} antialiased={} {:?}",
            first,
            last,
            self.antialiased,
            fill_rule
        );

        let mut buffer = SpanBuffer::new(consumer, clip);
        if self.antialiased {
            self.coverage.reset(clip, fill_rule);
            let sink: &mut dyn EdgeSink = &mut self.coverage;
            walk(sink);
            self.coverage.sweep(&mut buffer);
        } else {
            self.scan_converter
                .begin(first as i32, last as i32, clip.x1, clip.x2, fill_rule);
            let sink: &mut dyn EdgeSink = &mut self.scan_converter;
            walk(sink);
            self.scan_converter.end(&mut buffer);
        }
    }

    /// Stroke the segment `a → b`, `width` pixels wide. Square caps extend
    /// both ends by half the width.
    pub fn rasterize_line(&mut self, a: PointF, b: PointF, width: f64, square_cap: bool) {
        let clip = self.clip_rect;
        if !clip.is_valid() {
            return;
        }
        debug_assert!(self.consumer.is_some(), "rasterizing before initialize()");
        let Some(consumer) = self.consumer.as_mut() else {
            return;
        };
        let mode = StrokeMode {
            antialiased: self.antialiased,
            legacy_rounding: self.legacy_rounding,
        };
        trace!("line {:?} -> {:?} width {}", a, b, width);

        let mut buffer = SpanBuffer::new(consumer, clip);
        self.stroker
            .stroke(a, b, width, square_cap, mode, &mut buffer);
    }
}

impl<C: SpanConsumer> Default for Rasterizer<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
