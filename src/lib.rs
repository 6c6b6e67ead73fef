//! # scanconv
//!
//! Scanline rasterizer turning vector shapes into horizontal coverage spans.
//!
//! Shapes come in as [`Outline`]s (26.6 fixed point points with contour
//! ends) or [`Path`]s (floating point move/line/cubic commands). Output is a
//! stream of [`Span`]s, each a run of pixels on one row with a coverage
//! value in `0..=255`, delivered in batches to a [`SpanConsumer`]. Blending
//! the spans into pixels is left to the consumer.
//!
//! ## Architecture
//!
//! 1. **Input**: outlines and paths walk their edges into an [`EdgeSink`],
//!    flattening cubics on the way
//! 2. **Aliased fill**: the interval-merge [`ScanConverter`]
//! 3. **Anti-aliased fill**: area/cover cells swept by the
//!    [`CoverageRasterizer`]
//! 4. **Lines**: stroked segments drawn directly by the [`LineStroker`]
//! 5. **Output**: the [`SpanBuffer`] batches spans for the consumer
//!
//! [`Rasterizer`] ties these together behind a small configuration API.
//!
//! ```
//! use scanconv::{FillRule, Path, Rasterizer, RectI, SpanRecorder};
//!
//! let mut path = Path::new();
//! path.move_to(1.0, 1.0);
//! path.line_to(5.0, 1.0);
//! path.line_to(5.0, 3.0);
//! path.line_to(1.0, 3.0);
//!
//! let mut ras = Rasterizer::new();
//! ras.set_clip_rect(RectI::new(0, 0, 15, 15));
//! ras.initialize(SpanRecorder::new());
//! ras.rasterize_path(&path, FillRule::NonZeroWinding);
//!
//! let spans = ras.take_consumer().map(|r| r.into_spans()).unwrap_or_default();
//! assert_eq!(spans.len(), 2);
//! assert!(spans.iter().all(|s| s.x == 1 && s.len == 4 && s.coverage == 255));
//! ```

// Foundation
pub mod basics;
pub mod fixed;
pub mod span;

// Input
pub mod flatten;
pub mod outline;

// Fill engines
pub mod cells;
pub mod clip;
pub mod coverage;
pub mod scan_converter;

// Lines and façade
pub mod rasterizer;
pub mod stroke;

pub use basics::{FillRule, PointF, RectD, RectI, Vector, COVER_FULL};
pub use coverage::CoverageRasterizer;
pub use fixed::{safe_divide, Fixed};
pub use outline::{EdgeSink, Outline, Path, PathElement, PointTag};
pub use rasterizer::Rasterizer;
pub use scan_converter::{Line, ScanConverter};
pub use span::{Span, SpanBuffer, SpanConsumer, SpanRecorder};
pub use stroke::{LineStroker, StrokeMode};
