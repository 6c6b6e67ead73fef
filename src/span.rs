//! Coverage spans and the batching span buffer.
//!
//! A [`Span`] is a horizontal run of pixels on one scanline sharing one
//! coverage value. Rasterizers never hand spans to the consumer one at a
//! time; they go through a [`SpanBuffer`], which batches up to
//! [`SPAN_BUFFER_SIZE`] of them and flushes when full or when dropped.

use crate::basics::RectI;

/// Capacity of a [`SpanBuffer`] before it flushes.
pub const SPAN_BUFFER_SIZE: usize = 256;

// ============================================================================
// Span
// ============================================================================

/// A horizontal run of `len` pixels starting at `(x, y)` with one coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub x: i32,
    pub len: u32,
    pub y: i32,
    pub coverage: u8,
}

impl Span {
    pub const fn new(x: i32, len: u32, y: i32, coverage: u8) -> Self {
        Self {
            x,
            len,
            y,
            coverage,
        }
    }

    /// Last pixel column covered by the span.
    #[inline]
    pub fn last_x(&self) -> i32 {
        self.x + self.len as i32 - 1
    }
}

// ============================================================================
// SpanConsumer
// ============================================================================

/// Destination of rasterized spans.
///
/// The slice is only valid for the duration of the call; the buffer behind
/// it is reused for the next batch.
pub trait SpanConsumer {
    fn blend_spans(&mut self, spans: &[Span]);
}

impl<F: FnMut(&[Span])> SpanConsumer for F {
    fn blend_spans(&mut self, spans: &[Span]) {
        self(spans)
    }
}

/// A consumer that records every span it receives.
#[derive(Debug, Clone, Default)]
pub struct SpanRecorder {
    spans: Vec<Span>,
    flushes: usize,
}

impl SpanRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All spans received so far, in arrival order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Number of times a batch was delivered.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn clear(&mut self) {
        self.spans.clear();
        self.flushes = 0;
    }

    /// Coverage at pixel `(x, y)`, summed over every span touching it.
    pub fn coverage_at(&self, x: i32, y: i32) -> u32 {
        self.spans
            .iter()
            .filter(|s| s.y == y && x >= s.x && x <= s.last_x())
            .map(|s| s.coverage as u32)
            .sum()
    }

    /// Spans on scanline `y`.
    pub fn row(&self, y: i32) -> impl Iterator<Item = &Span> + '_ {
        self.spans.iter().filter(move |s| s.y == y)
    }

    pub fn into_spans(self) -> Vec<Span> {
        self.spans
    }
}

impl SpanConsumer for SpanRecorder {
    fn blend_spans(&mut self, spans: &[Span]) {
        self.flushes += 1;
        self.spans.extend_from_slice(spans);
    }
}

// ============================================================================
// SpanBuffer
// ============================================================================

/// Fixed-capacity batch of spans bound to a consumer and a clip rectangle.
///
/// Remaining spans are flushed when the buffer is dropped, so no early
/// return can lose output.
pub struct SpanBuffer<'a> {
    spans: [Span; SPAN_BUFFER_SIZE],
    count: usize,
    consumer: &'a mut dyn SpanConsumer,
    clip: RectI,
}

impl<'a> SpanBuffer<'a> {
    pub fn new(consumer: &'a mut dyn SpanConsumer, clip: RectI) -> Self {
        Self {
            spans: [Span::default(); SPAN_BUFFER_SIZE],
            count: 0,
            consumer,
            clip,
        }
    }

    /// The clip rectangle every span is checked against.
    #[inline]
    pub fn clip(&self) -> &RectI {
        &self.clip
    }

    /// Spans buffered but not yet delivered.
    #[inline]
    pub fn pending(&self) -> usize {
        self.count
    }

    /// Append a span. Zero coverage or zero length spans are dropped.
    #[inline]
    pub fn add_span(&mut self, x: i32, len: u32, y: i32, coverage: u8) {
        if coverage == 0 || len == 0 {
            return;
        }
        debug_assert!(
            y >= self.clip.y1 && y <= self.clip.y2,
            "span row {} outside clip {:?}",
            y,
            self.clip
        );
        debug_assert!(
            x >= self.clip.x1 && x as i64 + len as i64 - 1 <= self.clip.x2 as i64,
            "span {}+{} outside clip {:?}",
            x,
            len,
            self.clip
        );

        self.spans[self.count] = Span::new(x, len, y, coverage);
        self.count += 1;
        if self.count == SPAN_BUFFER_SIZE {
            self.flush();
        }
    }

    /// Deliver the buffered spans to the consumer.
    pub fn flush(&mut self) {
        if self.count == 0 {
            return;
        }
        self.consumer.blend_spans(&self.spans[..self.count]);
        self.count = 0;
    }
}

impl Drop for SpanBuffer<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

// ============================================================================
// Tests
// ============================================================================
