#![forbid(unsafe_code)]

//! Horizontal timeline geometry.
//!
//! All coordinates are host pixels (e.g. DOM `clientX`). Only the horizontal
//! axis matters for scrubbing and marker hit-testing, so the primitive here
//! is a one-dimensional [`Span`].

/// A horizontal extent `[left, left + width]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Span {
    pub left: f64,
    pub width: f64,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub const fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Span of the given width centered on `center`.
    #[must_use]
    pub fn centered(center: f64, width: f64) -> Self {
        Self {
            left: center - width / 2.0,
            width,
        }
    }

    /// Right edge.
    #[inline]
    #[must_use]
    pub fn right(self) -> f64 {
        self.left + self.width
    }

    /// Whether `x` lies within the span, edges included.
    #[inline]
    #[must_use]
    pub fn contains(self, x: f64) -> bool {
        x >= self.left && x <= self.right()
    }

    /// A span with non-finite edges or no positive width cannot map ratios.
    #[must_use]
    pub fn is_degenerate(self) -> bool {
        !(self.left.is_finite() && self.width.is_finite() && self.width > 0.0)
    }

    /// Ratio of `x` along the span, clamped to `[0, 1]`.
    ///
    /// Returns `None` for a degenerate span or a non-finite `x`.
    #[must_use]
    pub fn ratio_at(self, x: f64) -> Option<f64> {
        if self.is_degenerate() || !x.is_finite() {
            return None;
        }
        Some(clamp_ratio((x - self.left) / self.width))
    }

    /// Coordinate at `ratio` along the span. The ratio is clamped first.
    #[must_use]
    pub fn x_at(self, ratio: f64) -> f64 {
        self.left + clamp_ratio(ratio) * self.width
    }
}

/// Measured layout of the timeline control.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimelineLayout {
    /// Extent of the seekable bar.
    pub bar: Span,
    /// Rendered width of one favorite marker.
    pub marker_width: f64,
}

impl TimelineLayout {
    #[must_use]
    pub const fn new(bar: Span, marker_width: f64) -> Self {
        Self { bar, marker_width }
    }

    /// Bar coordinate for a playback ratio.
    #[must_use]
    pub fn x_for_ratio(&self, ratio: f64) -> f64 {
        self.bar.x_at(ratio)
    }

    /// Playback ratio for a bar coordinate, clamped to `[0, 1]`.
    #[must_use]
    pub fn ratio_at(&self, x: f64) -> Option<f64> {
        self.bar.ratio_at(x)
    }

    /// Extent of a marker drawn for `ratio`. Markers are centered over the knob.
    #[must_use]
    pub fn marker_extent(&self, ratio: f64) -> Span {
        Span::centered(self.x_for_ratio(ratio), self.marker_width.max(0.0))
    }

    /// Fraction of the bar covered by one marker.
    ///
    /// Two markers whose ratios differ by less than this value overlap.
    #[must_use]
    pub fn marker_ratio_width(&self) -> Option<f64> {
        if self.bar.is_degenerate() || !self.marker_width.is_finite() {
            return None;
        }
        Some(self.marker_width.max(0.0) / self.bar.width)
    }
}

/// Clamp a ratio to `[0, 1]`, mapping NaN to `0`.
#[must_use]
pub fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0)
}

/// `current / duration` clamped to `[0, 1]`.
///
/// Returns `None` while either value is unknown or the duration is not positive.
#[must_use]
pub fn playback_ratio(current_time: f64, duration: f64) -> Option<f64> {
    if !current_time.is_finite() || !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    Some(clamp_ratio(current_time / duration))
}
