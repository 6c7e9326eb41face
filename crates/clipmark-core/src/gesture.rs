#![forbid(unsafe_code)]

//! Gesture recognition: turns a pointer sample stream into playback intents.
//!
//! [`GestureRecognizer`] is a pure reducer over pointer samples and timer
//! fires. Each call returns a [`GestureOutput`] holding at most one recognized
//! [`Gesture`] plus the timer commands the host must execute.
//!
//! # State Machine
//!
//! ```text
//!            down                 up (tap)            timer(double_tap_wait)
//!   None ──────────▶ Down ─────────────────▶ OneTap ───────────────────────▶ None  [Tap]
//!    ▲                │ up (swipe)  [Swipe*]   │ down
//!    │                ├──────────────────────▶ None
//!    │                │ timer(slow_press)      ▼
//!    │                └──────────▶ Slow     DownTwo ── up (tap) ──▶ None  [DoubleTap]
//!    │                   [LongPressStart]      │ timer(slow_press) ──▶ Slow
//!    └──── up [LongPressEnd] ──────┘
//! ```
//!
//! # Invariants
//!
//! 1. At most one timer per [`TimerKind`] is pending at any time.
//! 2. Every pointer-down and pointer-up cancels all timers of the previous
//!    lifecycle before new ones are armed.
//! 3. A timer fire is acted on only if its token matches the pending one.
//! 4. Every pointer-up leaves the machine in `None` or `OneTap`; unmatched
//!    combinations fall back to `None` without emitting anything.
//! 5. `LongPressEnd` is emitted exactly once per `LongPressStart`.
//!
//! # Failure Modes
//!
//! - A pointer-up without a preceding down (missed event, lost capture) is
//!   absorbed: the state returns to `None` silently.
//! - A stale timer fire (host failed to cancel in time) is ignored.

use core::time::Duration;

use crate::pointer::PointerSample;
use crate::timer::{TimerCommand, TimerKind, TimerToken};

// ---------------------------------------------------------------------------
// Gestures
// ---------------------------------------------------------------------------

/// High-level intent recognized from pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Tap,
    DoubleTap,
    SwipeLeft,
    SwipeRight,
    LongPressStart,
    LongPressEnd,
}

impl Gesture {
    /// Stable name for logs and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::DoubleTap => "double_tap",
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
            Self::LongPressStart => "long_press_start",
            Self::LongPressEnd => "long_press_end",
        }
    }
}

/// Recognizer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    None,
    /// First press in progress.
    Down,
    /// Second press of a potential double tap in progress.
    DownTwo,
    /// One tap released; waiting to see whether a second press follows.
    OneTap,
    /// Long press promoted to slow-motion playback.
    Slow,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds and timeouts for gesture recognition.
///
/// Distances are host pixels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GestureConfig {
    /// Longest press that still counts as a tap (default: 200ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms", rename = "max_tap_duration_ms"))]
    pub max_tap_duration: Duration,
    /// Largest down-to-up distance that still counts as a tap (default: 10).
    pub max_tap_distance: f64,
    /// Swipes must last longer than this (default: 75ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms", rename = "min_swipe_duration_ms"))]
    pub min_swipe_duration: Duration,
    /// Swipes must last shorter than this (default: 750ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms", rename = "max_swipe_duration_ms"))]
    pub max_swipe_duration: Duration,
    /// Minimum horizontal travel of a swipe (default: 75).
    pub min_swipe_x_distance: f64,
    /// Vertical drift must stay under this fraction of horizontal travel (default: 0.25).
    pub max_swipe_y_ratio: f64,
    /// How long a released tap waits for a second press (default: 250ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms", rename = "max_double_tap_wait_ms"))]
    pub max_double_tap_wait: Duration,
    /// Hold time before a stationary press turns into a long press (default: 500ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms", rename = "slow_initial_wait_ms"))]
    pub slow_initial_wait: Duration,
    /// Maximum drift allowed for a long press (default: 10).
    pub slow_max_initial_distance: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            max_tap_duration: Duration::from_millis(200),
            max_tap_distance: 10.0,
            min_swipe_duration: Duration::from_millis(75),
            max_swipe_duration: Duration::from_millis(750),
            min_swipe_x_distance: 75.0,
            max_swipe_y_ratio: 0.25,
            max_double_tap_wait: Duration::from_millis(250),
            slow_initial_wait: Duration::from_millis(500),
            slow_max_initial_distance: 10.0,
        }
    }
}

impl GestureConfig {
    /// Validate thresholds. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("max_tap_distance", self.max_tap_distance),
            ("min_swipe_x_distance", self.min_swipe_x_distance),
            ("slow_max_initial_distance", self.slow_max_initial_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("gesture.{name} must be a finite value >= 0, got {value}"));
            }
        }

        if !(self.max_swipe_y_ratio.is_finite() && self.max_swipe_y_ratio > 0.0) {
            errors.push(format!(
                "gesture.max_swipe_y_ratio must be > 0, got {}",
                self.max_swipe_y_ratio
            ));
        }

        if self.min_swipe_duration >= self.max_swipe_duration {
            errors.push(format!(
                "gesture.min_swipe_duration ({:?}) must be shorter than max_swipe_duration ({:?})",
                self.min_swipe_duration, self.max_swipe_duration
            ));
        }

        if self.max_tap_duration.is_zero() {
            errors.push("gesture.max_tap_duration must be > 0".into());
        }
        if self.max_double_tap_wait.is_zero() {
            errors.push("gesture.max_double_tap_wait must be > 0".into());
        }
        if self.slow_initial_wait.is_zero() {
            errors.push("gesture.slow_initial_wait must be > 0".into());
        }

        errors
    }
}

#[cfg(feature = "serde")]
mod duration_ms {
    use core::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Result of feeding one input to the recognizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureOutput {
    /// Recognized intent, if this input resolved one.
    pub gesture: Option<Gesture>,
    /// Timer commands to forward to the host scheduler, in order.
    pub timers: Vec<TimerCommand>,
}

impl GestureOutput {
    /// Whether nothing was emitted and no timer changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gesture.is_none() && self.timers.is_empty()
    }
}

// ---------------------------------------------------------------------------
// GestureRecognizer
// ---------------------------------------------------------------------------

/// Stateful gesture recognizer for one input surface.
///
/// Feed samples with [`on_pointer_down`](Self::on_pointer_down),
/// [`on_pointer_move`](Self::on_pointer_move) and
/// [`on_pointer_up`](Self::on_pointer_up); report timer fires with
/// [`on_timer`](Self::on_timer).
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: GestureConfig,
    state: GestureState,
    /// Sample of the current press.
    start: Option<PointerSample>,
    /// Most recent sample of the current press.
    last: Option<PointerSample>,
    /// Pending token per timer kind, indexed by [`TimerKind::index`].
    pending: [Option<TimerToken>; 2],
    next_token: u64,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureRecognizer {
    /// Create a recognizer with the given thresholds.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: GestureState::None,
            start: None,
            last: None,
            pending: [None; 2],
            next_token: 1,
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> GestureState {
        self.state
    }

    /// Get a reference to the current configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect on the next input.
    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    /// Token of the pending timer of `kind`, if any.
    #[must_use]
    pub fn pending_timer(&self, kind: TimerKind) -> Option<TimerToken> {
        self.pending[kind.index()]
    }

    /// Whether a host context menu (long-press menu, right click) should be
    /// suppressed because a gesture is in progress.
    #[must_use]
    pub fn suppresses_context_menu(&self) -> bool {
        self.state != GestureState::None
    }

    /// Handle pointer-down.
    pub fn on_pointer_down(&mut self, sample: PointerSample) -> GestureOutput {
        let mut out = GestureOutput::default();
        self.cancel_all(&mut out);

        self.start = Some(sample);
        self.last = Some(sample);

        match self.state {
            GestureState::None => self.transition(GestureState::Down),
            GestureState::OneTap => self.transition(GestureState::DownTwo),
            // A re-press while already pressed or slowed re-anchors the press.
            GestureState::Down | GestureState::DownTwo | GestureState::Slow => {}
        }

        let delay = self.config.slow_initial_wait;
        self.schedule(TimerKind::SlowPress, delay, &mut out);
        out
    }

    /// Handle pointer-move. Only updates the tracked position.
    pub fn on_pointer_move(&mut self, sample: PointerSample) -> GestureOutput {
        if self.start.is_some() {
            self.last = Some(sample);
        }
        GestureOutput::default()
    }

    /// Handle pointer-up.
    pub fn on_pointer_up(&mut self, sample: PointerSample) -> GestureOutput {
        let mut out = GestureOutput::default();
        self.cancel_all(&mut out);

        self.last = None;
        let Some(start) = self.start.take() else {
            tracing::trace!(state = ?self.state, "pointer-up without press");
            self.transition(GestureState::None);
            return out;
        };

        let elapsed = Duration::from_millis(sample.elapsed_since(start));
        let dx = sample.x - start.x;
        let dy = sample.y - start.y;
        let distance = start.distance_to(sample);
        let is_tap =
            elapsed < self.config.max_tap_duration && distance < self.config.max_tap_distance;

        match self.state {
            GestureState::Down => {
                if is_tap {
                    self.transition(GestureState::OneTap);
                    let delay = self.config.max_double_tap_wait;
                    self.schedule(TimerKind::DoubleTapWait, delay, &mut out);
                } else {
                    self.transition(GestureState::None);
                    if self.is_swipe(elapsed, dx, dy) {
                        out.gesture = Some(if dx > 0.0 {
                            Gesture::SwipeRight
                        } else {
                            Gesture::SwipeLeft
                        });
                    }
                }
            }
            GestureState::DownTwo => {
                self.transition(GestureState::None);
                if is_tap {
                    out.gesture = Some(Gesture::DoubleTap);
                }
            }
            GestureState::Slow => {
                self.transition(GestureState::None);
                out.gesture = Some(Gesture::LongPressEnd);
            }
            GestureState::None | GestureState::OneTap => {
                self.transition(GestureState::None);
            }
        }

        if let Some(gesture) = out.gesture {
            tracing::debug!(
                gesture = gesture.as_str(),
                elapsed_ms = sample.elapsed_since(start),
                dx,
                dy,
                "gesture recognized"
            );
        }
        out
    }

    /// Handle a timer fire reported by the host.
    pub fn on_timer(&mut self, kind: TimerKind, token: TimerToken) -> GestureOutput {
        let mut out = GestureOutput::default();
        if self.pending[kind.index()] != Some(token) {
            tracing::trace!(
                kind = kind.as_str(),
                token = token.get(),
                "stale timer fire ignored"
            );
            return out;
        }
        self.pending[kind.index()] = None;

        match kind {
            TimerKind::SlowPress => {
                if matches!(self.state, GestureState::Down | GestureState::DownTwo)
                    && let (Some(start), Some(last)) = (self.start, self.last)
                    && start.distance_to(last) < self.config.slow_max_initial_distance
                {
                    self.transition(GestureState::Slow);
                    out.gesture = Some(Gesture::LongPressStart);
                }
            }
            TimerKind::DoubleTapWait => {
                if self.state == GestureState::OneTap {
                    self.transition(GestureState::None);
                    out.gesture = Some(Gesture::Tap);
                }
            }
        }

        if let Some(gesture) = out.gesture {
            tracing::debug!(gesture = gesture.as_str(), "gesture recognized on timer");
        }
        out
    }

    /// Abort the current lifecycle, e.g. on pointer-cancel.
    ///
    /// A slowed press still emits `LongPressEnd` so playback rate is restored.
    pub fn cancel(&mut self) -> GestureOutput {
        let was_slow = self.state == GestureState::Slow;
        let mut out = self.reset();
        if was_slow {
            out.gesture = Some(Gesture::LongPressEnd);
        }
        out
    }

    /// Reset to `None`, cancelling every pending timer. Emits no gesture.
    pub fn reset(&mut self) -> GestureOutput {
        let mut out = GestureOutput::default();
        self.cancel_all(&mut out);
        self.start = None;
        self.last = None;
        self.transition(GestureState::None);
        out
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

impl GestureRecognizer {
    fn is_swipe(&self, elapsed: Duration, dx: f64, dy: f64) -> bool {
        elapsed > self.config.min_swipe_duration
            && elapsed < self.config.max_swipe_duration
            && dx.abs() > self.config.min_swipe_x_distance
            && dy.abs() < dx.abs() * self.config.max_swipe_y_ratio
    }

    fn transition(&mut self, next: GestureState) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "gesture state");
            self.state = next;
        }
    }

    fn schedule(&mut self, kind: TimerKind, delay: Duration, out: &mut GestureOutput) {
        let token = TimerToken::new(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.pending[kind.index()] = Some(token);
        out.timers.push(TimerCommand::Schedule { kind, token, delay });
    }

    fn cancel_all(&mut self, out: &mut GestureOutput) {
        for kind in TimerKind::ALL {
            if self.pending[kind.index()].take().is_some() {
                out.timers.push(TimerCommand::Cancel { kind });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
