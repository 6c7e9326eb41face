#![forbid(unsafe_code)]
#![doc = "Backend traits for clipmark: platform abstraction for playback, storage, timers, and layout."]
#![doc = ""]
#![doc = "This crate defines the boundary between the player session and the embedding"]
#![doc = "environment (a browser page via `clipmark-web`, or a test double)."]
#![doc = "The session never touches a media element, `localStorage`, `setTimeout`, or the"]
#![doc = "DOM directly; everything flows through these traits."]

use core::time::Duration;

use clipmark_core::geometry::TimelineLayout;
use clipmark_core::timer::{TimerCommand, TimerKind, TimerToken};

/// Monotonic clock abstraction used by hosts to stamp pointer samples.
///
/// Native hosts use `Instant`; web hosts use `performance.now()`; tests use a
/// deterministic clock they advance by hand.
pub trait BackendClock {
    /// Milliseconds since an unspecified epoch, monotonically non-decreasing.
    fn now_ms(&self) -> u64;
}

/// The media element the player drives.
///
/// Times are seconds. [`duration`](Self::duration) is NaN until metadata is
/// known, mirroring `HTMLMediaElement.duration`.
pub trait PlaybackEngine {
    /// Platform-specific error type.
    type Error: core::fmt::Debug + core::fmt::Display;

    /// Start or resume playback. May be rejected (e.g. autoplay policy).
    fn play(&mut self) -> Result<(), Self::Error>;

    /// Pause playback.
    fn pause(&mut self);

    /// Whether playback is paused.
    fn paused(&self) -> bool;

    /// Current position in seconds. May be non-finite before a source loads.
    fn current_time(&self) -> f64;

    /// Seek to `secs`.
    fn set_current_time(&mut self, secs: f64);

    /// Media duration in seconds, NaN while unknown.
    fn duration(&self) -> f64;

    /// Set the playback speed multiplier.
    fn set_playback_rate(&mut self, rate: f64);

    /// Current playback speed multiplier.
    fn playback_rate(&self) -> f64;

    /// Identifier of the loaded source, if any.
    fn source(&self) -> Option<&str>;

    /// Load a new source. Invalidates position and duration.
    fn set_source(&mut self, source: &str);
}

/// String key-value persistence (`localStorage` on the web).
pub trait KeyValueStore {
    /// Platform-specific error type.
    type Error: core::fmt::Debug + core::fmt::Display;

    /// Fetch the value for `key`.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// Cancellable single-shot timer capability.
///
/// The host reports fires back to the session together with the token given
/// at schedule time.
pub trait TimerScheduler {
    /// Arm a timer; replaces any pending timer of the same kind.
    fn schedule(&mut self, kind: TimerKind, token: TimerToken, delay: Duration);

    /// Disarm the pending timer of `kind`, if any.
    fn cancel(&mut self, kind: TimerKind);

    /// Execute recognizer timer commands in order.
    fn apply(&mut self, commands: &[TimerCommand]) {
        for command in commands {
            match *command {
                TimerCommand::Schedule { kind, token, delay } => self.schedule(kind, token, delay),
                TimerCommand::Cancel { kind } => self.cancel(kind),
            }
        }
    }
}

/// Visual geometry query for the rendered timeline.
pub trait TimelineGeometry {
    /// Current layout, or `None` while the timeline is not laid out.
    fn timeline_layout(&self) -> Option<TimelineLayout>;
}

/// Player surface visibility and full-screen presentation.
pub trait Presentation {
    /// Show or hide the player surface.
    fn set_visible(&mut self, visible: bool);

    /// Whether the player surface is shown.
    fn is_visible(&self) -> bool;

    /// Ask the platform to present the player full-screen.
    fn request_fullscreen(&mut self);

    /// Leave full-screen presentation if active.
    fn exit_fullscreen(&mut self);

    /// Whether full-screen presentation is active.
    fn is_fullscreen(&self) -> bool;
}

/// Unified backend combining every capability the player session consumes.
///
/// `PlayerSession` is generic over this trait. Concrete implementations:
/// - `clipmark-web`: host-driven deterministic backend for browser embedding and tests.
pub trait Backend {
    type Engine: PlaybackEngine;
    type Storage: KeyValueStore;
    type Timers: TimerScheduler;
    type Geometry: TimelineGeometry;
    type Presentation: Presentation;

    fn engine(&self) -> &Self::Engine;
    fn engine_mut(&mut self) -> &mut Self::Engine;
    fn storage(&self) -> &Self::Storage;
    fn storage_mut(&mut self) -> &mut Self::Storage;
    /// Borrow the engine and the store together (favorite commands touch both).
    fn engine_and_storage_mut(&mut self) -> (&mut Self::Engine, &mut Self::Storage);
    fn timers_mut(&mut self) -> &mut Self::Timers;
    fn geometry(&self) -> &Self::Geometry;
    fn presentation(&self) -> &Self::Presentation;
    fn presentation_mut(&mut self) -> &mut Self::Presentation;
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipmark_core::geometry::Span;

    // -----------------------------------------------------------------------
    // Mock implementations for trait testing
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct RecordingTimers {
        log: Vec<String>,
    }

    impl TimerScheduler for RecordingTimers {
        fn schedule(&mut self, kind: TimerKind, token: TimerToken, delay: Duration) {
            self.log.push(format!(
                "schedule {} #{} {}ms",
                kind.as_str(),
                token.get(),
                delay.as_millis()
            ));
        }

        fn cancel(&mut self, kind: TimerKind) {
            self.log.push(format!("cancel {}", kind.as_str()));
        }
    }

    struct FixedLayout(Option<TimelineLayout>);

    impl TimelineGeometry for FixedLayout {
        fn timeline_layout(&self) -> Option<TimelineLayout> {
            self.0
        }
    }

    struct TestClock {
        now: u64,
    }

    impl BackendClock for TestClock {
        fn now_ms(&self) -> u64 {
            self.now
        }
    }

    #[test]
    fn clock_returns_elapsed() {
        let clock = TestClock { now: 42 };
        assert_eq!(clock.now_ms(), 42);
    }

    #[test]
    fn timer_apply_preserves_order() {
        let mut timers = RecordingTimers::default();
        timers.apply(&[
            TimerCommand::Cancel {
                kind: TimerKind::DoubleTapWait,
            },
            TimerCommand::Schedule {
                kind: TimerKind::SlowPress,
                token: TimerToken::new(4),
                delay: Duration::from_millis(500),
            },
        ]);
        assert_eq!(
            timers.log,
            vec!["cancel double_tap_wait", "schedule slow_press #4 500ms"]
        );
    }

    #[test]
    fn geometry_may_be_unavailable() {
        assert!(FixedLayout(None).timeline_layout().is_none());
        let layout = TimelineLayout::new(Span::new(0.0, 100.0), 10.0);
        assert_eq!(FixedLayout(Some(layout)).timeline_layout(), Some(layout));
    }
}
