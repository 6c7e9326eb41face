#![forbid(unsafe_code)]

//! Timeline synchronization.
//!
//! [`TimelineSync`] keeps the knob in step with two writers that never run
//! at the same time:
//!
//! - **Autonomous**: engine position ticks move the knob to
//!   `current_time / duration`.
//! - **Scrub**: while a [`ScrubSession`] is active the pointer owns the knob
//!   and position ticks are ignored.
//!
//! ```text
//!            begin_scrub (pause)          end_scrub / cancel_scrub (play)
//!   Idle ──────────────────────▶ Scrubbing ────────────────────────────▶ Idle
//!    ▲ │ on_position: knob = t/d     │ scrub_to: seek + knob
//!    └─┘                             └─┘
//! ```
//!
//! # Invariants
//!
//! 1. The knob ratio is always in `[0, 1]`.
//! 2. While the duration is unknown no seek is issued.
//! 3. Ending a scrub always clears the session, whatever came before.

use std::collections::HashMap;

use clipmark_backend::PlaybackEngine;
use clipmark_core::geometry::{TimelineLayout, clamp_ratio, playback_ratio};

/// Mutual-exclusion flag held while the viewer drags the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrubSession {
    active: bool,
}

impl ScrubSession {
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.active
    }
}

/// Where a scrub lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekTarget {
    /// Playback position in seconds.
    pub time: f64,
    /// Knob ratio for `time`.
    pub ratio: f64,
    /// Whether the pointer hit a favorite marker and the time snapped to it.
    pub snapped: bool,
}

/// Resolve pointer `x` on the timeline to a playback position.
///
/// A pointer inside a favorite marker snaps to that favorite's exact time;
/// otherwise the bar ratio at `x` applies. Returns `None` while the duration
/// or the layout is unknown.
#[must_use]
pub fn seek_target(
    x: f64,
    layout: Option<TimelineLayout>,
    favorites: &[f64],
    duration: f64,
) -> Option<SeekTarget> {
    if !(duration.is_finite() && duration > 0.0) {
        return None;
    }
    let layout = layout?;

    for &time in favorites {
        let Some(ratio) = playback_ratio(time, duration) else {
            continue;
        };
        if layout.marker_extent(ratio).contains(x) {
            return Some(SeekTarget {
                time,
                ratio,
                snapped: true,
            });
        }
    }

    let ratio = layout.ratio_at(x)?;
    Some(SeekTarget {
        time: ratio * duration,
        ratio,
        snapped: false,
    })
}

/// Knob position and scrub arbitration for one player.
#[derive(Debug, Clone, Default)]
pub struct TimelineSync {
    scrub: ScrubSession,
    knob_ratio: f64,
}

impl TimelineSync {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Knob position in `[0, 1]`.
    #[must_use]
    pub fn knob_ratio(&self) -> f64 {
        self.knob_ratio
    }

    #[must_use]
    pub fn scrub(&self) -> ScrubSession {
        self.scrub
    }

    #[must_use]
    pub fn is_scrubbing(&self) -> bool {
        self.scrub.active
    }

    /// Autonomous position update.
    ///
    /// Returns `true` when the knob followed the engine. Ignored while a
    /// scrub is active. Unknown time or duration parks the knob at the start.
    pub fn on_position(&mut self, current_time: f64, duration: f64) -> bool {
        if self.scrub.active {
            return false;
        }
        self.knob_ratio = playback_ratio(current_time, duration).unwrap_or(0.0);
        true
    }

    /// Start a scrub at pointer `x`: pause, then seek.
    ///
    /// Returns `false` if a scrub is already active.
    pub fn begin_scrub<E: PlaybackEngine>(
        &mut self,
        engine: &mut E,
        x: f64,
        layout: Option<TimelineLayout>,
        favorites: &[f64],
    ) -> bool {
        if self.scrub.active {
            tracing::trace!("scrub already active, ignoring second writer");
            return false;
        }
        self.scrub.active = true;
        engine.pause();
        let target = self.seek(engine, x, layout, favorites);
        tracing::debug!(x, ?target, "scrub started");
        true
    }

    /// Follow the pointer during a scrub.
    pub fn scrub_to<E: PlaybackEngine>(
        &mut self,
        engine: &mut E,
        x: f64,
        layout: Option<TimelineLayout>,
        favorites: &[f64],
    ) -> Option<SeekTarget> {
        if !self.scrub.active {
            return None;
        }
        self.seek(engine, x, layout, favorites)
    }

    /// Finish a scrub at pointer `x`: final seek, clear the session, resume.
    ///
    /// The session is cleared even if no scrub was recorded as active, so a
    /// pointer-up always leaves the timeline idle.
    pub fn end_scrub<E: PlaybackEngine>(
        &mut self,
        engine: &mut E,
        x: f64,
        layout: Option<TimelineLayout>,
        favorites: &[f64],
    ) -> Option<SeekTarget> {
        let was_active = self.scrub.active;
        self.scrub.active = false;
        if !was_active {
            return None;
        }
        let target = self.seek(engine, x, layout, favorites);
        resume(engine);
        tracing::debug!(x, ?target, "scrub ended");
        target
    }

    /// Abort a scrub without a final seek, resuming playback.
    pub fn cancel_scrub<E: PlaybackEngine>(&mut self, engine: &mut E) {
        if std::mem::take(&mut self.scrub.active) {
            resume(engine);
            tracing::debug!("scrub cancelled");
        }
    }

    /// Drop the session without touching playback (player closing).
    pub fn release(&mut self) {
        self.scrub.active = false;
    }

    fn seek<E: PlaybackEngine>(
        &mut self,
        engine: &mut E,
        x: f64,
        layout: Option<TimelineLayout>,
        favorites: &[f64],
    ) -> Option<SeekTarget> {
        let target = seek_target(x, layout, favorites, engine.duration())?;
        engine.set_current_time(target.time);
        self.knob_ratio = clamp_ratio(target.ratio);
        Some(target)
    }
}

fn resume<E: PlaybackEngine>(engine: &mut E) {
    if let Err(err) = engine.play() {
        tracing::warn!(error = %err, "playback did not resume after scrub");
    }
}

/// Last known playback position per source.
#[derive(Debug, Clone, Default)]
pub struct LastPositionMemo {
    positions: HashMap<String, f64>,
}

impl LastPositionMemo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `time` for `source`. Non-finite times are ignored.
    pub fn record(&mut self, source: &str, time: f64) {
        if !time.is_finite() {
            return;
        }
        match self.positions.get_mut(source) {
            Some(slot) => *slot = time,
            None => {
                self.positions.insert(source.to_owned(), time);
            }
        }
    }

    /// Position to resume `source` at; `0` if it was never played.
    #[must_use]
    pub fn resume_time(&self, source: &str) -> f64 {
        self.positions.get(source).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn get(&self, source: &str) -> Option<f64> {
        self.positions.get(source).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipmark_core::geometry::Span;

    #[derive(Debug, Default)]
    struct FakeEngine {
        time: f64,
        duration: f64,
        paused: bool,
        seeks: Vec<f64>,
    }

    impl FakeEngine {
        fn with_duration(duration: f64) -> Self {
            Self {
                duration,
                ..Self::default()
            }
        }
    }

    impl PlaybackEngine for FakeEngine {
        type Error = String;

        fn play(&mut self) -> Result<(), String> {
            self.paused = false;
            Ok(())
        }
        fn pause(&mut self) {
            self.paused = true;
        }
        fn paused(&self) -> bool {
            self.paused
        }
        fn current_time(&self) -> f64 {
            self.time
        }
        fn set_current_time(&mut self, secs: f64) {
            self.time = secs;
            self.seeks.push(secs);
        }
        fn duration(&self) -> f64 {
            self.duration
        }
        fn set_playback_rate(&mut self, _rate: f64) {}
        fn playback_rate(&self) -> f64 {
            1.0
        }
        fn source(&self) -> Option<&str> {
            None
        }
        fn set_source(&mut self, _source: &str) {}
    }

    // Bar spans x in [100, 500]; markers are 20 wide.
    fn layout() -> Option<TimelineLayout> {
        Some(TimelineLayout::new(Span::new(100.0, 400.0), 20.0))
    }

    #[test]
    fn knob_follows_position() {
        let mut sync = TimelineSync::new();
        assert!(sync.on_position(25.0, 100.0));
        assert_eq!(sync.knob_ratio(), 0.25);
        sync.on_position(5.0, f64::NAN);
        assert_eq!(sync.knob_ratio(), 0.0);
    }

    #[test]
    fn raw_ratio_seek() {
        let target = seek_target(300.0, layout(), &[], 60.0).unwrap();
        assert_eq!(target.ratio, 0.5);
        assert_eq!(target.time, 30.0);
        assert!(!target.snapped);
    }

    #[test]
    fn pointer_outside_bar_clamps() {
        assert_eq!(seek_target(0.0, layout(), &[], 60.0).unwrap().time, 0.0);
        assert_eq!(seek_target(900.0, layout(), &[], 60.0).unwrap().time, 60.0);
    }

    #[test]
    fn pointer_on_marker_snaps_to_exact_time() {
        // 31.0s of 60s sits at x = 306.67; its marker spans [296.67, 316.67].
        let target = seek_target(298.0, layout(), &[10.0, 31.0], 60.0).unwrap();
        assert!(target.snapped);
        assert_eq!(target.time, 31.0);
    }

    #[test]
    fn unknown_duration_never_seeks() {
        assert_eq!(seek_target(300.0, layout(), &[10.0], f64::NAN), None);
        assert_eq!(seek_target(300.0, None, &[], 60.0), None);

        let mut engine = FakeEngine::with_duration(f64::NAN);
        let mut sync = TimelineSync::new();
        assert!(sync.begin_scrub(&mut engine, 300.0, layout(), &[]));
        assert!(engine.seeks.is_empty());
        assert!(engine.paused);
    }

    #[test]
    fn scrub_suspends_autonomous_updates() {
        let mut engine = FakeEngine::with_duration(100.0);
        let mut sync = TimelineSync::new();
        sync.begin_scrub(&mut engine, 200.0, layout(), &[]);
        assert!(engine.paused);
        assert_eq!(sync.knob_ratio(), 0.25);

        assert!(!sync.on_position(90.0, 100.0));
        assert_eq!(sync.knob_ratio(), 0.25);

        let moved = sync.scrub_to(&mut engine, 400.0, layout(), &[]).unwrap();
        assert_eq!(moved.time, 75.0);

        let end = sync.end_scrub(&mut engine, 500.0, layout(), &[]).unwrap();
        assert_eq!(end.time, 100.0);
        assert!(!engine.paused);
        assert!(!sync.is_scrubbing());
        assert_eq!(engine.seeks, vec![25.0, 75.0, 100.0]);
    }

    #[test]
    fn second_writer_is_rejected() {
        let mut engine = FakeEngine::with_duration(100.0);
        let mut sync = TimelineSync::new();
        assert!(sync.begin_scrub(&mut engine, 200.0, layout(), &[]));
        assert!(!sync.begin_scrub(&mut engine, 400.0, layout(), &[]));
        assert_eq!(engine.seeks, vec![25.0]);
    }

    #[test]
    fn end_without_begin_is_harmless() {
        let mut engine = FakeEngine::with_duration(100.0);
        engine.paused = true;
        let mut sync = TimelineSync::new();
        assert_eq!(sync.end_scrub(&mut engine, 300.0, layout(), &[]), None);
        assert!(engine.paused);
        assert!(engine.seeks.is_empty());
    }

    #[test]
    fn cancel_resumes_without_seeking() {
        let mut engine = FakeEngine::with_duration(100.0);
        let mut sync = TimelineSync::new();
        sync.begin_scrub(&mut engine, 200.0, layout(), &[]);
        sync.cancel_scrub(&mut engine);
        assert!(!engine.paused);
        assert!(!sync.is_scrubbing());
        assert_eq!(engine.seeks.len(), 1);
    }

    #[test]
    fn memo_defaults_to_start() {
        let mut memo = LastPositionMemo::new();
        assert_eq!(memo.resume_time("a.mp4"), 0.0);
        memo.record("a.mp4", 42.5);
        memo.record("a.mp4", f64::NAN);
        assert_eq!(memo.resume_time("a.mp4"), 42.5);
        assert_eq!(memo.get("b.mp4"), None);
    }
}
