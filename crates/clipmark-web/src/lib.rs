#![forbid(unsafe_code)]

//! `clipmark-web` provides a host-driven backend for the clipmark player.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding page pushes pointer events, media
//!   notifications and layout measurements.
//! - **Deterministic time**: the host advances a monotonic clock explicitly;
//!   timers and media playback follow that clock only.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! The same pieces double as the simulated environment for end-to-end tests:
//! [`SimulatedMedia`] behaves like an `HTMLMediaElement`, [`MemoryStorage`]
//! like `localStorage`, and [`TimerQueue`] like `setTimeout` /
//! `clearTimeout`.

pub mod harness;

use core::time::Duration;
use std::collections::{BTreeMap, VecDeque};

use clipmark_backend::{
    Backend, BackendClock, KeyValueStore, PlaybackEngine, Presentation, TimelineGeometry,
    TimerScheduler,
};
use clipmark_core::geometry::TimelineLayout;
use clipmark_core::timer::{TimerKind, TimerToken};
use clipmark_player::EngineEvent;

pub use harness::WebPlayer;

/// Web backend error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebBackendError {
    /// `play()` was refused, e.g. by an autoplay policy.
    PlayBlocked,
    /// Storage write exceeded the configured quota.
    QuotaExceeded { key: String, bytes: usize },
}

impl core::fmt::Display for WebBackendError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PlayBlocked => write!(f, "play() blocked by autoplay policy"),
            Self::QuotaExceeded { key, bytes } => {
                write!(f, "quota exceeded writing {bytes} bytes to {key:?}")
            }
        }
    }
}

impl std::error::Error for WebBackendError {}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl BackendClock for DeterministicClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.now.as_millis()).unwrap_or(u64::MAX)
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// In-memory stand-in for a media element.
///
/// Mutations queue the notifications a real element would dispatch; the
/// host drains them with [`drain_events`](Self::drain_events) and forwards
/// them to the session.
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    source: Option<String>,
    current_time: f64,
    duration: f64,
    paused: bool,
    rate: f64,
    autoplay_blocked: bool,
    events: VecDeque<EngineEvent>,
}

impl Default for SimulatedMedia {
    fn default() -> Self {
        Self {
            source: None,
            current_time: 0.0,
            duration: f64::NAN,
            paused: true,
            rate: 1.0,
            autoplay_blocked: false,
            events: VecDeque::new(),
        }
    }
}

impl SimulatedMedia {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata arrived: the duration becomes known.
    pub fn load_metadata(&mut self, duration: f64) {
        self.duration = duration;
        if duration.is_finite() {
            self.current_time = self.current_time.min(duration);
        }
        self.events.push_back(EngineEvent::DurationKnown);
    }

    /// Refuse (or allow) subsequent `play()` calls.
    pub fn set_autoplay_blocked(&mut self, blocked: bool) {
        self.autoplay_blocked = blocked;
    }

    /// Let `dt` of wall time pass. Playing media advances by `dt * rate`
    /// and pauses at the end.
    pub fn advance(&mut self, dt: Duration) {
        if self.paused || !self.duration.is_finite() || dt.is_zero() {
            return;
        }
        let next = self.current_time + dt.as_secs_f64() * self.rate;
        if next >= self.duration {
            self.current_time = self.duration;
            self.paused = true;
            self.events.push_back(EngineEvent::PositionTick);
            self.events.push_back(EngineEvent::PlaybackStopped);
        } else {
            self.current_time = next;
            self.events.push_back(EngineEvent::PositionTick);
        }
    }

    /// Drain queued notifications in dispatch order.
    pub fn drain_events(&mut self) -> impl Iterator<Item = EngineEvent> + '_ {
        self.events.drain(..)
    }
}

impl PlaybackEngine for SimulatedMedia {
    type Error = WebBackendError;

    fn play(&mut self) -> Result<(), Self::Error> {
        if self.autoplay_blocked {
            return Err(WebBackendError::PlayBlocked);
        }
        if self.paused {
            self.paused = false;
            self.events.push_back(EngineEvent::PlaybackStarted);
        }
        Ok(())
    }

    fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.events.push_back(EngineEvent::PlaybackStopped);
        }
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, secs: f64) {
        if !secs.is_finite() {
            return;
        }
        let mut secs = secs.max(0.0);
        if self.duration.is_finite() {
            secs = secs.min(self.duration);
        }
        self.current_time = secs;
        self.events.push_back(EngineEvent::PositionTick);
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn set_source(&mut self, source: &str) {
        self.source = Some(source.to_owned());
        self.current_time = 0.0;
        self.duration = f64::NAN;
        self.paused = true;
        self.events.push_back(EngineEvent::PositionInvalidated);
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// `localStorage`-like string store with an optional per-value quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    max_value_bytes: Option<usize>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes of values longer than `bytes`.
    pub fn set_max_value_bytes(&mut self, bytes: Option<usize>) {
        self.max_value_bytes = bytes;
    }

    /// Insert a raw value, bypassing the quota (seeding tests, corrupt data).
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }

    #[must_use]
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl KeyValueStore for MemoryStorage {
    type Error = WebBackendError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        if let Some(max) = self.max_value_bytes
            && value.len() > max
        {
            return Err(WebBackendError::QuotaExceeded {
                key: key.to_owned(),
                bytes: value.len(),
            });
        }
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

/// One armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTimer {
    pub token: TimerToken,
    pub due_ms: u64,
}

/// `setTimeout` stand-in driven by the host clock.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    now_ms: u64,
    armed: BTreeMap<TimerKind, ScheduledTimer>,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current queue time.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Timer armed for `kind`, if any.
    #[must_use]
    pub fn armed(&self, kind: TimerKind) -> Option<ScheduledTimer> {
        self.armed.get(&kind).copied()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.armed.is_empty()
    }

    /// Earliest armed timer due at or before `deadline_ms`.
    #[must_use]
    pub fn next_due(&self, deadline_ms: u64) -> Option<(TimerKind, ScheduledTimer)> {
        self.armed
            .iter()
            .filter(|(_, t)| t.due_ms <= deadline_ms)
            .min_by_key(|(kind, t)| (t.due_ms, **kind))
            .map(|(kind, t)| (*kind, *t))
    }

    /// Move the queue clock to `due_ms` and disarm the timer of `kind`,
    /// returning its token. Timers fire once.
    pub fn fire(&mut self, kind: TimerKind) -> Option<TimerToken> {
        let timer = self.armed.remove(&kind)?;
        self.now_ms = self.now_ms.max(timer.due_ms);
        Some(timer.token)
    }

    /// Move the queue clock forward without firing anything.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

impl TimerScheduler for TimerQueue {
    fn schedule(&mut self, kind: TimerKind, token: TimerToken, delay: Duration) {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.armed.insert(
            kind,
            ScheduledTimer {
                token,
                due_ms: self.now_ms.saturating_add(delay_ms),
            },
        );
    }

    fn cancel(&mut self, kind: TimerKind) {
        self.armed.remove(&kind);
    }
}

// ---------------------------------------------------------------------------
// Geometry and presentation
// ---------------------------------------------------------------------------

/// Timeline layout as last measured by the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasuredLayout {
    layout: Option<TimelineLayout>,
}

impl MeasuredLayout {
    /// Record a new measurement (`None` while the timeline is not laid out).
    pub fn set(&mut self, layout: Option<TimelineLayout>) {
        self.layout = layout;
    }
}

impl TimelineGeometry for MeasuredLayout {
    fn timeline_layout(&self) -> Option<TimelineLayout> {
        self.layout
    }
}

/// Page visibility and full-screen state.
#[derive(Debug, Clone, Default)]
pub struct WebPresentation {
    visible: bool,
    fullscreen: bool,
    fullscreen_denied: bool,
}

impl WebPresentation {
    /// Make subsequent full-screen requests fail, as a browser does outside
    /// a user gesture.
    pub fn set_fullscreen_denied(&mut self, denied: bool) {
        self.fullscreen_denied = denied;
    }
}

impl Presentation for WebPresentation {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn request_fullscreen(&mut self) {
        if self.fullscreen_denied {
            tracing::debug!("full-screen request denied");
            return;
        }
        self.fullscreen = true;
    }

    fn exit_fullscreen(&mut self) {
        self.fullscreen = false;
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// A minimal, host-driven web backend.
///
/// This backend is intended to be driven by a JS host:
/// - forward media element notifications via [`Self::media_mut`]
/// - advance time via [`Self::clock_mut`] and fire due timers from [`Self::timers`]
/// - report timeline measurements via [`Self::layout_mut`]
#[derive(Debug, Clone, Default)]
pub struct WebBackend {
    clock: DeterministicClock,
    media: SimulatedMedia,
    storage: MemoryStorage,
    timers: TimerQueue,
    layout: MeasuredLayout,
    presentation: WebPresentation,
}

impl WebBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with a measured timeline.
    #[must_use]
    pub fn with_layout(layout: TimelineLayout) -> Self {
        let mut backend = Self::default();
        backend.layout.set(Some(layout));
        backend
    }

    #[must_use]
    pub fn clock(&self) -> &DeterministicClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut DeterministicClock {
        &mut self.clock
    }

    #[must_use]
    pub fn media(&self) -> &SimulatedMedia {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut SimulatedMedia {
        &mut self.media
    }

    #[must_use]
    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn layout_mut(&mut self) -> &mut MeasuredLayout {
        &mut self.layout
    }

    pub fn presentation_state_mut(&mut self) -> &mut WebPresentation {
        &mut self.presentation
    }
}

impl Backend for WebBackend {
    type Engine = SimulatedMedia;
    type Storage = MemoryStorage;
    type Timers = TimerQueue;
    type Geometry = MeasuredLayout;
    type Presentation = WebPresentation;

    fn engine(&self) -> &Self::Engine {
        &self.media
    }

    fn engine_mut(&mut self) -> &mut Self::Engine {
        &mut self.media
    }

    fn storage(&self) -> &Self::Storage {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut Self::Storage {
        &mut self.storage
    }

    fn engine_and_storage_mut(&mut self) -> (&mut Self::Engine, &mut Self::Storage) {
        (&mut self.media, &mut self.storage)
    }

    fn timers_mut(&mut self) -> &mut Self::Timers {
        &mut self.timers
    }

    fn geometry(&self) -> &Self::Geometry {
        &self.layout
    }

    fn presentation(&self) -> &Self::Presentation {
        &self.presentation
    }

    fn presentation_mut(&mut self) -> &mut Self::Presentation {
        &mut self.presentation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn deterministic_clock_advances_monotonically() {
        let mut c = DeterministicClock::new();
        assert_eq!(c.now_ms(), 0);

        c.advance(Duration::from_millis(10));
        c.advance(Duration::from_millis(5));
        assert_eq!(c.now_ms(), 15);

        // Saturation: don't panic or wrap.
        c.set(Duration::MAX);
        c.advance(Duration::from_secs(1));
        assert_eq!(c.now_ms(), u64::MAX);
    }

    #[test]
    fn media_reports_like_an_element() {
        let mut m = SimulatedMedia::new();
        m.set_source("a.mp4");
        assert!(m.duration().is_nan());
        m.play().unwrap();
        m.advance(Duration::from_secs(1));
        assert_eq!(m.current_time(), 0.0, "no progress before metadata");

        m.load_metadata(10.0);
        m.advance(Duration::from_secs(2));
        assert_eq!(m.current_time(), 2.0);
        m.set_playback_rate(0.5);
        m.advance(Duration::from_secs(2));
        assert_eq!(m.current_time(), 3.0);

        let events: Vec<_> = m.drain_events().collect();
        assert_eq!(
            events,
            vec![
                EngineEvent::PositionInvalidated,
                EngineEvent::PlaybackStarted,
                EngineEvent::DurationKnown,
                EngineEvent::PositionTick,
                EngineEvent::PositionTick,
            ]
        );
    }

    #[test]
    fn media_stops_at_end() {
        let mut m = SimulatedMedia::new();
        m.set_source("a.mp4");
        m.load_metadata(3.0);
        m.play().unwrap();
        m.advance(Duration::from_secs(5));
        assert_eq!(m.current_time(), 3.0);
        assert!(m.paused());
        assert_eq!(m.drain_events().last(), Some(EngineEvent::PlaybackStopped));
    }

    #[test]
    fn seeks_clamp_to_media() {
        let mut m = SimulatedMedia::new();
        m.load_metadata(10.0);
        m.set_current_time(25.0);
        assert_eq!(m.current_time(), 10.0);
        m.set_current_time(-1.0);
        assert_eq!(m.current_time(), 0.0);
        m.set_current_time(f64::NAN);
        assert_eq!(m.current_time(), 0.0);
    }

    #[test]
    fn blocked_play_is_an_error() {
        let mut m = SimulatedMedia::new();
        m.set_autoplay_blocked(true);
        assert_eq!(m.play(), Err(WebBackendError::PlayBlocked));
        assert!(m.paused());
    }

    #[test]
    fn storage_quota() {
        let mut s = MemoryStorage::new();
        s.set_max_value_bytes(Some(4));
        assert!(s.set("k", "1234").is_ok());
        assert!(matches!(
            s.set("k", "12345"),
            Err(WebBackendError::QuotaExceeded { bytes: 5, .. })
        ));
        assert_eq!(s.get("k").unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn timer_queue_orders_and_replaces() {
        let mut q = TimerQueue::new();
        q.schedule(TimerKind::SlowPress, TimerToken::new(1), Duration::from_millis(500));
        q.schedule(TimerKind::DoubleTapWait, TimerToken::new(2), Duration::from_millis(250));
        assert_eq!(q.next_due(200), None);
        let (kind, timer) = q.next_due(1_000).unwrap();
        assert_eq!(kind, TimerKind::DoubleTapWait);
        assert_eq!(timer.due_ms, 250);

        q.schedule(TimerKind::DoubleTapWait, TimerToken::new(3), Duration::from_millis(900));
        assert_eq!(q.next_due(1_000).unwrap().0, TimerKind::SlowPress);
        assert_eq!(q.fire(TimerKind::SlowPress), Some(TimerToken::new(1)));
        assert_eq!(q.now_ms(), 500);
        assert_eq!(q.fire(TimerKind::SlowPress), None);

        q.cancel(TimerKind::DoubleTapWait);
        assert!(q.is_idle());
    }

    #[test]
    fn fullscreen_can_be_denied() {
        let mut p = WebPresentation::default();
        p.set_fullscreen_denied(true);
        p.request_fullscreen();
        assert!(!p.is_fullscreen());
        p.set_fullscreen_denied(false);
        p.request_fullscreen();
        assert!(p.is_fullscreen());
    }
}
