#![forbid(unsafe_code)]

//! Host-side driver for a [`PlayerSession`] over a [`WebBackend`].
//!
//! [`WebPlayer`] plays the role of the page script: it stamps pointer
//! samples with the deterministic clock, forwards media notifications, and
//! fires due timers in due order while time advances.
//!
//! # Time stepping
//!
//! [`advance`](WebPlayer::advance) moves the clock to the target instant in
//! segments. Each armed timer due inside the step splits it: media advances
//! to the timer's due time, pending media notifications are delivered, then
//! the timer fires. A timer scheduled by a fire is considered in the same
//! step if it falls due before the target.

use core::time::Duration;

use clipmark_backend::{Backend, BackendClock};
use clipmark_core::pointer::{CaptureCommand, PointerSample};
use clipmark_player::{PlayerConfig, PlayerError, PlayerSession};

use crate::WebBackend;

/// A player session plus the host loop around it.
#[derive(Debug)]
pub struct WebPlayer {
    session: PlayerSession<WebBackend>,
    captures: Vec<CaptureCommand>,
}

impl WebPlayer {
    /// Wrap `backend` in a session with the stock configuration.
    #[must_use]
    pub fn new(backend: WebBackend) -> Self {
        Self {
            session: PlayerSession::new(backend),
            captures: Vec::new(),
        }
    }

    pub fn with_config(backend: WebBackend, config: PlayerConfig) -> Result<Self, PlayerError> {
        Ok(Self {
            session: PlayerSession::with_config(backend, config)?,
            captures: Vec::new(),
        })
    }

    #[must_use]
    pub fn session(&self) -> &PlayerSession<WebBackend> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PlayerSession<WebBackend> {
        &mut self.session
    }

    #[must_use]
    pub fn backend(&self) -> &WebBackend {
        self.session.backend()
    }

    pub fn backend_mut(&mut self) -> &mut WebBackend {
        self.session.backend_mut()
    }

    /// Current host time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.backend().clock().now_ms()
    }

    /// Pointer-capture commands issued so far, in order.
    #[must_use]
    pub fn captures(&self) -> &[CaptureCommand] {
        &self.captures
    }

    /// Open `source` and deliver the resulting media notifications.
    pub fn open(&mut self, source: &str) -> Result<(), PlayerError> {
        self.session.open(source)?;
        self.pump_media();
        Ok(())
    }

    pub fn close(&mut self) {
        self.session.close();
        self.pump_media();
    }

    /// Media metadata arrived.
    pub fn load_metadata(&mut self, duration_secs: f64) {
        self.backend_mut().media_mut().load_metadata(duration_secs);
        self.pump_media();
    }

    /// Deliver queued media notifications to the session.
    pub fn pump_media(&mut self) {
        let events: Vec<_> = self.backend_mut().media_mut().drain_events().collect();
        for event in events {
            self.session.on_engine_event(event);
        }
    }

    /// Advance host time by `dt`, firing due timers and playing media.
    pub fn advance(&mut self, dt: Duration) {
        let start = self.now_ms();
        let target = start.saturating_add(u64::try_from(dt.as_millis()).unwrap_or(u64::MAX));
        let mut now = start;

        while let Some((kind, timer)) = self.backend().timers().next_due(target) {
            let due = timer.due_ms.max(now);
            self.step_media(due - now);
            now = due;
            let fired = self.backend_mut().timers_mut().fire(kind);
            if let Some(token) = fired {
                self.session.on_timer(kind, token);
            }
            self.pump_media();
        }

        self.step_media(target - now);
    }

    fn step_media(&mut self, ms: u64) {
        if ms == 0 {
            return;
        }
        let dt = Duration::from_millis(ms);
        let backend = self.backend_mut();
        backend.clock_mut().advance(dt);
        let now = backend.clock().now_ms();
        backend.timers_mut().set_now(now);
        backend.media_mut().advance(dt);
        self.pump_media();
    }

    fn sample(&self, x: f64, y: f64) -> PointerSample {
        PointerSample::new(x, y, self.now_ms())
    }

    fn record(&mut self, capture: Option<CaptureCommand>) {
        self.captures.extend(capture);
        self.pump_media();
    }

    // -- video surface ------------------------------------------------------

    pub fn video_down(&mut self, pointer_id: u32, x: f64, y: f64) {
        let sample = self.sample(x, y);
        let capture = self.session.on_video_pointer_down(pointer_id, sample);
        self.record(capture);
    }

    pub fn video_move(&mut self, pointer_id: u32, x: f64, y: f64) {
        let sample = self.sample(x, y);
        self.session.on_video_pointer_move(pointer_id, sample);
    }

    pub fn video_up(&mut self, pointer_id: u32, x: f64, y: f64) {
        let sample = self.sample(x, y);
        let capture = self.session.on_video_pointer_up(pointer_id, sample);
        self.record(capture);
    }

    pub fn video_cancel(&mut self, pointer_id: u32) {
        let now = self.now_ms();
        let capture = self.session.on_video_pointer_cancel(pointer_id, now);
        self.record(capture);
    }

    // -- timeline -----------------------------------------------------------

    pub fn timeline_down(&mut self, pointer_id: u32, x: f64) {
        let sample = self.sample(x, 0.0);
        let capture = self.session.on_timeline_pointer_down(pointer_id, sample);
        self.record(capture);
    }

    pub fn timeline_move(&mut self, pointer_id: u32, x: f64) {
        let sample = self.sample(x, 0.0);
        self.session.on_timeline_pointer_move(pointer_id, sample);
        self.pump_media();
    }

    pub fn timeline_up(&mut self, pointer_id: u32, x: f64) {
        let sample = self.sample(x, 0.0);
        let capture = self.session.on_timeline_pointer_up(pointer_id, sample);
        self.record(capture);
    }

    // -- gesture shorthands -------------------------------------------------

    /// Press and release at `(x, y)` after `held`.
    pub fn press(&mut self, x: f64, y: f64, held: Duration) {
        self.video_down(1, x, y);
        self.advance(held);
        self.video_up(1, x, y);
    }

    /// Drag from `from` to `to` over `duration` with a few intermediate moves.
    pub fn drag(&mut self, from: (f64, f64), to: (f64, f64), duration: Duration) {
        const STEPS: u32 = 4;
        self.video_down(1, from.0, from.1);
        for i in 1..=STEPS {
            self.advance(duration / STEPS);
            let f = f64::from(i) / f64::from(STEPS);
            self.video_move(1, from.0 + (to.0 - from.0) * f, from.1 + (to.1 - from.1) * f);
        }
        self.video_up(1, to.0, to.1);
    }
}
