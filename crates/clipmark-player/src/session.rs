#![forbid(unsafe_code)]

//! The player session: one object owning all player state.
//!
//! [`PlayerSession`] is constructed once per embedded player and receives
//! every host signal through a method call. Handlers run to completion and
//! never re-enter each other, so no state is shared behind locks.
//!
//! # Input paths
//!
//! - **Video surface**: pointer lifecycle → [`PointerTracker`] →
//!   [`GestureRecognizer`] → [`PlaybackController`].
//! - **Timeline**: pointer lifecycle → [`PointerTracker`] → [`TimelineSync`]
//!   scrub session.
//! - **Engine**: position / duration / play-state events → [`TimelineSync`]
//!   autonomous updates and the [`LastPositionMemo`].
//! - **Timers**: fires scheduled through the backend → recognizer.
//! - **Access**: decryption results → [`AccessGate`] → [`open`](PlayerSession::open).
//!
//! The scrub flag is the only state the timeline and engine paths share.

use clipmark_backend::{Backend, PlaybackEngine, Presentation, TimelineGeometry, TimerScheduler};
use clipmark_core::geometry::playback_ratio;
use clipmark_core::gesture::{Gesture, GestureOutput, GestureRecognizer, GestureState};
use clipmark_core::pointer::{CaptureCommand, PointerSample, PointerTracker};
use clipmark_core::timer::{TimerKind, TimerToken};

use crate::access::{AccessGate, AccessPrompt, DecryptError, DecryptRequest, DecryptTicket, ProtectedSource};
use crate::config::PlayerConfig;
use crate::controller::{CommandTarget, Feedback, PlaybackController};
use crate::error::PlayerError;
use crate::favorites::{AddOutcome, FavoriteStore};
use crate::timeline::{LastPositionMemo, TimelineSync};

/// Notifications from the playback engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Playback position advanced (`timeupdate`).
    PositionTick,
    /// Duration became known or changed (`durationchange`).
    DurationKnown,
    /// Playback started (`play`).
    PlaybackStarted,
    /// Playback paused or stopped (`pause`).
    PlaybackStopped,
    /// Position no longer meaningful, e.g. the source changed (`emptied`).
    PositionInvalidated,
}

/// On-screen buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Play,
    Pause,
    AddFavorite,
    Close,
    Help,
    HelpClose,
}

/// Which of the play / pause buttons is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayButton {
    Play,
    Pause,
}

/// One rendered favorite marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerView {
    pub time_secs: f64,
    pub ratio: f64,
}

/// Snapshot of everything the host renders.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub visible: bool,
    pub fullscreen: bool,
    pub knob_ratio: f64,
    /// Empty while the duration is unknown.
    pub markers: Vec<MarkerView>,
    pub play_button: PlayButton,
    pub playback_rate: f64,
    pub scrubbing: bool,
    pub help_visible: bool,
    pub feedback: Option<Feedback>,
    pub access_prompt: Option<AccessPrompt>,
}

/// State of one embedded player.
pub struct PlayerSession<B: Backend> {
    backend: B,
    config: PlayerConfig,
    gestures: GestureRecognizer,
    video_pointer: PointerTracker,
    timeline_pointer: PointerTracker,
    timeline: TimelineSync,
    favorites: FavoriteStore,
    memo: LastPositionMemo,
    access: AccessGate,
    controller: PlaybackController,
    source: Option<String>,
    paused: bool,
    help_visible: bool,
    feedback: Option<Feedback>,
}

impl<B: Backend> std::fmt::Debug for PlayerSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSession")
            .field("source", &self.source)
            .field("gesture_state", &self.gestures.state())
            .field("scrubbing", &self.timeline.is_scrubbing())
            .field("favorites", &self.favorites.times())
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> PlayerSession<B> {
    /// Create a session with the stock configuration.
    pub fn new(backend: B) -> Self {
        Self::build(backend, PlayerConfig::default())
    }

    /// Create a session with a custom configuration.
    pub fn with_config(backend: B, config: PlayerConfig) -> Result<Self, PlayerError> {
        Ok(Self::build(backend, config.validated()?))
    }

    fn build(backend: B, config: PlayerConfig) -> Self {
        Self {
            gestures: GestureRecognizer::new(config.gesture.clone()),
            video_pointer: PointerTracker::new(),
            timeline_pointer: PointerTracker::new(),
            timeline: TimelineSync::new(),
            favorites: FavoriteStore::new(config.favorites.clone()),
            memo: LastPositionMemo::new(),
            access: AccessGate::new(config.access.clone()),
            controller: PlaybackController::new(config.playback.clone()),
            source: None,
            paused: true,
            help_visible: false,
            feedback: None,
            backend,
            config,
        }
    }

    // -- accessors ----------------------------------------------------------

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[must_use]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Currently open source.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn gesture_state(&self) -> GestureState {
        self.gestures.state()
    }

    /// Favorites of the open source, in insertion order.
    #[must_use]
    pub fn favorites(&self) -> &[f64] {
        self.favorites.times()
    }

    #[must_use]
    pub fn is_scrubbing(&self) -> bool {
        self.timeline.is_scrubbing()
    }

    /// Last recorded position for `source`.
    #[must_use]
    pub fn last_position(&self, source: &str) -> Option<f64> {
        self.memo.get(source)
    }

    // -- lifecycle ----------------------------------------------------------

    /// Show the player and start `source_id` where it was last left.
    pub fn open(&mut self, source_id: &str) -> Result<(), PlayerError> {
        if source_id.is_empty() {
            return Err(PlayerError::EmptySourceId);
        }
        let span = tracing::info_span!("player.open", source = source_id);
        let _guard = span.enter();

        self.cancel_gesture();
        self.video_pointer.release();
        self.timeline_pointer.release();
        self.timeline.release();
        self.help_visible = false;
        self.feedback = None;
        self.backend.presentation_mut().set_visible(true);

        let resume_at = self.memo.resume_time(source_id);
        let engine = self.backend.engine_mut();
        engine.set_source(source_id);
        engine.set_current_time(resume_at);
        if let Err(err) = engine.play() {
            tracing::warn!(error = %err, "autoplay rejected");
        }
        self.source = Some(source_id.to_owned());

        let loaded = self.favorites.load(source_id, self.backend.storage());
        self.sync_knob();
        self.backend.presentation_mut().request_fullscreen();
        tracing::info!(resume_at, favorites = loaded, "source opened");
        Ok(())
    }

    /// Pause, hide the player, and leave full-screen.
    pub fn close(&mut self) {
        let span = tracing::info_span!("player.close", source = ?self.source);
        let _guard = span.enter();

        if let Some(source) = self.source.as_deref() {
            self.memo.record(source, self.backend.engine().current_time());
        }
        self.cancel_gesture();
        self.video_pointer.release();
        self.timeline_pointer.release();
        self.timeline.release();

        self.backend.engine_mut().pause();
        let presentation = self.backend.presentation_mut();
        presentation.set_visible(false);
        if presentation.is_fullscreen() {
            presentation.exit_fullscreen();
        }
        self.help_visible = false;
        self.feedback = None;
        tracing::info!("player closed");
    }

    // -- video surface ------------------------------------------------------

    pub fn on_video_pointer_down(
        &mut self,
        pointer_id: u32,
        sample: PointerSample,
    ) -> Option<CaptureCommand> {
        let dispatch = self.video_pointer.down(pointer_id, sample);
        let sample = dispatch.sample?;
        let out = self.gestures.on_pointer_down(sample);
        self.handle_gesture_output(out);
        dispatch.capture_command
    }

    pub fn on_video_pointer_move(&mut self, pointer_id: u32, sample: PointerSample) {
        if let Some(sample) = self.video_pointer.moved(pointer_id, sample).sample {
            self.gestures.on_pointer_move(sample);
        }
    }

    pub fn on_video_pointer_up(
        &mut self,
        pointer_id: u32,
        sample: PointerSample,
    ) -> Option<CaptureCommand> {
        let dispatch = self.video_pointer.up(pointer_id, sample);
        let sample = dispatch.sample?;
        let out = self.gestures.on_pointer_up(sample);
        self.handle_gesture_output(out);
        dispatch.capture_command
    }

    pub fn on_video_pointer_cancel(&mut self, pointer_id: u32, t_ms: u64) -> Option<CaptureCommand> {
        let dispatch = self.video_pointer.cancel(pointer_id, t_ms);
        dispatch.sample?;
        self.cancel_gesture();
        dispatch.capture_command
    }

    /// Report a fire of a timer scheduled through the backend.
    pub fn on_timer(&mut self, kind: TimerKind, token: TimerToken) {
        let out = self.gestures.on_timer(kind, token);
        self.handle_gesture_output(out);
    }

    /// Whether the host should suppress a context menu on the video.
    #[must_use]
    pub fn on_context_menu(&self) -> bool {
        self.gestures.suppresses_context_menu()
    }

    // -- timeline -----------------------------------------------------------

    pub fn on_timeline_pointer_down(
        &mut self,
        pointer_id: u32,
        sample: PointerSample,
    ) -> Option<CaptureCommand> {
        if self.timeline.is_scrubbing() {
            return None;
        }
        let dispatch = self.timeline_pointer.down(pointer_id, sample);
        let sample = dispatch.sample?;
        let layout = self.backend.geometry().timeline_layout();
        self.timeline.begin_scrub(
            self.backend.engine_mut(),
            sample.x,
            layout,
            self.favorites.times(),
        );
        dispatch.capture_command
    }

    pub fn on_timeline_pointer_move(&mut self, pointer_id: u32, sample: PointerSample) {
        let Some(sample) = self.timeline_pointer.moved(pointer_id, sample).sample else {
            return;
        };
        let layout = self.backend.geometry().timeline_layout();
        self.timeline.scrub_to(
            self.backend.engine_mut(),
            sample.x,
            layout,
            self.favorites.times(),
        );
    }

    /// End the scrub. The session is released whatever pointer reports the up.
    pub fn on_timeline_pointer_up(
        &mut self,
        pointer_id: u32,
        sample: PointerSample,
    ) -> Option<CaptureCommand> {
        let dispatch = self.timeline_pointer.up(pointer_id, sample);
        let capture = dispatch
            .capture_command
            .or_else(|| self.timeline_pointer.release());
        let layout = self.backend.geometry().timeline_layout();
        self.timeline.end_scrub(
            self.backend.engine_mut(),
            sample.x,
            layout,
            self.favorites.times(),
        );
        capture
    }

    pub fn on_timeline_pointer_cancel(&mut self, pointer_id: u32, t_ms: u64) -> Option<CaptureCommand> {
        let dispatch = self.timeline_pointer.cancel(pointer_id, t_ms);
        let capture = dispatch
            .capture_command
            .or_else(|| self.timeline_pointer.release());
        self.timeline.cancel_scrub(self.backend.engine_mut());
        capture
    }

    // -- engine -------------------------------------------------------------

    pub fn on_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::PositionTick
            | EngineEvent::DurationKnown
            | EngineEvent::PositionInvalidated => self.sync_knob(),
            EngineEvent::PlaybackStarted => self.paused = false,
            EngineEvent::PlaybackStopped => self.paused = true,
        }
    }

    // -- controls -----------------------------------------------------------

    pub fn press(&mut self, control: Control) -> Result<(), PlayerError> {
        tracing::debug!(?control, "control pressed");
        match control {
            Control::Play => self
                .backend
                .engine_mut()
                .play()
                .map_err(|e| PlayerError::Playback(e.to_string()))?,
            Control::Pause => self.backend.engine_mut().pause(),
            Control::AddFavorite => {
                self.add_favorite();
            }
            Control::Close => self.close(),
            Control::Help => {
                self.backend.engine_mut().pause();
                self.help_visible = true;
            }
            Control::HelpClose => self.help_visible = false,
        }
        Ok(())
    }

    /// Add a favorite at the current time (add-favorite button).
    pub fn add_favorite(&mut self) -> AddOutcome {
        let layout = self.backend.geometry().timeline_layout();
        let (engine, storage) = self.backend.engine_and_storage_mut();
        PlaybackController::add_favorite(CommandTarget {
            engine,
            storage,
            favorites: &mut self.favorites,
            layout,
        })
    }

    /// Feedback of the last applied gesture, cleared on read.
    pub fn take_feedback(&mut self) -> Option<Feedback> {
        self.feedback.take()
    }

    // -- access -------------------------------------------------------------

    /// Begin opening a restricted source.
    ///
    /// Returns the decryption work order when a remembered password exists;
    /// otherwise the view carries a password prompt.
    pub fn open_protected(&mut self, source: ProtectedSource) -> Option<DecryptRequest> {
        self.access.request(source, self.backend.storage())
    }

    pub fn submit_password(&mut self, password: &str) -> Option<DecryptRequest> {
        self.access.submit_password(password)
    }

    pub fn cancel_access_prompt(&mut self) {
        self.access.cancel_prompt();
    }

    /// Deliver the decryption service's answer.
    ///
    /// Returns `Ok(true)` if the source was unlocked and opened. A wrong code
    /// is not an error: the view shows [`AccessPrompt::IncorrectCode`].
    pub fn on_decrypt_result(
        &mut self,
        ticket: DecryptTicket,
        result: Result<String, DecryptError>,
    ) -> Result<bool, PlayerError> {
        match self
            .access
            .on_decrypt_result(ticket, result, self.backend.storage_mut())
        {
            Some(url) => self.open(&url).map(|()| true),
            None => Ok(false),
        }
    }

    // -- view ---------------------------------------------------------------

    #[must_use]
    pub fn view(&self) -> PlayerView {
        let engine = self.backend.engine();
        let duration = engine.duration();
        let markers = self
            .favorites
            .times()
            .iter()
            .filter_map(|&time_secs| {
                playback_ratio(time_secs, duration).map(|ratio| MarkerView { time_secs, ratio })
            })
            .collect();
        let presentation = self.backend.presentation();
        PlayerView {
            visible: presentation.is_visible(),
            fullscreen: presentation.is_fullscreen(),
            knob_ratio: self.timeline.knob_ratio(),
            markers,
            play_button: if self.paused {
                PlayButton::Play
            } else {
                PlayButton::Pause
            },
            playback_rate: engine.playback_rate(),
            scrubbing: self.timeline.is_scrubbing(),
            help_visible: self.help_visible,
            feedback: self.feedback,
            access_prompt: self.access.prompt().cloned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

impl<B: Backend> PlayerSession<B> {
    fn handle_gesture_output(&mut self, out: GestureOutput) {
        self.backend.timers_mut().apply(&out.timers);
        if let Some(gesture) = out.gesture {
            // The scrub owns position and pause state until pointer-up.
            if self.timeline.is_scrubbing() && moves_playhead(gesture) {
                tracing::debug!(gesture = gesture.as_str(), "gesture dropped during scrub");
                return;
            }
            let layout = self.backend.geometry().timeline_layout();
            let (engine, storage) = self.backend.engine_and_storage_mut();
            let feedback = self.controller.apply(
                gesture,
                CommandTarget {
                    engine,
                    storage,
                    favorites: &mut self.favorites,
                    layout,
                },
            );
            if feedback.is_some() {
                self.feedback = feedback;
            }
        }
    }

    /// End the gesture lifecycle, cancelling its timers. A held long press
    /// still restores the normal rate.
    fn cancel_gesture(&mut self) {
        let out = self.gestures.cancel();
        self.handle_gesture_output(out);
    }

    fn sync_knob(&mut self) {
        let engine = self.backend.engine();
        let (time, duration) = (engine.current_time(), engine.duration());
        if self.timeline.on_position(time, duration)
            && duration.is_finite()
            && let Some(source) = self.source.as_deref()
        {
            self.memo.record(source, time);
        }
    }
}

/// Gestures that seek, pause, or resume; a long press only changes the rate.
const fn moves_playhead(gesture: Gesture) -> bool {
    !matches!(gesture, Gesture::LongPressStart | Gesture::LongPressEnd)
}
