#![forbid(unsafe_code)]

//! Gesture → playback command translation.
//!
//! | Gesture          | Command                                   | Feedback      |
//! |------------------|-------------------------------------------|---------------|
//! | `Tap`            | toggle play / pause                       | play / pause  |
//! | `DoubleTap`      | add favorite at the current time, save    | add favorite  |
//! | `SwipeLeft`      | jump to the previous favorite             | swipe left    |
//! | `SwipeRight`     | jump to the next favorite                 | swipe right   |
//! | `LongPressStart` | slow playback                             | long press    |
//! | `LongPressEnd`   | normal playback                           | none          |
//!
//! Every command is skipped while the current time is not finite.

use clipmark_backend::{KeyValueStore, PlaybackEngine};
use clipmark_core::geometry::TimelineLayout;
use clipmark_core::gesture::Gesture;

use crate::config::PlaybackConfig;
use crate::favorites::{AddOutcome, Direction, FavoriteStore};

/// Transient overlay the host shows after an applied gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feedback {
    Play,
    Pause,
    AddFavorite,
    SwipeLeft,
    SwipeRight,
    LongPress,
}

impl Feedback {
    /// Icon stem for the overlay image (`<asset_name>.svg`).
    #[must_use]
    pub const fn asset_name(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::AddFavorite => "add_favorite",
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
            Self::LongPress => "long_press",
        }
    }
}

/// Collaborators a command may touch.
pub struct CommandTarget<'a, E, S> {
    pub engine: &'a mut E,
    pub storage: &'a mut S,
    pub favorites: &'a mut FavoriteStore,
    /// Current timeline layout, for the favorite collapse window.
    pub layout: Option<TimelineLayout>,
}

/// Applies recognized gestures to the playback engine and favorites.
#[derive(Debug, Clone, Default)]
pub struct PlaybackController {
    config: PlaybackConfig,
}

impl PlaybackController {
    #[must_use]
    pub fn new(config: PlaybackConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Apply `gesture`. Returns the feedback to show, if the command ran.
    pub fn apply<E, S>(&self, gesture: Gesture, target: CommandTarget<'_, E, S>) -> Option<Feedback>
    where
        E: PlaybackEngine,
        S: KeyValueStore,
    {
        let current = target.engine.current_time();
        if !current.is_finite() {
            tracing::trace!(gesture = gesture.as_str(), "position unknown, gesture skipped");
            return None;
        }

        let feedback = match gesture {
            Gesture::Tap => Some(toggle(target.engine)),
            Gesture::DoubleTap => {
                Self::add_favorite(target);
                Some(Feedback::AddFavorite)
            }
            Gesture::SwipeLeft | Gesture::SwipeRight => {
                let (direction, feedback) = if gesture == Gesture::SwipeRight {
                    (Direction::Forward, Feedback::SwipeRight)
                } else {
                    (Direction::Backward, Feedback::SwipeLeft)
                };
                let destination = target.favorites.navigate(direction, current)?;
                target.engine.set_current_time(destination);
                tracing::debug!(from = current, to = destination, ?direction, "favorite jump");
                Some(feedback)
            }
            Gesture::LongPressStart => {
                target.engine.set_playback_rate(self.config.slow_rate);
                Some(Feedback::LongPress)
            }
            Gesture::LongPressEnd => {
                target.engine.set_playback_rate(self.config.normal_rate);
                None
            }
        };
        tracing::debug!(gesture = gesture.as_str(), ?feedback, "gesture applied");
        feedback
    }

    /// Add a favorite at the current time and persist the list.
    ///
    /// Shared by the double-tap gesture and the add-favorite button.
    pub fn add_favorite<E, S>(target: CommandTarget<'_, E, S>) -> AddOutcome
    where
        E: PlaybackEngine,
        S: KeyValueStore,
    {
        let current = target.engine.current_time();
        if !current.is_finite() {
            return AddOutcome::Rejected;
        }
        let window = target
            .favorites
            .collapse_window(target.layout, target.engine.duration());
        let outcome = target.favorites.add(current, window);
        if outcome != AddOutcome::Rejected
            && let Err(err) = target.favorites.save(target.storage)
        {
            tracing::warn!(error = %err, "favorites not saved");
        }
        outcome
    }
}

fn toggle<E: PlaybackEngine>(engine: &mut E) -> Feedback {
    if engine.paused() {
        if let Err(err) = engine.play() {
            tracing::warn!(error = %err, "play rejected");
        }
        Feedback::Play
    } else {
        engine.pause();
        Feedback::Pause
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FavoritesConfig;
    use clipmark_core::geometry::Span;
    use std::collections::HashMap;

    #[derive(Debug)]
    struct FakeEngine {
        time: f64,
        duration: f64,
        paused: bool,
        rate: f64,
    }

    impl Default for FakeEngine {
        fn default() -> Self {
            Self {
                time: 10.0,
                duration: 100.0,
                paused: false,
                rate: 1.0,
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
            Some("a.mp4")
        }
        fn set_source(&mut self, _source: &str) {}
    }

    #[derive(Default)]
    struct MemoryStore(HashMap<String, String>);

    impl KeyValueStore for MemoryStore {
        type Error = String;

        fn get(&self, key: &str) -> Result<Option<String>, String> {
            Ok(self.0.get(key).cloned())
        }
        fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
            self.0.insert(key.to_owned(), value.to_owned());
            Ok(())
        }
    }

    struct Fixture {
        engine: FakeEngine,
        storage: MemoryStore,
        favorites: FavoriteStore,
        controller: PlaybackController,
    }

    impl Fixture {
        fn new() -> Self {
            let storage = MemoryStore::default();
            let mut favorites = FavoriteStore::new(FavoritesConfig::default());
            favorites.load("a.mp4", &storage);
            Self {
                engine: FakeEngine::default(),
                storage,
                favorites,
                controller: PlaybackController::default(),
            }
        }

        fn apply(&mut self, gesture: Gesture) -> Option<Feedback> {
            self.controller.apply(
                gesture,
                CommandTarget {
                    engine: &mut self.engine,
                    storage: &mut self.storage,
                    favorites: &mut self.favorites,
                    layout: Some(TimelineLayout::new(Span::new(0.0, 400.0), 20.0)),
                },
            )
        }
    }

    #[test]
    fn tap_toggles_playback() {
        let mut fx = Fixture::new();
        assert_eq!(fx.apply(Gesture::Tap), Some(Feedback::Pause));
        assert!(fx.engine.paused);
        assert_eq!(fx.apply(Gesture::Tap), Some(Feedback::Play));
        assert!(!fx.engine.paused);
    }

    #[test]
    fn double_tap_adds_and_persists() {
        let mut fx = Fixture::new();
        assert_eq!(fx.apply(Gesture::DoubleTap), Some(Feedback::AddFavorite));
        assert_eq!(fx.favorites.times(), &[10.0]);
        assert_eq!(fx.storage.0["favorites:a.mp4"], "[10.0]");

        // Window is 20 / 400 * 100 = 5s; 12s collapses with 10s.
        fx.engine.time = 12.0;
        assert_eq!(fx.apply(Gesture::DoubleTap), Some(Feedback::AddFavorite));
        assert!(fx.favorites.is_empty());
        assert_eq!(fx.storage.0["favorites:a.mp4"], "[]");
    }

    #[test]
    fn swipes_seek_between_favorites() {
        let mut fx = Fixture::new();
        for t in [2.0, 30.0, 60.0] {
            fx.favorites.add(t, 1.0);
        }
        fx.engine.time = 20.0;
        assert_eq!(fx.apply(Gesture::SwipeRight), Some(Feedback::SwipeRight));
        assert_eq!(fx.engine.time, 30.0);
        assert_eq!(fx.apply(Gesture::SwipeLeft), Some(Feedback::SwipeLeft));
        assert_eq!(fx.engine.time, 2.0);
    }

    #[test]
    fn swipe_right_without_candidate_does_nothing() {
        let mut fx = Fixture::new();
        assert_eq!(fx.apply(Gesture::SwipeRight), None);
        assert_eq!(fx.engine.time, 10.0);
    }

    #[test]
    fn long_press_changes_rate() {
        let mut fx = Fixture::new();
        assert_eq!(fx.apply(Gesture::LongPressStart), Some(Feedback::LongPress));
        assert_eq!(fx.engine.rate, 0.5);
        assert_eq!(fx.apply(Gesture::LongPressEnd), None);
        assert_eq!(fx.engine.rate, 1.0);
    }

    #[test]
    fn unknown_position_skips_every_command() {
        let mut fx = Fixture::new();
        fx.engine.time = f64::NAN;
        for gesture in [
            Gesture::Tap,
            Gesture::DoubleTap,
            Gesture::SwipeLeft,
            Gesture::SwipeRight,
            Gesture::LongPressStart,
        ] {
            assert_eq!(fx.apply(gesture), None);
        }
        assert!(!fx.engine.paused);
        assert_eq!(fx.engine.rate, 1.0);
        assert!(fx.favorites.is_empty());
        assert!(fx.storage.0.is_empty());
    }

    #[test]
    fn asset_names_are_stable() {
        assert_eq!(Feedback::AddFavorite.asset_name(), "add_favorite");
        assert_eq!(Feedback::SwipeLeft.asset_name(), "swipe_left");
    }
}
