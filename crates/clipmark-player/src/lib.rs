#![forbid(unsafe_code)]

//! clipmark player
//!
//! The player turns recognized gestures, timeline drags and engine
//! notifications into playback commands while keeping favorites and the
//! timeline knob consistent.
//!
//! # Key Components
//!
//! - [`PlayerSession`] - owns all player state; the single entrypoint for hosts
//! - [`FavoriteStore`] - per-source favorite markers with collapse-on-conflict
//! - [`TimelineSync`] - knob position and scrub-session arbitration
//! - [`PlaybackController`] - gesture → engine command translation
//! - [`AccessGate`] - unlock flow for restricted sources
//! - [`PlayerConfig`] - every tunable, loadable from TOML / JSON
//!
//! # Role in clipmark
//! `clipmark-player` sits between `clipmark-core` (input interpretation) and
//! `clipmark-backend` (platform capabilities). It never touches a platform
//! API directly, so a whole session can be driven from a test.

pub mod access;
pub mod config;
pub mod controller;
pub mod error;
pub mod favorites;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod session;
pub mod timeline;

pub use access::{AccessGate, AccessPrompt, DecryptError, DecryptRequest, DecryptTicket, ProtectedSource};
pub use config::{AccessConfig, ConfigError, FavoritesConfig, PlaybackConfig, PlayerConfig};
pub use controller::{CommandTarget, Feedback, PlaybackController};
pub use error::PlayerError;
pub use favorites::{AddOutcome, Direction, FavoriteStore};
pub use session::{Control, EngineEvent, MarkerView, PlayButton, PlayerSession, PlayerView};
pub use timeline::{LastPositionMemo, ScrubSession, SeekTarget, TimelineSync, seek_target};
