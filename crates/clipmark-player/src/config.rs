#![forbid(unsafe_code)]

//! Player configuration as data.
//!
//! Captures every tunable of the player into a single [`PlayerConfig`] that
//! can be loaded from TOML or JSON at startup.
//!
//! # Loading
//!
//! ```toml
//! # clipmark.toml
//! [gesture]
//! max_tap_duration_ms = 180
//! min_swipe_x_distance = 90.0
//!
//! [playback]
//! slow_rate = 0.25
//!
//! [favorites]
//! key_prefix = "video_player:favorites:"
//! ```
//!
//! ```rust,ignore
//! let config = PlayerConfig::from_toml_file("clipmark.toml")?;
//! let config = PlayerConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! `PlayerConfig::default()` reproduces the stock player: 200ms taps, 75px
//! swipes, half-speed long press, 2s double-swipe window.

#[cfg(feature = "config-files")]
use std::path::Path;

#[cfg(feature = "config-files")]
use serde::{Deserialize, Serialize};

use clipmark_core::gesture::GestureConfig;

// ---------------------------------------------------------------------------
// Top-level PlayerConfig
// ---------------------------------------------------------------------------

/// Top-level configuration for one embedded player.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct PlayerConfig {
    /// Gesture thresholds.
    pub gesture: GestureConfig,
    /// Playback rates.
    pub playback: PlaybackConfig,
    /// Favorite persistence and navigation.
    pub favorites: FavoritesConfig,
    /// Access-restricted source handling.
    pub access: AccessConfig,
}

impl PlayerConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.gesture.validate();

        for (name, rate) in [
            ("playback.slow_rate", self.playback.slow_rate),
            ("playback.normal_rate", self.playback.normal_rate),
        ] {
            if !(rate.is_finite() && rate > 0.0) {
                errors.push(format!("{name} must be > 0, got {rate}"));
            }
        }

        if self.favorites.key_prefix.is_empty() {
            errors.push("favorites.key_prefix must not be empty".into());
        }
        if !(self.favorites.collapse_fallback_secs.is_finite()
            && self.favorites.collapse_fallback_secs >= 0.0)
        {
            errors.push(format!(
                "favorites.collapse_fallback_secs must be >= 0, got {}",
                self.favorites.collapse_fallback_secs
            ));
        }
        if !(self.favorites.double_swipe_window_secs.is_finite()
            && self.favorites.double_swipe_window_secs >= 0.0)
        {
            errors.push(format!(
                "favorites.double_swipe_window_secs must be >= 0, got {}",
                self.favorites.double_swipe_window_secs
            ));
        }

        if self.access.password_key_prefix.is_empty() {
            errors.push("access.password_key_prefix must not be empty".into());
        }

        errors
    }

    /// Consume the config, failing if [`validate`](Self::validate) reports anything.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Playback speed multipliers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct PlaybackConfig {
    /// Rate applied while a long press is held (default: 0.5).
    pub slow_rate: f64,
    /// Rate restored when the long press ends (default: 1.0).
    pub normal_rate: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            slow_rate: 0.5,
            normal_rate: 1.0,
        }
    }
}

/// Favorite persistence, collapse, and navigation parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct FavoritesConfig {
    /// Storage key prefix; the source id is appended (default: `"favorites:"`).
    pub key_prefix: String,
    /// Collapse window in seconds used when the timeline layout or the
    /// duration is unknown (default: 1.0).
    pub collapse_fallback_secs: f64,
    /// A backward jump landing within this many seconds of the current time
    /// skips to the favorite before it (default: 2.0).
    pub double_swipe_window_secs: f64,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            key_prefix: "favorites:".into(),
            collapse_fallback_secs: 1.0,
            double_swipe_window_secs: 2.0,
        }
    }
}

/// Access-restricted source parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct AccessConfig {
    /// Storage key prefix for remembered passwords; the rule name is appended
    /// (default: `"password:"`).
    pub password_key_prefix: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            password_key_prefix: "password:".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a player configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-files")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-files")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
