#![forbid(unsafe_code)]

//! Player error model.
//!
//! Most conditions the player meets are expected transient states (unknown
//! duration, empty favorite list, stray pointer-up) and are absorbed where
//! they occur. The types here cover what a caller can actually act on.

use std::fmt;

use crate::config::ConfigError;

/// Errors surfaced by [`PlayerSession`](crate::session::PlayerSession) entry points.
#[derive(Debug)]
pub enum PlayerError {
    /// `open` was called with an empty source identifier.
    EmptySourceId,
    /// The configuration failed to load or validate.
    Config(ConfigError),
    /// The key-value store rejected a read or write.
    Storage { key: String, message: String },
    /// The playback engine rejected a command.
    Playback(String),
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySourceId => write!(f, "source id must not be empty"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage { key, message } => write!(f, "storage error for {key:?}: {message}"),
            Self::Playback(message) => write!(f, "playback error: {message}"),
        }
    }
}

impl std::error::Error for PlayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for PlayerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl PlayerError {
    pub(crate) fn storage(key: &str, err: impl fmt::Display) -> Self {
        Self::Storage {
            key: key.to_owned(),
            message: err.to_string(),
        }
    }

    /// Whether the player keeps working normally after this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_key() {
        let err = PlayerError::storage("favorites:a.mp4", "quota exceeded");
        assert_eq!(
            err.to_string(),
            "storage error for \"favorites:a.mp4\": quota exceeded"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn config_errors_chain_source() {
        let err = PlayerError::from(ConfigError::Validation(vec!["x".into()]));
        assert!(!err.is_recoverable());
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("config: validation errors"));
    }
}
