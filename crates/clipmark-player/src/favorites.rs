#![forbid(unsafe_code)]

//! Per-source favorite markers.
//!
//! [`FavoriteStore`] holds the favorites of the currently open source in
//! insertion order and persists them as a JSON array of seconds under
//! `"<key_prefix><source-id>"`.
//!
//! # Invariants
//!
//! 1. No two stored favorites are closer than the collapse window that was
//!    in effect when the later one was added. An insertion that would
//!    violate this removes both the new entry and the first conflicting one.
//! 2. Every stored time is finite and `>= 0`.
//! 3. Storage order is insertion order; navigation sorts on demand.
//!
//! # Failure Modes
//!
//! - Malformed or unreadable persisted data loads as an empty list.
//! - Saving with no open source is a no-op.

use clipmark_backend::KeyValueStore;
use clipmark_core::geometry::TimelineLayout;

use crate::config::FavoritesConfig;
use crate::error::PlayerError;

/// Direction of a favorite jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Result of [`FavoriteStore::add`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddOutcome {
    /// The favorite was appended.
    Added,
    /// The new favorite conflicted with `removed`; both are gone.
    Collapsed { removed: f64 },
    /// The time was negative or not finite; nothing changed.
    Rejected,
}

/// Favorites of one open source.
#[derive(Debug, Clone)]
pub struct FavoriteStore {
    config: FavoritesConfig,
    source: Option<String>,
    times: Vec<f64>,
}

impl FavoriteStore {
    #[must_use]
    pub fn new(config: FavoritesConfig) -> Self {
        Self {
            config,
            source: None,
            times: Vec::new(),
        }
    }

    /// Source the list belongs to, if one was loaded.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Favorites in insertion order.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Storage key for `source`.
    #[must_use]
    pub fn storage_key(&self, source: &str) -> String {
        format!("{}{source}", self.config.key_prefix)
    }

    /// Replace the list with the one persisted for `source`.
    ///
    /// Returns the number of favorites loaded.
    pub fn load<S: KeyValueStore>(&mut self, source: &str, store: &S) -> usize {
        let key = self.storage_key(source);
        self.source = Some(source.to_owned());
        self.times = match store.get(&key) {
            Ok(Some(raw)) => parse_times(&key, &raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "favorites unreadable, starting empty");
                Vec::new()
            }
        };
        tracing::debug!(key = %key, count = self.times.len(), "favorites loaded");
        self.times.len()
    }

    /// Persist the list for the current source.
    pub fn save<S: KeyValueStore>(&self, store: &mut S) -> Result<(), PlayerError> {
        let Some(source) = self.source.as_deref() else {
            return Ok(());
        };
        let key = self.storage_key(source);
        let value = serde_json::to_string(&self.times).map_err(|e| PlayerError::storage(&key, e))?;
        store
            .set(&key, &value)
            .map_err(|e| PlayerError::storage(&key, e))?;
        tracing::trace!(key = %key, count = self.times.len(), "favorites saved");
        Ok(())
    }

    /// Collapse window in seconds for the given layout and duration.
    ///
    /// Two markers overlap on screen when their ratios differ by less than
    /// one marker width. Without a layout or a known duration the configured
    /// fallback applies.
    #[must_use]
    pub fn collapse_window(&self, layout: Option<TimelineLayout>, duration: f64) -> f64 {
        if duration.is_finite()
            && duration > 0.0
            && let Some(width) = layout.and_then(|l| l.marker_ratio_width())
        {
            return width * duration;
        }
        self.config.collapse_fallback_secs
    }

    /// Append `time`; if it lies within `window` of an existing favorite,
    /// drop both.
    pub fn add(&mut self, time: f64, window: f64) -> AddOutcome {
        if !time.is_finite() || time < 0.0 {
            return AddOutcome::Rejected;
        }
        let conflict = self.times.iter().position(|&t| (t - time).abs() < window);
        match conflict {
            Some(index) => {
                let removed = self.times.remove(index);
                tracing::debug!(time, removed, window, "favorite collapsed");
                AddOutcome::Collapsed { removed }
            }
            None => {
                self.times.push(time);
                tracing::debug!(time, count = self.times.len(), "favorite added");
                AddOutcome::Added
            }
        }
    }

    /// Pick the favorite to jump to from `current_time`.
    ///
    /// Forward takes the nearest favorite strictly after `current_time`.
    /// Backward considers favorites strictly before it plus the start of the
    /// media, and takes the latest one, unless that one lies within the
    /// double-swipe window and an earlier candidate exists, in which case the
    /// earlier one wins.
    #[must_use]
    pub fn navigate(&self, direction: Direction, current_time: f64) -> Option<f64> {
        if !current_time.is_finite() {
            return None;
        }
        match direction {
            Direction::Forward => self
                .times
                .iter()
                .copied()
                .filter(|&t| t > current_time)
                .min_by(f64::total_cmp),
            Direction::Backward => {
                let mut candidates: Vec<f64> = self
                    .times
                    .iter()
                    .copied()
                    .filter(|&t| t < current_time)
                    .collect();
                candidates.push(0.0);
                candidates.sort_by(f64::total_cmp);

                let last = *candidates.last()?;
                if candidates.len() > 1
                    && current_time - last < self.config.double_swipe_window_secs
                {
                    Some(candidates[candidates.len() - 2])
                } else {
                    Some(last)
                }
            }
        }
    }
}

fn parse_times(key: &str, raw: &str) -> Vec<f64> {
    match serde_json::from_str::<Vec<f64>>(raw) {
        Ok(times) if times.iter().all(|t| t.is_finite() && *t >= 0.0) => times,
        Ok(_) => {
            tracing::warn!(key = %key, "favorites hold out-of-range times, ignoring");
            Vec::new()
        }
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "favorites malformed, ignoring");
            Vec::new()
        }
    }
}
