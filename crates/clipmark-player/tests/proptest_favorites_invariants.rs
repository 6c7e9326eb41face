//! Property-based invariant tests for favorites and scrub targets.
//!
//! ## Invariants
//!
//! 1. After any sequence of adds with a fixed window, no two favorites are
//!    closer than the window.
//! 2. An add either grows the list by one or shrinks it by one.
//! 3. Forward navigation lands strictly after the current time and no
//!    favorite lies between the two.
//! 4. Backward navigation lands strictly before the current time (or at 0).
//! 5. Scrub targets are always within `[0, duration]` with ratio in `[0, 1]`.

use clipmark_core::geometry::{Span, TimelineLayout};
use clipmark_player::{AddOutcome, Direction, FavoriteStore, FavoritesConfig, seek_target};
use proptest::prelude::*;

fn store_from(times: &[f64], window: f64) -> FavoriteStore {
    let mut store = FavoriteStore::new(FavoritesConfig::default());
    for &t in times {
        store.add(t, window);
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // ── 1-2. Collapse-on-conflict ─────────────────────────────────────────

    #[test]
    fn adds_keep_favorites_apart(
        times in prop::collection::vec(0.0f64..600.0, 0..60),
        window in 0.1f64..20.0,
    ) {
        let mut store = FavoriteStore::new(FavoritesConfig::default());
        for t in times {
            let before = store.len();
            match store.add(t, window) {
                AddOutcome::Added => prop_assert_eq!(store.len(), before + 1),
                AddOutcome::Collapsed { removed } => {
                    prop_assert_eq!(store.len(), before - 1);
                    prop_assert!((removed - t).abs() < window);
                }
                AddOutcome::Rejected => prop_assert!(false, "valid time rejected: {t}"),
            }
        }

        let times = store.times();
        for (i, a) in times.iter().enumerate() {
            for b in &times[i + 1..] {
                prop_assert!((a - b).abs() >= window, "{a} and {b} closer than {window}");
            }
        }
    }

    // ── 3-4. Navigation ───────────────────────────────────────────────────

    #[test]
    fn forward_is_nearest_later(
        times in prop::collection::vec(0.0f64..600.0, 0..30),
        current in 0.0f64..600.0,
    ) {
        let store = store_from(&times, 1.0);
        match store.navigate(Direction::Forward, current) {
            Some(next) => {
                prop_assert!(next > current);
                prop_assert!(store.times().iter().all(|&t| t <= current || t >= next));
            }
            None => prop_assert!(store.times().iter().all(|&t| t <= current)),
        }
    }

    #[test]
    fn backward_is_before_current(
        times in prop::collection::vec(0.0f64..600.0, 0..30),
        current in 0.0f64..600.0,
    ) {
        let store = store_from(&times, 1.0);
        let prev = store.navigate(Direction::Backward, current);
        prop_assert!(prev.is_some());
        let prev = prev.unwrap();
        prop_assert!(prev == 0.0 || prev < current, "prev={prev} current={current}");
        prop_assert!(prev == 0.0 || store.times().contains(&prev));
    }
}

// ── 5. Scrub targets ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn scrub_target_stays_in_range(
        x in -1000.0f64..3000.0,
        duration in 0.5f64..7200.0,
        favorites in prop::collection::vec(0.0f64..7200.0, 0..10),
    ) {
        let layout = TimelineLayout::new(Span::new(40.0, 1200.0), 20.0);
        let favorites: Vec<f64> = favorites.into_iter().filter(|&t| t <= duration).collect();
        let target = seek_target(x, Some(layout), &favorites, duration).unwrap();
        prop_assert!((0.0..=1.0).contains(&target.ratio));
        prop_assert!(target.time >= 0.0 && target.time <= duration);
        if target.snapped {
            prop_assert!(favorites.contains(&target.time));
        }
    }
}
