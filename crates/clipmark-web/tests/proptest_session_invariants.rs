//! Property-based invariant tests for a full session over the web backend.
//!
//! ## Invariants
//!
//! 1. The knob ratio stays in `[0, 1]` and playback time in `[0, duration]`
//!    through any scrub path.
//! 2. A timeline pointer-up always ends the scrub and resumes playback.
//! 3. Any long press, however it ends, restores the normal rate and leaves
//!    no timer armed once the gesture has resolved.

use core::time::Duration;

use clipmark_backend::PlaybackEngine;
use clipmark_core::geometry::{Span, TimelineLayout};
use clipmark_web::{WebBackend, WebPlayer};
use proptest::prelude::*;

fn player(duration: f64) -> WebPlayer {
    let layout = TimelineLayout::new(Span::new(100.0, 400.0), 20.0);
    let mut player = WebPlayer::new(WebBackend::with_layout(layout));
    player.open("clip.mp4").unwrap();
    player.load_metadata(duration);
    player
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // ── 1-2. Scrubbing ────────────────────────────────────────────────────

    #[test]
    fn scrub_paths_stay_in_range(
        duration in 1.0f64..3_600.0,
        path in prop::collection::vec(-200.0f64..800.0, 1..20),
        tick_ms in 0u64..500,
    ) {
        let mut player = player(duration);
        player.timeline_down(1, path[0]);
        for &x in &path[1..] {
            player.timeline_move(1, x);
            player.advance(Duration::from_millis(tick_ms));
            let view = player.session().view();
            prop_assert!((0.0..=1.0).contains(&view.knob_ratio));
            let t = player.backend().media().current_time();
            prop_assert!((0.0..=duration).contains(&t));
            prop_assert!(player.backend().media().paused());
        }
        player.timeline_up(1, path[path.len() - 1]);
        prop_assert!(!player.session().is_scrubbing());
        prop_assert!(!player.backend().media().paused());
    }

    // ── 3. Long press ─────────────────────────────────────────────────────

    #[test]
    fn long_press_always_restores_rate(
        held_ms in 0u64..2_000,
        drift in 0.0f64..30.0,
        cancel in any::<bool>(),
    ) {
        let mut player = player(600.0);
        player.video_down(1, 50.0, 50.0);
        player.advance(Duration::from_millis(held_ms));
        player.video_move(1, 50.0 + drift, 50.0);
        if cancel {
            player.video_cancel(1);
        } else {
            player.video_up(1, 50.0 + drift, 50.0);
        }
        player.advance(Duration::from_millis(300));
        prop_assert_eq!(player.session().view().playback_rate, 1.0);
        prop_assert!(player.backend().timers().is_idle());
    }
}
