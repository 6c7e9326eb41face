#![no_main]

use core::time::Duration;

use arbitrary::Arbitrary;
use clipmark_core::{Span, TimelineLayout};
use clipmark_player::Control;
use clipmark_web::{WebBackend, WebPlayer};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    VideoDown { id: u8, x: i16, y: i16 },
    VideoMove { id: u8, x: i16, y: i16 },
    VideoUp { id: u8, x: i16, y: i16 },
    VideoCancel { id: u8 },
    TimelineDown { id: u8, x: i16 },
    TimelineMove { id: u8, x: i16 },
    TimelineUp { id: u8, x: i16 },
    Advance { ms: u16 },
    Metadata { secs: u16 },
    Button(u8),
    Reopen { which: bool },
}

fuzz_target!(|ops: Vec<Op>| {
    let layout = TimelineLayout::new(Span::new(100.0, 400.0), 20.0);
    let mut player = WebPlayer::new(WebBackend::with_layout(layout));
    let _ = player.open("a.mp4");

    for op in ops.into_iter().take(256) {
        match op {
            Op::VideoDown { id, x, y } => {
                player.video_down(u32::from(id % 3), f64::from(x), f64::from(y));
            }
            Op::VideoMove { id, x, y } => {
                player.video_move(u32::from(id % 3), f64::from(x), f64::from(y));
            }
            Op::VideoUp { id, x, y } => {
                player.video_up(u32::from(id % 3), f64::from(x), f64::from(y));
            }
            Op::VideoCancel { id } => player.video_cancel(u32::from(id % 3)),
            Op::TimelineDown { id, x } => player.timeline_down(u32::from(id % 3), f64::from(x)),
            Op::TimelineMove { id, x } => player.timeline_move(u32::from(id % 3), f64::from(x)),
            Op::TimelineUp { id, x } => player.timeline_up(u32::from(id % 3), f64::from(x)),
            Op::Advance { ms } => player.advance(Duration::from_millis(u64::from(ms))),
            Op::Metadata { secs } => player.load_metadata(f64::from(secs.max(1))),
            Op::Button(b) => {
                let control = match b % 6 {
                    0 => Control::Play,
                    1 => Control::Pause,
                    2 => Control::AddFavorite,
                    3 => Control::Close,
                    4 => Control::Help,
                    _ => Control::HelpClose,
                };
                let _ = player.session_mut().press(control);
                player.pump_media();
            }
            Op::Reopen { which } => {
                let _ = player.open(if which { "a.mp4" } else { "b.mp4" });
            }
        }

        let view = player.session().view();
        assert!((0.0..=1.0).contains(&view.knob_ratio), "knob {}", view.knob_ratio);
        for marker in &view.markers {
            assert!((0.0..=1.0).contains(&marker.ratio));
        }
        let times = player.session().favorites();
        for (i, a) in times.iter().enumerate() {
            assert!(a.is_finite() && *a >= 0.0);
            assert!(!times[i + 1..].contains(a), "duplicate favorite {a}");
        }
        assert!(view.playback_rate == 0.5 || view.playback_rate == 1.0);
    }
});
