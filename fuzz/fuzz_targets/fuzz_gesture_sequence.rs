#![no_main]

use arbitrary::Arbitrary;
use clipmark_core::{
    Gesture, GestureOutput, GestureRecognizer, GestureState, PointerSample, TimerCommand,
    TimerKind, TimerToken,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Down { x: i16, y: i16, dt: u16 },
    Move { x: i16, y: i16, dt: u16 },
    Up { x: i16, y: i16, dt: u16 },
    Fire { slow: bool },
    FireStale { slow: bool, token: u64 },
    Cancel,
}

/// Mirror of the host timer table, fed only by emitted commands.
#[derive(Default)]
struct Armed([Option<TimerToken>; 2]);

impl Armed {
    fn slot(kind: TimerKind) -> usize {
        match kind {
            TimerKind::SlowPress => 0,
            TimerKind::DoubleTapWait => 1,
        }
    }

    fn apply(&mut self, out: &GestureOutput) {
        for command in &out.timers {
            match *command {
                TimerCommand::Schedule { kind, token, .. } => self.0[Self::slot(kind)] = Some(token),
                TimerCommand::Cancel { kind } => self.0[Self::slot(kind)] = None,
            }
        }
    }

    fn take(&mut self, kind: TimerKind) -> Option<TimerToken> {
        self.0[Self::slot(kind)].take()
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut recognizer = GestureRecognizer::default();
    let mut armed = Armed::default();
    let mut now: u64 = 0;
    let mut slowed = 0_i64;

    for op in ops.into_iter().take(512) {
        let out = match op {
            Op::Down { x, y, dt } => {
                now += u64::from(dt);
                recognizer.on_pointer_down(PointerSample::new(f64::from(x), f64::from(y), now))
            }
            Op::Move { x, y, dt } => {
                now += u64::from(dt);
                recognizer.on_pointer_move(PointerSample::new(f64::from(x), f64::from(y), now))
            }
            Op::Up { x, y, dt } => {
                now += u64::from(dt);
                let out =
                    recognizer.on_pointer_up(PointerSample::new(f64::from(x), f64::from(y), now));
                assert!(
                    matches!(recognizer.state(), GestureState::None | GestureState::OneTap),
                    "pointer-up left {:?}",
                    recognizer.state()
                );
                assert!(!matches!(out.gesture, Some(Gesture::Tap | Gesture::LongPressStart)));
                out
            }
            Op::Fire { slow } => {
                let kind = if slow { TimerKind::SlowPress } else { TimerKind::DoubleTapWait };
                match armed.take(kind) {
                    Some(token) => recognizer.on_timer(kind, token),
                    None => GestureOutput::default(),
                }
            }
            Op::FireStale { slow, token } => {
                let kind = if slow { TimerKind::SlowPress } else { TimerKind::DoubleTapWait };
                let token = TimerToken::new(token);
                if recognizer.pending_timer(kind) == Some(token) {
                    continue;
                }
                let out = recognizer.on_timer(kind, token);
                assert!(out.is_empty(), "stale fire acted on: {out:?}");
                out
            }
            Op::Cancel => {
                let out = recognizer.cancel();
                assert_eq!(recognizer.state(), GestureState::None);
                out
            }
        };

        armed.apply(&out);
        match out.gesture {
            Some(Gesture::LongPressStart) => slowed += 1,
            Some(Gesture::LongPressEnd) => slowed -= 1,
            _ => {}
        }
        assert!((0..=1).contains(&slowed), "unbalanced long press: {slowed}");
        assert_eq!(slowed == 1, recognizer.state() == GestureState::Slow);

        for kind in [TimerKind::SlowPress, TimerKind::DoubleTapWait] {
            assert_eq!(
                recognizer.pending_timer(kind),
                armed.0[Armed::slot(kind)],
                "host timer table diverged for {kind:?}"
            );
        }
    }
});
