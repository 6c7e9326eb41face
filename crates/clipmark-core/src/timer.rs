#![forbid(unsafe_code)]

//! Host-scheduled, cancellable, single-shot timers.
//!
//! The recognizer never sleeps or reads a clock. When a transition needs a
//! delay it emits a [`TimerCommand::Schedule`] carrying a fresh
//! [`TimerToken`]; the host arms a real (or simulated) timer and later reports
//! the fire back with the same token. A fire whose token no longer matches the
//! pending one for its kind is stale and ignored, so a timer can never act on
//! a gesture lifecycle that already ended.

use core::time::Duration;

/// The delayed transitions the gesture recognizer can arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Fires after `slow_initial_wait` to promote a stationary press to slow-motion.
    SlowPress,
    /// Fires after `max_double_tap_wait` to resolve a lone tap.
    DoubleTapWait,
}

impl TimerKind {
    /// Every timer kind, in a stable order.
    pub const ALL: [Self; 2] = [Self::SlowPress, Self::DoubleTapWait];

    /// Dense index for per-kind slot arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::SlowPress => 0,
            Self::DoubleTapWait => 1,
        }
    }

    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SlowPress => "slow_press",
            Self::DoubleTapWait => "double_tap_wait",
        }
    }
}

/// Generation id attached to one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    /// Wrap a raw generation id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw generation id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Instruction for the host timer scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Arm a single-shot timer. Replaces any timer of the same kind.
    Schedule {
        kind: TimerKind,
        token: TimerToken,
        delay: Duration,
    },
    /// Disarm the timer of this kind, if any.
    Cancel { kind: TimerKind },
}

impl TimerCommand {
    /// The timer kind this command targets.
    #[must_use]
    pub const fn kind(&self) -> TimerKind {
        match self {
            Self::Schedule { kind, .. } | Self::Cancel { kind } => *kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_indices_are_dense() {
        for (i, kind) in TimerKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn command_reports_kind() {
        let schedule = TimerCommand::Schedule {
            kind: TimerKind::SlowPress,
            token: TimerToken::new(3),
            delay: Duration::from_millis(500),
        };
        assert_eq!(schedule.kind(), TimerKind::SlowPress);
        assert_eq!(
            TimerCommand::Cancel {
                kind: TimerKind::DoubleTapWait
            }
            .kind(),
            TimerKind::DoubleTapWait
        );
    }

    #[test]
    fn tokens_order_by_generation() {
        assert!(TimerToken::new(1) < TimerToken::new(2));
        assert_eq!(TimerToken::new(7).get(), 7);
    }
}
