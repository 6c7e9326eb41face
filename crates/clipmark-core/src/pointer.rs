#![forbid(unsafe_code)]

//! Pointer normalization and capture tracking.
//!
//! [`PointerTracker`] bridges host pointer lifecycle signals (DOM
//! `pointerdown` / `pointermove` / `pointerup` / `pointercancel`) into a
//! uniform [`PointerSample`] stream while enforcing:
//! - one active pointer at a time,
//! - explicit capture acquire/release commands for the host, and
//! - capture release on every terminal path (up, cancel, forced release).

/// One normalized pointer observation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    /// Horizontal position in host pixels.
    pub x: f64,
    /// Vertical position in host pixels.
    pub y: f64,
    /// Host timestamp in milliseconds.
    pub t_ms: u64,
}

impl PointerSample {
    #[must_use]
    pub const fn new(x: f64, y: f64, t_ms: u64) -> Self {
        Self { x, y, t_ms }
    }

    /// Euclidean distance to another sample.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Milliseconds elapsed since `earlier`, saturating at zero.
    #[must_use]
    pub const fn elapsed_since(self, earlier: Self) -> u64 {
        self.t_ms.saturating_sub(earlier.t_ms)
    }
}

/// Lifecycle phase of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Host command for browser pointer-capture control
/// (`setPointerCapture()` / `releasePointerCapture()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    Acquire { pointer_id: u32 },
    Release { pointer_id: u32 },
}

/// Why a lifecycle signal was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerIgnoredReason {
    ActivePointerAlreadyInProgress,
    NoActivePointer,
    PointerMismatch,
}

/// Result of one pointer lifecycle dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerDispatch {
    pub phase: PointerPhase,
    pub pointer_id: u32,
    /// The normalized sample, present only when the signal was forwarded.
    pub sample: Option<PointerSample>,
    pub capture_command: Option<CaptureCommand>,
    pub ignored: Option<PointerIgnoredReason>,
}

impl PointerDispatch {
    fn forwarded(
        phase: PointerPhase,
        pointer_id: u32,
        sample: PointerSample,
        capture_command: Option<CaptureCommand>,
    ) -> Self {
        Self {
            phase,
            pointer_id,
            sample: Some(sample),
            capture_command,
            ignored: None,
        }
    }

    fn ignored(phase: PointerPhase, pointer_id: u32, reason: PointerIgnoredReason) -> Self {
        tracing::trace!(?phase, pointer_id, ?reason, "pointer signal ignored");
        Self {
            phase,
            pointer_id,
            sample: None,
            capture_command: None,
            ignored: Some(reason),
        }
    }

    /// Whether the signal produced a sample.
    #[must_use]
    pub const fn is_forwarded(&self) -> bool {
        self.sample.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActivePointer {
    pointer_id: u32,
    last: PointerSample,
}

/// One-active-pointer capture adapter for a single host surface.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    active: Option<ActivePointer>,
}

impl PointerTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Active pointer ID, if any.
    #[must_use]
    pub fn active_pointer_id(&self) -> Option<u32> {
        self.active.map(|a| a.pointer_id)
    }

    /// Last forwarded sample of the active pointer.
    #[must_use]
    pub fn last_sample(&self) -> Option<PointerSample> {
        self.active.map(|a| a.last)
    }

    /// Handle pointer-down. Starts a capture session.
    pub fn down(&mut self, pointer_id: u32, sample: PointerSample) -> PointerDispatch {
        if self.active.is_some() {
            return PointerDispatch::ignored(
                PointerPhase::Down,
                pointer_id,
                PointerIgnoredReason::ActivePointerAlreadyInProgress,
            );
        }
        self.active = Some(ActivePointer {
            pointer_id,
            last: sample,
        });
        PointerDispatch::forwarded(
            PointerPhase::Down,
            pointer_id,
            sample,
            Some(CaptureCommand::Acquire { pointer_id }),
        )
    }

    /// Handle pointer-move for the captured pointer.
    pub fn moved(&mut self, pointer_id: u32, sample: PointerSample) -> PointerDispatch {
        match self.active.as_mut() {
            None => PointerDispatch::ignored(
                PointerPhase::Move,
                pointer_id,
                PointerIgnoredReason::NoActivePointer,
            ),
            Some(active) if active.pointer_id != pointer_id => PointerDispatch::ignored(
                PointerPhase::Move,
                pointer_id,
                PointerIgnoredReason::PointerMismatch,
            ),
            Some(active) => {
                active.last = sample;
                PointerDispatch::forwarded(PointerPhase::Move, pointer_id, sample, None)
            }
        }
    }

    /// Handle pointer-up. Ends the capture session.
    pub fn up(&mut self, pointer_id: u32, sample: PointerSample) -> PointerDispatch {
        if let Some(reason) = self.check_active(pointer_id) {
            return PointerDispatch::ignored(PointerPhase::Up, pointer_id, reason);
        }
        self.active = None;
        PointerDispatch::forwarded(
            PointerPhase::Up,
            pointer_id,
            sample,
            Some(CaptureCommand::Release { pointer_id }),
        )
    }

    /// Handle pointer-cancel (lost capture, blur, system gesture).
    ///
    /// The forwarded sample repeats the last known position at `t_ms`.
    pub fn cancel(&mut self, pointer_id: u32, t_ms: u64) -> PointerDispatch {
        if let Some(reason) = self.check_active(pointer_id) {
            return PointerDispatch::ignored(PointerPhase::Cancel, pointer_id, reason);
        }
        let last = self.active.take().map(|a| a.last).unwrap_or_default();
        let sample = PointerSample::new(last.x, last.y, t_ms);
        PointerDispatch::forwarded(
            PointerPhase::Cancel,
            pointer_id,
            sample,
            Some(CaptureCommand::Release { pointer_id }),
        )
    }

    /// Drop the active pointer without a lifecycle signal, e.g. when the
    /// surface is hidden. Returns the release command for the host, if any.
    pub fn release(&mut self) -> Option<CaptureCommand> {
        self.active
            .take()
            .map(|a| CaptureCommand::Release {
                pointer_id: a.pointer_id,
            })
    }

    fn check_active(&self, pointer_id: u32) -> Option<PointerIgnoredReason> {
        match self.active {
            None => Some(PointerIgnoredReason::NoActivePointer),
            Some(a) if a.pointer_id != pointer_id => Some(PointerIgnoredReason::PointerMismatch),
            Some(_) => None,
        }
    }
}
