#![forbid(unsafe_code)]

//! Core: pointer normalization, gesture recognition, and timeline geometry.
//!
//! # Role in clipmark
//! `clipmark-core` is the input layer. It turns raw pointer lifecycle signals
//! into a uniform [`PointerSample`](pointer::PointerSample) stream and
//! interprets that stream as high-level [`Gesture`](gesture::Gesture) intents.
//!
//! # Primary responsibilities
//! - **PointerTracker**: one-active-pointer capture adapter for host surfaces.
//! - **GestureRecognizer**: pure tap / double-tap / swipe / long-press state machine.
//! - **Timers**: tokens and commands for host-scheduled, cancellable delays.
//! - **Geometry**: timeline bar spans, marker extents, and ratio math.
//!
//! # How it fits in the system
//! Nothing here reads a clock or touches a platform API. The player
//! (`clipmark-player`) feeds samples in and forwards emitted timer commands
//! to whatever scheduler the backend provides, so every transition is
//! reproducible from a recorded input trace.

pub mod geometry;
pub mod gesture;
pub mod pointer;
pub mod timer;

pub use geometry::{Span, TimelineLayout, clamp_ratio, playback_ratio};
pub use gesture::{Gesture, GestureConfig, GestureOutput, GestureRecognizer, GestureState};
pub use pointer::{
    CaptureCommand, PointerDispatch, PointerIgnoredReason, PointerPhase, PointerSample,
    PointerTracker,
};
pub use timer::{TimerCommand, TimerKind, TimerToken};
