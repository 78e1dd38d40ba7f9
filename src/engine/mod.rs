//! Engine module housing the haptics connection supervisor.
//!
//! This module exposes trait-based backends (`backend`) and the `HapticEngine`
//! lifecycle layer (`core`).

pub mod backend;
pub mod core;

pub use self::backend::{
    BackendNotification, BackendPlayer, CompiledEvent, CompiledPattern, FeedbackRecord,
    HapticBackend, ImpactStyle, ManualTimeSource, NotificationHandler, SimulatedBackend,
    StopReason, SystemTimeSource, TimeSource,
};
pub use self::core::{
    EngineOptions, EngineState, HapticEngine, LifecycleEvent, LifecycleEventKind, ObserverId,
};
