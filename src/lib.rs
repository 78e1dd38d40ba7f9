// Haptic Pulse Core - declarative haptic pattern playback
// Supervised engine lifecycle with a pluggable hardware backend

// Module declarations
pub mod config;
pub mod engine;
pub mod error;
pub mod pattern;
pub mod player;
pub mod telemetry;

// Re-exports for convenience
pub use engine::{EngineState, HapticEngine, StopReason};
pub use error::{EngineError, ErrorSink, PlayError};
pub use pattern::{HapticEvent, HapticEventKind, HapticPattern};
pub use player::{PatternPlayer, PlaybackHandle};
