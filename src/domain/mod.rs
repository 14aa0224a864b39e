//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod capture;
pub mod config;
pub mod encoding;
pub mod error;
pub mod recording;
pub mod session;

// Re-export common types
pub use capture::{CaptureMode, CompressedFrame, Frame, ImageFormat, MonitorInfo, Region};
pub use config::AppConfig;
pub use encoding::{ContainerFamily, EncodingSettings, QualityTier};
pub use error::*;
pub use recording::Duration;
pub use session::{InvalidStateTransition, RecordingSession, SessionStatus};
