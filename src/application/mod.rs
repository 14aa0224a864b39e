//! Application layer - Use cases and port interfaces
//!
//! Contains the capture-to-container pipeline: the capture loop, the frame
//! pipeline, the fallback cascade and the session controller, plus the
//! trait definitions for external system interactions.

pub mod controller;
pub mod events;
pub mod frame_source;
pub mod orchestrator;
pub mod pipeline;
pub mod ports;

// Re-export use cases
pub use controller::{
    resolve_output_path, ControllerConfig, RecordingSummary, SessionController, SessionError,
};
pub use events::{event_channel, EventReceiver, EventSender, SessionEvent};
pub use frame_source::{validate_region, FrameSource, FrameSourceError};
pub use orchestrator::{FallbackOrchestrator, FallbackOutcome, FallbackStatus};
pub use pipeline::{FrameConsumer, FramePipeline, FrameProducer, PipelineError};
