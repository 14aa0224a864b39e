//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod notifier;
pub mod strategy;

// Re-export common types
pub use capture::{CaptureError, ScreenCapturer};
pub use config::ConfigStore;
pub use notifier::{NotificationError, NotificationIcon, Notifier, SilentNotifier};
pub use strategy::{EncodeError, EncodingStrategy, EndOutcome, FrameCompressor};
