//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces: screen capture
//! providers, the frame codec, container writers, encoding strategies,
//! the config store and desktop notifications.

pub mod capture;
pub mod codec;
pub mod config;
pub mod container;
pub mod encoding;
pub mod notification;

// Re-export adapters
pub use capture::{FfmpegScreenCapturer, TestPatternCapturer};
pub use codec::{FrameCodec, JpegCompressor};
pub use config::XdgConfigStore;
pub use encoding::Strategy;
pub use notification::{create_notifier, DesktopNotifier};
