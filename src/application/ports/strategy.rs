//! Encoding strategy port interface

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::capture::{CompressedFrame, Frame};
use crate::domain::encoding::{EncodingSettings, QualityTier, StrategyKind};
use crate::domain::error::ContainerError;

/// Encoding errors
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Still-image compression of one frame failed; the session carries on
    #[error("Frame encoding failed: {0}")]
    FrameEncode(String),

    #[error("Container write failed: {0}")]
    ContainerWrite(#[from] ContainerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Declarative refusal, raised before any output is written
    #[error("Strategy unsuitable: {0}")]
    Unsuitable(String),

    #[error("Strategy is already active")]
    AlreadyActive,

    #[error("Strategy is not active")]
    NotActive,
}

impl EncodeError {
    /// True when the failure concerns a single frame rather than the strategy
    pub fn is_frame_local(&self) -> bool {
        matches!(self, Self::FrameEncode(_))
    }
}

/// What a finished strategy left on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndOutcome {
    /// A container (or sequence manifest/page) was written
    Container(PathBuf),
    /// No frames were buffered; a diagnostic placeholder was written instead
    Placeholder(PathBuf),
}

impl EndOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Container(path) | Self::Placeholder(path) => path,
        }
    }
}

/// Port for one way of turning frames into an output file.
///
/// Lifecycle: `begin` once, `submit` any number of frames, `end` once.
#[async_trait]
pub trait EncodingStrategy: Send + Sync {
    /// Which variant this is
    fn kind(&self) -> StrategyKind;

    /// Prepare for a recording.
    ///
    /// Normalizes the extension of `path` to the variant's native one,
    /// creates missing directories and resets internal buffers.
    /// Fails with `AlreadyActive` when called twice without `end`.
    ///
    /// # Returns
    /// The normalized output path
    async fn begin(
        &mut self,
        path: &Path,
        settings: &EncodingSettings,
    ) -> Result<PathBuf, EncodeError>;

    /// Compress and buffer one frame. No-op when not begun.
    async fn submit(&mut self, frame: &Frame) -> Result<(), EncodeError>;

    /// Buffer a frame already compressed to JPEG at the session's quality.
    /// No-op when not begun.
    async fn submit_compressed(&mut self, frame: &CompressedFrame) -> Result<(), EncodeError>;

    /// Finalize the output. Always attempts to produce something, even
    /// with zero buffered frames.
    async fn end(&mut self) -> Result<EndOutcome, EncodeError>;

    /// Drop buffered state without writing anything
    fn abandon(&mut self);

    /// True between `begin` and `end`
    fn is_active(&self) -> bool;

    /// Bytes of compressed payload buffered so far
    fn buffered_bytes(&self) -> u64;
}

/// Port for the one-time JPEG compression of captured frames
#[async_trait]
pub trait FrameCompressor: Send + Sync {
    async fn compress(&self, frame: &Frame, quality: QualityTier) -> Result<CompressedFrame, EncodeError>;
}
