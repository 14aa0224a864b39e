//! Screen capture port interface

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::capture::{MonitorInfo, Region};

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Invalid capture region {0}: must be non-empty and at most 7680x4320")]
    InvalidRegion(Region),

    #[error("No monitor available for capture")]
    MonitorUnavailable,

    #[error("{0} not found. Please install it to capture the screen")]
    ToolNotFound(String),

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),
}

/// Port for the host screen-capture provider.
///
/// Every call may fail; the capture loop reports failures as non-fatal events.
#[async_trait]
pub trait ScreenCapturer: Send + Sync {
    /// Enumerate the displays attached to the host
    async fn monitors(&self) -> Result<Vec<MonitorInfo>, CaptureError>;

    /// Bounds of the currently focused window
    async fn active_window_bounds(&self) -> Result<Region, CaptureError>;

    /// Capture `region` as RGBA8 into `buffer`.
    ///
    /// The buffer is reused across calls; implementations resize it to
    /// exactly `width * height * 4` bytes.
    async fn capture_region(&self, region: Region, buffer: &mut Vec<u8>)
        -> Result<(), CaptureError>;
}

#[async_trait]
impl<T: ScreenCapturer + ?Sized> ScreenCapturer for Arc<T> {
    async fn monitors(&self) -> Result<Vec<MonitorInfo>, CaptureError> {
        self.as_ref().monitors().await
    }

    async fn active_window_bounds(&self) -> Result<Region, CaptureError> {
        self.as_ref().active_window_bounds().await
    }

    async fn capture_region(
        &self,
        region: Region,
        buffer: &mut Vec<u8>,
    ) -> Result<(), CaptureError> {
        self.as_ref().capture_region(region, buffer).await
    }
}
