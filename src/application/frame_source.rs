//! Periodic capture loop feeding the frame pipeline

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::capture::{CaptureMode, Frame, Region, BYTES_PER_PIXEL};
use crate::domain::encoding::EncodingSettings;

use super::events::{EventSender, SessionEvent};
use super::pipeline::FrameProducer;
use super::ports::{CaptureError, ScreenCapturer};

/// Pause after a failed capture before trying again
pub const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Frame source errors
#[derive(Debug, Error)]
pub enum FrameSourceError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Capture loop is already running")]
    AlreadyRunning,

    #[error("Capture loop is not running")]
    NotRunning,

    #[error("Capture task failed: {0}")]
    TaskFailed(String),
}

/// Reject empty regions and anything larger than 8K UHD
pub fn validate_region(region: &Region) -> bool {
    region.is_capturable()
}

/// Drives a `ScreenCapturer` at the configured frame rate.
///
/// One background task captures, copies the working buffer into an owned
/// `Frame` and pushes it into the pipeline. Sequence numbers start at 1 and
/// increase by one per pushed frame.
pub struct FrameSource<C: ScreenCapturer> {
    capturer: Arc<C>,
    events: EventSender,
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<u64>>,
}

impl<C: ScreenCapturer + 'static> FrameSource<C> {
    pub fn new(capturer: Arc<C>, events: EventSender) -> Self {
        Self {
            capturer,
            events,
            stop_tx: None,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Work out what to capture for the settings' capture mode.
    ///
    /// An out-of-range monitor index falls back to the primary monitor.
    /// Active-window bounds are resolved here, once per recording.
    pub async fn resolve_region(
        &self,
        settings: &EncodingSettings,
    ) -> Result<Region, CaptureError> {
        let region = match settings.capture_mode {
            CaptureMode::FullScreen => {
                let monitors = self.capturer.monitors().await?;
                let chosen = monitors
                    .iter()
                    .find(|m| m.index == settings.monitor_index)
                    .or_else(|| {
                        warn!(
                            requested = settings.monitor_index,
                            "monitor not found, using primary"
                        );
                        monitors.iter().find(|m| m.primary)
                    })
                    .or_else(|| monitors.first())
                    .ok_or(CaptureError::MonitorUnavailable)?;
                chosen.bounds
            }
            CaptureMode::ActiveWindow => self.capturer.active_window_bounds().await?,
            CaptureMode::CustomRegion => settings
                .custom_region
                .ok_or(CaptureError::InvalidRegion(Region::default()))?,
        };

        if !validate_region(&region) {
            return Err(CaptureError::InvalidRegion(region));
        }
        Ok(region)
    }

    /// Resolve the capture region and start the loop.
    ///
    /// # Returns
    /// The region being captured
    pub async fn begin(
        &mut self,
        settings: &EncodingSettings,
        producer: FrameProducer,
    ) -> Result<Region, FrameSourceError> {
        if self.is_running() {
            return Err(FrameSourceError::AlreadyRunning);
        }

        let region = self.resolve_region(settings).await?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let interval = settings.frame_interval();

        info!(%region, fps = settings.frame_rate(), "starting capture loop");
        let task = tokio::spawn(run_capture_loop(
            Arc::clone(&self.capturer),
            region,
            interval,
            producer,
            stop_rx,
            self.events.clone(),
        ));

        self.stop_tx = Some(stop_tx);
        self.task = Some(task);
        Ok(region)
    }

    /// Signal the loop to stop and wait for it to finish.
    ///
    /// The in-flight capture is allowed to complete. When this returns the
    /// producer has been dropped, so the pipeline is closed.
    ///
    /// # Returns
    /// Number of frames pushed into the pipeline
    pub async fn end(&mut self) -> Result<u64, FrameSourceError> {
        let task = self.task.take().ok_or(FrameSourceError::NotRunning)?;
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        let frames = task
            .await
            .map_err(|e| FrameSourceError::TaskFailed(e.to_string()))?;
        debug!(frames, "capture loop stopped");
        Ok(frames)
    }
}

/// Sleep for `delay` unless a stop request arrives first.
/// Returns true when the loop should stop.
async fn sleep_or_stop(stop_rx: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        // Only `true` is ever sent, and a dropped sender also means stop
        _ = stop_rx.changed() => true,
    }
}

async fn run_capture_loop<C: ScreenCapturer>(
    capturer: Arc<C>,
    region: Region,
    interval: Duration,
    mut producer: FrameProducer,
    mut stop_rx: watch::Receiver<bool>,
    events: EventSender,
) -> u64 {
    let expected_len = region.area() as usize * BYTES_PER_PIXEL;
    let mut buffer = Vec::with_capacity(expected_len);
    let mut sequence = 0u64;
    let started = Instant::now();

    loop {
        if *stop_rx.borrow() {
            break;
        }
        let tick = Instant::now();

        match capturer.capture_region(region, &mut buffer).await {
            Ok(()) => {
                // Anything that finished capturing after the stop request is discarded
                if *stop_rx.borrow() {
                    break;
                }
                let next = sequence + 1;
                let frame = Frame::new(
                    next,
                    region.width,
                    region.height,
                    buffer.clone(),
                    Utc::now(),
                    started.elapsed(),
                );
                match frame {
                    Some(frame) => {
                        if producer.push(frame).await.is_err() {
                            debug!("pipeline closed, ending capture loop");
                            break;
                        }
                        sequence = next;
                    }
                    None => {
                        let message = format!(
                            "capture returned {} bytes, expected {} for {}x{}",
                            buffer.len(),
                            expected_len,
                            region.width,
                            region.height
                        );
                        warn!(%message, "discarding malformed capture");
                        let _ = events.send(SessionEvent::CaptureError { message });
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "capture failed, retrying");
                let _ = events.send(SessionEvent::CaptureError {
                    message: e.to_string(),
                });
                if sleep_or_stop(&mut stop_rx, CAPTURE_RETRY_DELAY).await {
                    break;
                }
                continue;
            }
        }

        // Sleep only the remainder; an overrun starts the next capture at once
        let remaining = interval.saturating_sub(tick.elapsed());
        if !remaining.is_zero() && sleep_or_stop(&mut stop_rx, remaining).await {
            break;
        }
    }

    sequence
}
