//! Recording session lifecycle

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::encoding::{ContainerFamily, DiagnosticReport, EncodingSettings};
use crate::domain::session::{InvalidStateTransition, RecordingSession, SessionStatus};

use super::events::{event_channel, EventReceiver, EventSender, SessionEvent};
use super::frame_source::{FrameSource, FrameSourceError};
use super::orchestrator::{FallbackOrchestrator, FallbackOutcome, FallbackStatus};
use super::pipeline::{FramePipeline, DEFAULT_PIPELINE_CAPACITY};
use super::ports::{
    EncodeError, EncodingStrategy, FrameCompressor, NotificationIcon, Notifier, ScreenCapturer,
};

/// Errors from the session controller
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Capture could not start: {0}")]
    Capture(#[from] FrameSourceError),

    #[error("No encoding strategy accepted the recording: {0}")]
    Encode(#[from] EncodeError),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("No recording in progress")]
    NotRecording,
}

/// Final summary of a stopped recording
#[derive(Debug, Clone)]
pub struct RecordingSummary {
    pub session: RecordingSession,
    pub outcome: FallbackOutcome,
}

/// Controller options
#[derive(Debug, Clone, Default)]
pub struct ControllerConfig {
    /// Show desktop notifications on start and stop
    pub enable_notify: bool,
    /// Frames allowed to queue between capture and encoding
    pub pipeline_capacity: Option<usize>,
}

struct ActiveRecording<S: EncodingStrategy> {
    consumer: JoinHandle<FallbackOrchestrator<S>>,
}

/// Owns one recording at a time: capture loop, pipeline, encoder cascade.
///
/// Events are published on a channel owned by the controller; take the
/// receiving end with `take_events` before starting. A receiver nobody
/// took is dropped when recording starts.
pub struct SessionController<C, S, N>
where
    C: ScreenCapturer + 'static,
    S: EncodingStrategy + 'static,
    N: Notifier,
{
    source: FrameSource<C>,
    compressor: Arc<dyn FrameCompressor>,
    notifier: N,
    config: ControllerConfig,
    events: EventSender,
    receiver: Option<EventReceiver>,
    session: Arc<Mutex<RecordingSession>>,
    active: Option<ActiveRecording<S>>,
}

impl<C, S, N> SessionController<C, S, N>
where
    C: ScreenCapturer + 'static,
    S: EncodingStrategy + 'static,
    N: Notifier,
{
    pub fn new(
        capturer: Arc<C>,
        compressor: Arc<dyn FrameCompressor>,
        notifier: N,
        config: ControllerConfig,
    ) -> Self {
        let (events, receiver) = event_channel();
        Self {
            source: FrameSource::new(capturer, events.clone()),
            compressor,
            notifier,
            config,
            events,
            receiver: Some(receiver),
            session: Arc::new(Mutex::new(RecordingSession::new())),
            active: None,
        }
    }

    /// Take the event stream. Only the first call returns it, and only
    /// before the first recording starts.
    pub fn take_events(&mut self) -> Option<EventReceiver> {
        self.receiver.take()
    }

    /// Snapshot of the current session
    pub async fn session(&self) -> RecordingSession {
        self.session.lock().await.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        self.session.lock().await.status()
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Start recording with `strategies` as the cascade, most preferred first.
    ///
    /// A retired session is replaced by a fresh one. If either the encoder
    /// cascade or the capture loop fails to begin, the other is rolled
    /// back and the session moves to Error.
    ///
    /// # Returns
    /// The output path chosen by the accepting strategy
    pub async fn start(
        &mut self,
        settings: &EncodingSettings,
        strategies: Vec<S>,
    ) -> Result<PathBuf, SessionError> {
        {
            let mut session = self.session.lock().await;
            if session.status().is_terminal() {
                *session = RecordingSession::new();
            }
            if session.status() != SessionStatus::Ready {
                return Err(SessionError::InvalidState(InvalidStateTransition {
                    current_state: session.status(),
                    action: "start recording".to_string(),
                }));
            }
        }

        // Unread events would otherwise pile up for the whole session
        if self.receiver.take().is_some() {
            debug!("event stream was never taken, dropping it");
        }

        let requested = resolve_output_path(settings, Utc::now());
        let mut orchestrator = FallbackOrchestrator::new(strategies, Arc::clone(&self.compressor));
        let output_path = match orchestrator.begin(&requested, settings).await {
            Ok(path) => path,
            Err(e) => {
                self.fail(&e.to_string()).await;
                return Err(e.into());
            }
        };

        let capacity = self.config.pipeline_capacity.unwrap_or(DEFAULT_PIPELINE_CAPACITY);
        let (producer, mut consumer) = FramePipeline::bounded(capacity);
        if let Err(e) = self.source.begin(settings, producer).await {
            orchestrator.abandon();
            self.fail(&e.to_string()).await;
            return Err(e.into());
        }

        let (session_id, name, started_at) = {
            let mut session = self.session.lock().await;
            session.start_recording(output_path.clone())?;
            (session.id(), session.name().to_string(), session.start_time())
        };
        info!(%session_id, path = %output_path.display(), "recording started");
        self.emit(SessionEvent::RecordingStarted {
            session_id,
            name,
            started_at,
            output_path: output_path.clone(),
        });

        let session = Arc::clone(&self.session);
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            while let Some(frame) = consumer.next().await {
                let sequence = frame.sequence();
                if let Err(e) = orchestrator.submit(frame).await {
                    debug!(sequence, error = %e, "frame skipped");
                    let _ = events.send(SessionEvent::FrameError {
                        sequence,
                        message: e.to_string(),
                    });
                }

                let frame_count = orchestrator.frame_count();
                let byte_size = orchestrator.buffered_bytes();
                let elapsed = {
                    let mut session = session.lock().await;
                    session.record_progress(frame_count, byte_size);
                    session.elapsed()
                };
                let _ = events.send(SessionEvent::RecordingProgress {
                    elapsed,
                    byte_size,
                    frame_count,
                });
            }
            orchestrator
        });
        self.active = Some(ActiveRecording { consumer: task });

        if self.config.enable_notify {
            let _ = self
                .notifier
                .notify("ScreenReel", "Recording started", NotificationIcon::Recording)
                .await;
        }

        Ok(output_path)
    }

    /// Pause. Capture continues; paused time is left out of the elapsed clock.
    pub async fn pause(&mut self) -> Result<(), SessionError> {
        self.session.lock().await.pause()?;
        self.emit(SessionEvent::RecordingPaused);
        Ok(())
    }

    pub async fn resume(&mut self) -> Result<(), SessionError> {
        self.session.lock().await.resume()?;
        self.emit(SessionEvent::RecordingResumed);
        Ok(())
    }

    /// Stop and finalize the recording.
    ///
    /// Phase one stops the capture loop and waits for it; phase two lets
    /// the encoder drain the closed pipeline and then finalizes on a
    /// worker task. Finalization is not bounded by a timeout.
    pub async fn stop(&mut self) -> Result<RecordingSummary, SessionError> {
        self.session.lock().await.begin_stopping()?;
        let active = self.active.take().ok_or(SessionError::NotRecording)?;

        if let Err(e) = self.source.end().await {
            // The capture task died; its producer is gone either way
            warn!(error = %e, "capture loop ended abnormally");
        }

        let mut orchestrator = match active.consumer.await {
            Ok(orchestrator) => orchestrator,
            Err(e) => {
                let message = format!("encoder task failed: {}", e);
                self.fail(&message).await;
                return Err(SessionError::TaskFailed(message));
            }
        };

        let finalize = tokio::spawn(async move { orchestrator.end().await });
        let outcome = match finalize.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!("finalization task failed: {}", e);
                self.fail(&message).await;
                return Err(SessionError::TaskFailed(message));
            }
        };

        self.finish(outcome).await
    }

    /// Stop capturing and discard everything; no output is produced
    pub async fn cancel(&mut self) -> Result<(), SessionError> {
        self.session.lock().await.cancel()?;
        if let Some(active) = self.active.take() {
            let _ = self.source.end().await;
            if let Ok(mut orchestrator) = active.consumer.await {
                orchestrator.abandon();
            }
        }
        info!("recording cancelled");
        Ok(())
    }

    async fn finish(&mut self, outcome: FallbackOutcome) -> Result<RecordingSummary, SessionError> {
        let byte_size = match &outcome.output {
            Some(path) => tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0),
            None => 0,
        };

        if outcome.status == FallbackStatus::FallbackUsed {
            if let Some(report) = &outcome.report {
                let requested = self
                    .session
                    .lock()
                    .await
                    .output_path()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                self.emit(SessionEvent::FallbackUsed {
                    requested,
                    produced: outcome.output.clone(),
                    report: report.clone(),
                });
            }
        }

        let session = {
            let mut session = self.session.lock().await;
            if outcome.status == FallbackStatus::Exhausted {
                session.fail("every encoding strategy failed")?;
            } else {
                // With no frames the report is the only artifact
                let produced = outcome
                    .output
                    .clone()
                    .or_else(|| outcome.report.clone())
                    .unwrap_or_default();
                session.complete(produced, byte_size)?;
            }
            session.clone()
        };

        match session.status() {
            SessionStatus::Completed => {
                let output_path = session.output_path().map(Path::to_path_buf).unwrap_or_default();
                info!(path = %output_path.display(), bytes = byte_size, "recording stopped");
                self.emit(SessionEvent::RecordingStopped {
                    session_id: session.id(),
                    ended_at: session.end_time().unwrap_or_else(Utc::now),
                    output_path: output_path.clone(),
                    duration: session.elapsed(),
                });
                if self.config.enable_notify {
                    let _ = self
                        .notifier
                        .notify(
                            "ScreenReel",
                            &format!("Saved {}", output_path.display()),
                            NotificationIcon::Success,
                        )
                        .await;
                }
            }
            _ => {
                let message = session.error().unwrap_or("recording failed").to_string();
                error!(%message, "recording failed");
                self.emit(SessionEvent::RecordingError { message: message.clone() });
                if self.config.enable_notify {
                    let _ = self
                        .notifier
                        .notify("ScreenReel", &message, NotificationIcon::Error)
                        .await;
                }
            }
        }

        Ok(RecordingSummary { session, outcome })
    }

    async fn fail(&self, message: &str) {
        error!(%message, "recording could not start");
        let _ = self.session.lock().await.fail(message);
        self.emit(SessionEvent::RecordingError {
            message: message.to_string(),
        });
    }
}

/// Pick a fresh output path in the settings' directory.
///
/// Uses the configured base name, or a timestamp when none is set, with
/// the container family's extension. A name is taken when any artifact a
/// strategy could leave for it exists: a file with any family's extension,
/// its diagnostic report, or the `_frames` directory. Taken names get
/// `_1`, `_2`, ...
pub fn resolve_output_path(settings: &EncodingSettings, now: DateTime<Utc>) -> PathBuf {
    let base = if settings.file_name.trim().is_empty() {
        format!(
            "recording_{}",
            now.with_timezone(&Local).format("%Y%m%d_%H%M%S")
        )
    } else {
        settings.file_name.trim().to_string()
    };
    let extension = settings.container.extension();

    let taken = |stem: &str| {
        settings.output_dir.join(format!("{}_frames", stem)).exists()
            || ContainerFamily::ALL.iter().any(|family| {
                let artifact = settings.output_dir.join(format!("{}.{}", stem, family.extension()));
                artifact.exists() || DiagnosticReport::path_for(&artifact).exists()
            })
    };

    if !taken(&base) {
        return settings.output_dir.join(format!("{}.{}", base, extension));
    }
    let stem = (1u32..)
        .map(|n| format!("{}_{}", base, n))
        .find(|stem| !taken(stem))
        .unwrap_or(base);
    settings.output_dir.join(format!("{}.{}", stem, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_uses_name_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EncodingSettings::new(dir.path()).with_file_name("demo");
        assert_eq!(
            resolve_output_path(&settings, Utc::now()),
            dir.path().join("demo.mp4")
        );
    }

    #[test]
    fn output_path_avoids_collisions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("demo.gif"), b"x").unwrap();
        std::fs::write(dir.path().join("demo_1.gif"), b"x").unwrap();
        let settings = EncodingSettings::new(dir.path())
            .with_file_name("demo")
            .with_container(ContainerFamily::Gif);
        assert_eq!(
            resolve_output_path(&settings, Utc::now()),
            dir.path().join("demo_2.gif")
        );
    }

    #[test]
    fn frame_directories_count_as_collisions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("demo_frames")).unwrap();
        let settings = EncodingSettings::new(dir.path()).with_file_name("demo");
        assert_eq!(
            resolve_output_path(&settings, Utc::now()),
            dir.path().join("demo_1.mp4")
        );
    }

    #[test]
    fn fallback_artifacts_count_as_collisions() {
        let dir = tempfile::tempdir().unwrap();
        // An earlier mp4 request that fell back to avi
        std::fs::write(dir.path().join("demo.avi"), b"RIFF").unwrap();
        std::fs::write(dir.path().join("demo.mp4.report.txt"), b"Status").unwrap();
        // An earlier request that produced only a report
        std::fs::write(dir.path().join("demo_1.gif.report.txt"), b"Status").unwrap();
        let settings = EncodingSettings::new(dir.path()).with_file_name("demo");
        assert_eq!(
            resolve_output_path(&settings, Utc::now()),
            dir.path().join("demo_2.mp4")
        );
    }

    #[test]
    fn output_path_defaults_to_timestamp() {
        let settings = EncodingSettings::new("/nonexistent");
        let path = resolve_output_path(&settings, Utc::now());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("recording_"));
        assert!(name.ends_with(".mp4"));
    }
}
