//! Recording session state machine

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    #[default]
    Ready,
    Recording,
    Paused,
    Stopping,
    Completed,
    Error,
    Cancelled,
}

impl SessionStatus {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }

    /// Completed, Error and Cancelled accept no further transitions
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }

    /// Recording or Paused
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: SessionStatus,
    pub action: String,
}

/// One recording, from start request to retirement.
///
/// State machine:
///   READY -> RECORDING (start_recording)
///   RECORDING <-> PAUSED (pause / resume)
///   RECORDING | PAUSED -> STOPPING (begin_stopping)
///   STOPPING -> COMPLETED (complete)
///   RECORDING | PAUSED | STOPPING -> CANCELLED (cancel)
///   any non-terminal -> ERROR (fail)
///
/// A retired session is never restarted; the next recording needs a new one.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    id: Uuid,
    name: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    status: SessionStatus,
    output_path: Option<PathBuf>,
    byte_size: u64,
    frame_count: u64,
    paused_duration: Duration,
    paused_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl RecordingSession {
    /// Create a new session in ready state with a timestamped display name
    pub fn new() -> Self {
        let now = Utc::now();
        let name = format!(
            "Recording {}",
            now.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
        Self::with_name(name)
    }

    /// Create a new session in ready state
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_time: Utc::now(),
            end_time: None,
            status: SessionStatus::Ready,
            output_path: None,
            byte_size: 0,
            frame_count: 0,
            paused_duration: Duration::ZERO,
            paused_at: None,
            error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Resolved output path; after completion, the file actually produced
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn paused_duration(&self) -> Duration {
        self.paused_duration
    }

    /// Failure reason when the session ended in error
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Recording time at `now`, excluding paused intervals
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        let end = self.end_time.unwrap_or(now);
        let wall = (end - self.start_time).to_std().unwrap_or_default();
        let open_pause = match self.paused_at {
            Some(paused_at) => (end - paused_at).to_std().unwrap_or_default(),
            None => Duration::ZERO,
        };
        wall.saturating_sub(self.paused_duration + open_pause)
    }

    /// Recording time so far (or total, once ended)
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Utc::now())
    }

    fn invalid(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.status,
            action: action.to_string(),
        }
    }

    /// Transition from READY to RECORDING
    pub fn start_recording(&mut self, output_path: PathBuf) -> Result<(), InvalidStateTransition> {
        if self.status != SessionStatus::Ready {
            return Err(self.invalid("start recording"));
        }
        self.status = SessionStatus::Recording;
        self.start_time = Utc::now();
        self.output_path = Some(output_path);
        Ok(())
    }

    /// Transition from RECORDING to PAUSED
    pub fn pause(&mut self) -> Result<(), InvalidStateTransition> {
        if self.status != SessionStatus::Recording {
            return Err(self.invalid("pause"));
        }
        self.status = SessionStatus::Paused;
        self.paused_at = Some(Utc::now());
        Ok(())
    }

    /// Transition from PAUSED to RECORDING
    pub fn resume(&mut self) -> Result<(), InvalidStateTransition> {
        if self.status != SessionStatus::Paused {
            return Err(self.invalid("resume"));
        }
        self.close_pause(Utc::now());
        self.status = SessionStatus::Recording;
        Ok(())
    }

    /// Transition from RECORDING or PAUSED to STOPPING
    pub fn begin_stopping(&mut self) -> Result<(), InvalidStateTransition> {
        if !self.status.is_live() {
            return Err(self.invalid("stop"));
        }
        let now = Utc::now();
        self.close_pause(now);
        self.end_time = Some(now);
        self.status = SessionStatus::Stopping;
        Ok(())
    }

    /// Transition from STOPPING to COMPLETED, recording the produced file
    pub fn complete(
        &mut self,
        output_path: PathBuf,
        byte_size: u64,
    ) -> Result<(), InvalidStateTransition> {
        if self.status != SessionStatus::Stopping {
            return Err(self.invalid("complete"));
        }
        self.output_path = Some(output_path);
        self.byte_size = byte_size;
        self.status = SessionStatus::Completed;
        Ok(())
    }

    /// Transition from any live state to CANCELLED
    pub fn cancel(&mut self) -> Result<(), InvalidStateTransition> {
        if !self.status.is_live() && self.status != SessionStatus::Stopping {
            return Err(self.invalid("cancel"));
        }
        let now = Utc::now();
        self.close_pause(now);
        self.end_time.get_or_insert(now);
        self.status = SessionStatus::Cancelled;
        Ok(())
    }

    /// Transition from any non-terminal state to ERROR
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), InvalidStateTransition> {
        if self.status.is_terminal() {
            return Err(self.invalid("fail"));
        }
        let now = Utc::now();
        self.close_pause(now);
        self.end_time.get_or_insert(now);
        self.error = Some(reason.into());
        self.status = SessionStatus::Error;
        Ok(())
    }

    /// Record frame arrival totals
    pub fn record_progress(&mut self, frame_count: u64, byte_size: u64) {
        self.frame_count = frame_count;
        self.byte_size = byte_size;
    }

    fn close_pause(&mut self, now: DateTime<Utc>) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_duration += (now - paused_at).to_std().unwrap_or_default();
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}
