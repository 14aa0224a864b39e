//! Notifications emitted by a recording session

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Lifecycle and progress notifications, delivered in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A capture attempt failed; the loop retries
    CaptureError { message: String },
    /// A frame could not be compressed; it is skipped
    FrameError { sequence: u64, message: String },
    RecordingStarted {
        session_id: Uuid,
        name: String,
        started_at: DateTime<Utc>,
        output_path: PathBuf,
    },
    RecordingProgress {
        elapsed: Duration,
        byte_size: u64,
        frame_count: u64,
    },
    RecordingPaused,
    RecordingResumed,
    /// The preferred strategy did not produce the output
    FallbackUsed {
        requested: PathBuf,
        produced: Option<PathBuf>,
        report: PathBuf,
    },
    RecordingStopped {
        session_id: Uuid,
        ended_at: DateTime<Utc>,
        output_path: PathBuf,
        duration: Duration,
    },
    RecordingError { message: String },
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Create the channel a controller publishes its events on
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
