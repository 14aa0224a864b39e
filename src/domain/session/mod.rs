//! Recording session entity

mod session;

pub use session::{InvalidStateTransition, RecordingSession, SessionStatus};
