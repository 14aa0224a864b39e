//! Encoding configuration and outcomes

mod kind;
mod report;
mod settings;

pub use kind::StrategyKind;
pub use report::{Attempt, AttemptOutcome, DiagnosticReport, ReportStatus, REPORT_SUFFIX};
pub use settings::{
    clamp_frame_rate, ContainerFamily, EncodingSettings, QualityTier, DEFAULT_FRAME_RATE,
    MAX_FRAME_RATE, MIN_FRAME_RATE,
};
