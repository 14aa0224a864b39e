//! Diagnostic report written whenever a recording does not take its primary path

use std::fmt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use super::kind::StrategyKind;
use super::settings::QualityTier;

/// Suffix appended to the requested output path
pub const REPORT_SUFFIX: &str = ".report.txt";

/// Headline of a diagnostic report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    NoFrames,
    FallbackUsed,
    Failed,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoFrames => "No frames captured",
            Self::FallbackUsed => "Fallback used",
            Self::Failed => "Failed",
        };
        write!(f, "{}", text)
    }
}

/// Result of trying one strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed(String),
}

/// One strategy tried by the fallback cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub kind: StrategyKind,
    pub outcome: AttemptOutcome,
}

impl Attempt {
    pub fn succeeded(kind: StrategyKind) -> Self {
        Self {
            kind,
            outcome: AttemptOutcome::Succeeded,
        }
    }

    pub fn failed(kind: StrategyKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            outcome: AttemptOutcome::Failed(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == AttemptOutcome::Succeeded
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Succeeded => write!(f, "{}: ok", self.kind),
            AttemptOutcome::Failed(reason) => write!(f, "{}: failed - {}", self.kind, reason),
        }
    }
}

/// Plain-text record of what happened to a recording
#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    pub status: ReportStatus,
    pub reason: String,
    pub frame_count: u64,
    pub resolution: Option<(u32, u32)>,
    pub frame_rate: u32,
    pub quality: QualityTier,
    pub requested: PathBuf,
    pub produced: Option<PathBuf>,
    pub attempts: Vec<Attempt>,
    pub created: DateTime<Utc>,
}

impl DiagnosticReport {
    /// Report location for a requested output path: the full name plus `.report.txt`
    pub fn path_for(requested: &Path) -> PathBuf {
        let mut name = requested.as_os_str().to_owned();
        name.push(REPORT_SUFFIX);
        PathBuf::from(name)
    }

    /// Where this report is written
    pub fn path(&self) -> PathBuf {
        Self::path_for(&self.requested)
    }

    /// Render the report body
    pub fn render(&self) -> String {
        let mut out = String::new();
        let resolution = match self.resolution {
            Some((w, h)) => format!("{}x{}", w, h),
            None => "unknown".to_string(),
        };
        let produced = match &self.produced {
            Some(path) => path.display().to_string(),
            None => "none".to_string(),
        };

        // Writing into a String cannot fail
        let _ = writeln!(out, "Status: {}", self.status);
        let _ = writeln!(out, "Reason: {}", self.reason);
        let _ = writeln!(out, "Frames: {}", self.frame_count);
        let _ = writeln!(out, "Resolution: {}", resolution);
        let _ = writeln!(out, "Frame rate: {} fps", self.frame_rate);
        let _ = writeln!(out, "Quality: {}", self.quality);
        let _ = writeln!(out, "Requested: {}", self.requested.display());
        let _ = writeln!(out, "Produced: {}", produced);
        let _ = writeln!(out, "Attempts:");
        for (i, attempt) in self.attempts.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, attempt);
        }
        let _ = writeln!(
            out,
            "Created: {}",
            self.created.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DiagnosticReport {
        DiagnosticReport {
            status: ReportStatus::FallbackUsed,
            reason: "mp4: output missing or empty".to_string(),
            frame_count: 5,
            resolution: Some((640, 480)),
            frame_rate: 10,
            quality: QualityTier::High,
            requested: PathBuf::from("/tmp/rec.mp4"),
            produced: Some(PathBuf::from("/tmp/rec.avi")),
            attempts: vec![
                Attempt::failed(StrategyKind::Mp4, "output missing or empty"),
                Attempt::succeeded(StrategyKind::Avi),
            ],
            created: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn path_appends_suffix() {
        assert_eq!(
            DiagnosticReport::path_for(Path::new("/tmp/rec.mp4")),
            PathBuf::from("/tmp/rec.mp4.report.txt")
        );
    }

    #[test]
    fn render_is_deterministic() {
        let expected = "Status: Fallback used\n\
Reason: mp4: output missing or empty\n\
Frames: 5\n\
Resolution: 640x480\n\
Frame rate: 10 fps\n\
Quality: High\n\
Requested: /tmp/rec.mp4\n\
Produced: /tmp/rec.avi\n\
Attempts:\n  1. mp4: failed - output missing or empty\n  2. avi: ok\n\
Created: 2024-03-01T12:00:00Z\n";
        assert_eq!(sample().render(), expected);
    }

    #[test]
    fn render_without_output() {
        let mut report = sample();
        report.status = ReportStatus::NoFrames;
        report.resolution = None;
        report.produced = None;
        let text = report.render();
        assert!(text.starts_with("Status: No frames captured\n"));
        assert!(text.contains("Resolution: unknown\n"));
        assert!(text.contains("Produced: none\n"));
    }
}
