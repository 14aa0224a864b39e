//! Fallback cascade over encoding strategies

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::capture::{CompressedFrame, Frame};
use crate::domain::encoding::{
    Attempt, DiagnosticReport, EncodingSettings, ReportStatus, StrategyKind,
};

use super::ports::{EncodeError, EncodingStrategy, EndOutcome, FrameCompressor};

/// How a recording ended up on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStatus {
    /// The first strategy of the cascade produced the output
    Primary,
    /// A later strategy produced the output
    FallbackUsed,
    /// Nothing was captured; only a diagnostic report exists
    NoFrames,
    /// Every strategy failed; only a diagnostic report exists
    Exhausted,
}

/// Result of finalizing a recording
#[derive(Debug, Clone)]
pub struct FallbackOutcome {
    pub status: FallbackStatus,
    /// Produced artifact, absent for `NoFrames` and `Exhausted`
    pub output: Option<PathBuf>,
    /// Diagnostic report, written for every non-primary outcome
    pub report: Option<PathBuf>,
    pub attempts: Vec<Attempt>,
    pub frame_count: u64,
}

impl FallbackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, FallbackStatus::Primary | FallbackStatus::FallbackUsed)
    }
}

/// Runs an ordered list of strategies until one yields a non-empty file.
///
/// Each frame is compressed to JPEG once, journaled, and handed to the
/// active strategy as that same payload. When the active strategy refuses
/// or fails, the next one is begun and replayed the identical sequence.
/// The journal never holds raw pixels, and its payloads share storage with
/// the buffers of the JPEG strategies. Strategies are only ever driven one
/// at a time and never revisited once they have failed.
pub struct FallbackOrchestrator<S: EncodingStrategy> {
    strategies: Vec<S>,
    compressor: Arc<dyn FrameCompressor>,
    active: usize,
    journal: Vec<CompressedFrame>,
    journal_bytes: u64,
    attempts: Vec<Attempt>,
    requested: PathBuf,
    settings: Option<EncodingSettings>,
    resolution: Option<(u32, u32)>,
}

impl<S: EncodingStrategy> FallbackOrchestrator<S> {
    /// Create an orchestrator over strategies ordered most- to least-preferred
    pub fn new(strategies: Vec<S>, compressor: Arc<dyn FrameCompressor>) -> Self {
        Self {
            strategies,
            compressor,
            active: 0,
            journal: Vec::new(),
            journal_bytes: 0,
            attempts: Vec::new(),
            requested: PathBuf::new(),
            settings: None,
            resolution: None,
        }
    }

    /// Variants in cascade order
    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Currently active strategy, if any is left
    pub fn active_kind(&self) -> Option<StrategyKind> {
        self.strategies.get(self.active).map(|s| s.kind())
    }

    /// Frames submitted so far
    pub fn frame_count(&self) -> u64 {
        self.journal.len() as u64
    }

    /// Payload bytes held for replay
    pub fn journal_bytes(&self) -> u64 {
        self.journal_bytes
    }

    /// Compressed bytes buffered by the active strategy
    pub fn buffered_bytes(&self) -> u64 {
        self.strategies
            .get(self.active)
            .map(|s| s.buffered_bytes())
            .unwrap_or(0)
    }

    /// Attempts recorded so far
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Begin the first strategy that accepts the recording.
    ///
    /// # Returns
    /// The output path normalized by the strategy that accepted
    pub async fn begin(
        &mut self,
        path: &Path,
        settings: &EncodingSettings,
    ) -> Result<PathBuf, EncodeError> {
        if self.settings.is_some() {
            return Err(EncodeError::AlreadyActive);
        }
        self.requested = path.to_path_buf();
        self.settings = Some(settings.clone());
        self.active = 0;

        let mut last_error = None;
        while self.active < self.strategies.len() {
            let strategy = &mut self.strategies[self.active];
            match strategy.begin(path, settings).await {
                Ok(normalized) => {
                    info!(strategy = %strategy.kind(), path = %normalized.display(), "strategy begun");
                    return Ok(normalized);
                }
                Err(e) => {
                    warn!(strategy = %strategy.kind(), error = %e, "strategy refused to begin");
                    self.attempts.push(Attempt::failed(strategy.kind(), e.to_string()));
                    last_error = Some(e);
                    self.active += 1;
                }
            }
        }

        self.settings = None;
        Err(last_error.unwrap_or_else(|| EncodeError::Unsuitable("no strategies configured".to_string())))
    }

    /// Compress a frame, journal it and hand it to the active strategy.
    ///
    /// A strategy failure advances the cascade. Only frame-local
    /// compression failures are returned; the session carries on after them.
    pub async fn submit(&mut self, frame: Frame) -> Result<(), EncodeError> {
        let Some(quality) = self.settings.as_ref().map(|s| s.quality) else {
            return Ok(());
        };
        let compressed = self.compressor.compress(&frame, quality).await?;
        if self.resolution.is_none() {
            self.resolution = Some((frame.width(), frame.height()));
        }
        self.journal_bytes += compressed.len() as u64;
        self.journal.push(compressed);
        let index = self.journal.len() - 1;

        while let Some(strategy) = self.strategies.get_mut(self.active) {
            match strategy.submit_compressed(&self.journal[index]).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_frame_local() => return Err(e),
                Err(e) => {
                    // The replay inside advance() already covers this frame
                    self.fail_active(e.to_string());
                    if self.advance().await {
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    /// Finalize, falling back through the cascade until an output exists.
    ///
    /// Never fails: total failure is reported as `FallbackStatus::Exhausted`
    /// together with a diagnostic report.
    pub async fn end(&mut self) -> FallbackOutcome {
        let Some(settings) = self.settings.clone() else {
            return self.outcome(FallbackStatus::Exhausted, None, None);
        };

        while let Some(strategy) = self.strategies.get_mut(self.active) {
            let kind = strategy.kind();
            let failure = match strategy.end().await {
                Ok(EndOutcome::Placeholder(path)) => {
                    debug!(strategy = %kind, path = %path.display(), "no frames, placeholder written");
                    self.attempts.push(Attempt::succeeded(kind));
                    let report = self
                        .write_report(&settings, ReportStatus::NoFrames, "No frames captured".to_string(), None)
                        .await;
                    return self.outcome(FallbackStatus::NoFrames, None, report);
                }
                Ok(EndOutcome::Container(path)) => match file_len(&path).await {
                    Some(len) if len > 0 => {
                        info!(strategy = %kind, path = %path.display(), bytes = len, "output written");
                        self.attempts.push(Attempt::succeeded(kind));
                        return self.finish_success(&settings, path).await;
                    }
                    _ => "output missing or empty".to_string(),
                },
                Err(e) => e.to_string(),
            };

            warn!(strategy = %kind, reason = %failure, "strategy failed to finalize");
            self.fail_active(failure);
            self.advance().await;
        }

        let reason = self
            .attempts
            .last()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "no strategies configured".to_string());
        warn!(%reason, "fallback cascade exhausted");
        let report = self
            .write_report(&settings, ReportStatus::Failed, reason, None)
            .await;
        self.outcome(FallbackStatus::Exhausted, None, report)
    }

    /// Drop every strategy's buffers without producing output
    pub fn abandon(&mut self) {
        for strategy in &mut self.strategies {
            if strategy.is_active() {
                strategy.abandon();
            }
        }
        self.journal.clear();
        self.journal_bytes = 0;
        self.settings = None;
    }

    async fn finish_success(&mut self, settings: &EncodingSettings, output: PathBuf) -> FallbackOutcome {
        let primary = self.active == 0 && self.attempts.len() == 1;
        if primary {
            return self.outcome(FallbackStatus::Primary, Some(output), None);
        }

        let reason = self
            .attempts
            .iter()
            .find(|a| !a.is_success())
            .map(|a| a.to_string())
            .unwrap_or_default();
        let report = self
            .write_report(settings, ReportStatus::FallbackUsed, reason, Some(output.clone()))
            .await;
        self.outcome(FallbackStatus::FallbackUsed, Some(output), report)
    }

    fn fail_active(&mut self, reason: String) {
        if let Some(strategy) = self.strategies.get_mut(self.active) {
            self.attempts.push(Attempt::failed(strategy.kind(), reason));
            strategy.abandon();
        }
    }

    /// Move to the next strategy that begins and accepts the journal replay.
    /// Returns false when the cascade is exhausted.
    async fn advance(&mut self) -> bool {
        let Some(settings) = self.settings.clone() else {
            return false;
        };

        'next: loop {
            self.active += 1;
            let Some(strategy) = self.strategies.get_mut(self.active) else {
                return false;
            };
            let kind = strategy.kind();

            if let Err(e) = strategy.begin(&self.requested, &settings).await {
                warn!(strategy = %kind, error = %e, "fallback strategy refused to begin");
                self.attempts.push(Attempt::failed(kind, e.to_string()));
                continue;
            }

            info!(strategy = %kind, frames = self.journal.len(), "replaying frames into fallback strategy");
            for frame in &self.journal {
                match strategy.submit_compressed(frame).await {
                    Ok(()) => {}
                    Err(e) if e.is_frame_local() => {
                        debug!(sequence = frame.sequence(), error = %e, "frame skipped during replay");
                    }
                    Err(e) => {
                        warn!(strategy = %kind, error = %e, "fallback strategy failed during replay");
                        self.attempts.push(Attempt::failed(kind, e.to_string()));
                        strategy.abandon();
                        continue 'next;
                    }
                }
            }
            return true;
        }
    }

    async fn write_report(
        &self,
        settings: &EncodingSettings,
        status: ReportStatus,
        reason: String,
        produced: Option<PathBuf>,
    ) -> Option<PathBuf> {
        let report = DiagnosticReport {
            status,
            reason,
            frame_count: self.frame_count(),
            resolution: self.resolution,
            frame_rate: settings.frame_rate(),
            quality: settings.quality,
            requested: self.requested.clone(),
            produced,
            attempts: self.attempts.clone(),
            created: Utc::now(),
        };
        write_report(report).await
    }

    fn outcome(
        &self,
        status: FallbackStatus,
        output: Option<PathBuf>,
        report: Option<PathBuf>,
    ) -> FallbackOutcome {
        FallbackOutcome {
            status,
            output,
            report,
            attempts: self.attempts.clone(),
            frame_count: self.frame_count(),
        }
    }
}

async fn write_report(report: DiagnosticReport) -> Option<PathBuf> {
    let path = report.path();
    match tokio::fs::write(&path, report.render()).await {
        Ok(()) => Some(path),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to write diagnostic report");
            None
        }
    }
}

async fn file_len(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path).await.ok().map(|m| m.len())
}
