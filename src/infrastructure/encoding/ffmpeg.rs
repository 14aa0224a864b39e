//! External encoder strategy (ffmpeg, H.264)

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use crate::application::ports::{EncodeError, EncodingStrategy, EndOutcome};
use crate::domain::capture::{CompressedFrame, Frame, ImageFormat};
use crate::domain::encoding::{EncodingSettings, StrategyKind};
use crate::infrastructure::codec::FrameCodec;
use crate::infrastructure::container::image_sequence::frame_file_name;

use super::buffer::{prepare_output, write_placeholder, ActiveOutput};

const FFMPEG: &str = "ffmpeg";

/// Stages JPEG frames on disk and hands them to `ffmpeg` at `end`
#[derive(Debug)]
pub struct FfmpegStrategy {
    program: String,
    active: Option<ActiveOutput>,
    staging: Option<TempDir>,
    staged: usize,
    bytes: u64,
}

impl Default for FfmpegStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegStrategy {
    pub fn new() -> Self {
        Self::with_program(FFMPEG)
    }

    /// Use a specific ffmpeg binary
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            active: None,
            staging: None,
            staged: 0,
            bytes: 0,
        }
    }

    /// Capability probe: `ffmpeg -version` must run and succeed
    pub async fn probe(&self) -> Result<(), EncodeError> {
        let status = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncodeError::Unsuitable(format!("{} not found in PATH", self.program))
                } else {
                    EncodeError::Unsuitable(format!("{} could not be started: {}", self.program, e))
                }
            })?;
        if !status.success() {
            return Err(EncodeError::Unsuitable(format!(
                "{} -version exited with {}",
                self.program, status
            )));
        }
        Ok(())
    }

    /// Arguments turning the staged images into an H.264 MP4
    pub fn build_args(staging: &Path, output: &Path, settings: &EncodingSettings) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-framerate".to_string(),
            settings.frame_rate().to_string(),
            "-i".to_string(),
            staging.join("frame_%06d.jpg").to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-crf".to_string(),
            settings.quality.crf().to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            // yuv420p needs even dimensions
            "-vf".to_string(),
            "scale=trunc(iw/2)*2:trunc(ih/2)*2".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    async fn stage(&mut self, compressed: &CompressedFrame) -> Result<(), EncodeError> {
        let Some(staging) = &self.staging else {
            return Ok(());
        };
        // image2 input needs contiguous numbering, independent of capture sequence
        let file = staging.path().join(frame_file_name(self.staged + 1, "jpg"));
        fs::write(file, compressed.data()).await?;
        self.staged += 1;
        self.bytes += compressed.len() as u64;
        Ok(())
    }

    fn reset(&mut self) {
        self.active = None;
        self.staging = None;
        self.staged = 0;
        self.bytes = 0;
    }
}

#[async_trait]
impl EncodingStrategy for FfmpegStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::External
    }

    async fn begin(&mut self, path: &Path, settings: &EncodingSettings) -> Result<PathBuf, EncodeError> {
        if self.active.is_some() {
            return Err(EncodeError::AlreadyActive);
        }
        self.probe().await?;

        let staging = tempfile::Builder::new().prefix("screenreel-").tempdir()?;
        let output = prepare_output(path, self.kind().extension()).await?;
        debug!(staging = %staging.path().display(), "staging frames for ffmpeg");
        self.staging = Some(staging);
        self.staged = 0;
        self.bytes = 0;
        self.active = Some(ActiveOutput {
            requested: path.to_path_buf(),
            output: output.clone(),
            settings: settings.clone(),
        });
        Ok(output)
    }

    async fn submit(&mut self, frame: &Frame) -> Result<(), EncodeError> {
        let Some(active) = &self.active else {
            return Ok(());
        };
        let compressed = FrameCodec::jpeg(active.settings.quality).compress(frame).await?;
        self.stage(&compressed).await
    }

    async fn submit_compressed(&mut self, frame: &CompressedFrame) -> Result<(), EncodeError> {
        if self.active.is_none() {
            return Ok(());
        }
        if frame.format() != ImageFormat::Jpeg {
            return Err(EncodeError::FrameEncode("ffmpeg staging expects JPEG payloads".to_string()));
        }
        self.stage(frame).await
    }

    async fn end(&mut self) -> Result<EndOutcome, EncodeError> {
        let active = self.active.take().ok_or(EncodeError::NotActive)?;
        let staging = self.staging.take();
        let staged = self.staged;
        self.reset();

        let Some(staging) = staging.filter(|_| staged > 0) else {
            return write_placeholder(&active).await;
        };

        let args = Self::build_args(staging.path(), &active.output, &active.settings);
        info!(frames = staged, path = %active.output.display(), "running external encoder");
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EncodeError::Io(std::io::Error::other(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            ))));
        }
        Ok(EndOutcome::Container(active.output))
    }

    fn abandon(&mut self) {
        self.reset();
    }

    fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn buffered_bytes(&self) -> u64 {
        self.bytes
    }
}
