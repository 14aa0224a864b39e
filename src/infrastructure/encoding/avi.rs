//! Built-in MJPEG-in-AVI strategy

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::ports::{EncodeError, EncodingStrategy, EndOutcome};
use crate::domain::capture::{CompressedFrame, Frame};
use crate::domain::encoding::{EncodingSettings, StrategyKind};
use crate::infrastructure::container::AviRiffWriter;

use super::buffer::{blocking, prepare_output, write_placeholder, ActiveOutput, JpegBuffer};

#[derive(Debug, Default)]
pub struct AviStrategy {
    active: Option<ActiveOutput>,
    buffer: JpegBuffer,
}

impl AviStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EncodingStrategy for AviStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Avi
    }

    async fn begin(&mut self, path: &Path, settings: &EncodingSettings) -> Result<PathBuf, EncodeError> {
        if self.active.is_some() {
            return Err(EncodeError::AlreadyActive);
        }
        let output = prepare_output(path, self.kind().extension()).await?;
        self.buffer.reset(settings.quality);
        self.active = Some(ActiveOutput {
            requested: path.to_path_buf(),
            output: output.clone(),
            settings: settings.clone(),
        });
        Ok(output)
    }

    async fn submit(&mut self, frame: &Frame) -> Result<(), EncodeError> {
        if self.active.is_none() {
            return Ok(());
        }
        self.buffer.push(frame).await
    }

    async fn submit_compressed(&mut self, frame: &CompressedFrame) -> Result<(), EncodeError> {
        if self.active.is_none() {
            return Ok(());
        }
        self.buffer.push_compressed(frame)
    }

    async fn end(&mut self) -> Result<EndOutcome, EncodeError> {
        let active = self.active.take().ok_or(EncodeError::NotActive)?;
        let Some((width, height)) = self.buffer.dimensions() else {
            self.buffer.take();
            return write_placeholder(&active).await;
        };
        let frames = self.buffer.take();
        let frame_rate = active.settings.frame_rate();
        debug!(frames = frames.len(), width, height, "writing avi");

        let bytes = blocking(move || Ok(AviRiffWriter::new(width, height, frame_rate).write(&frames)?)).await?;
        fs::write(&active.output, bytes).await?;
        Ok(EndOutcome::Container(active.output))
    }

    fn abandon(&mut self) {
        self.active = None;
        self.buffer.take();
    }

    fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn buffered_bytes(&self) -> u64 {
        self.buffer.bytes()
    }
}
