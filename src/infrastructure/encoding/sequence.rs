//! Degraded strategies: numbered images with a manifest, or an HTML player

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{EncodeError, EncodingStrategy, EndOutcome};
use crate::domain::capture::{CompressedFrame, Frame};
use crate::domain::encoding::{EncodingSettings, StrategyKind};
use crate::infrastructure::container::{
    frames_dir, HtmlSequenceWriter, ImageSequenceWriter, MANIFEST_NAME,
};

use super::buffer::{ensure_parent, prepare_output, write_placeholder, ActiveOutput, JpegBuffer};

/// `<stem>_frames/frame_NNNNNN.jpg` plus `<stem>_frames/manifest.json`
#[derive(Debug, Default)]
pub struct ImageSequenceStrategy {
    active: Option<ActiveOutput>,
    buffer: JpegBuffer,
}

impl ImageSequenceStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EncodingStrategy for ImageSequenceStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ImageSequence
    }

    async fn begin(&mut self, path: &Path, settings: &EncodingSettings) -> Result<PathBuf, EncodeError> {
        if self.active.is_some() {
            return Err(EncodeError::AlreadyActive);
        }
        let output = frames_dir(path).join(MANIFEST_NAME);
        ensure_parent(&output).await?;
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
        if self.buffer.is_empty() {
            self.buffer.take();
            return write_placeholder(&active).await;
        }
        let frames = self.buffer.take();
        let dir = active.output.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        debug!(frames = frames.len(), dir = %dir.display(), "writing image sequence");

        let manifest = ImageSequenceWriter::new(dir, active.settings.frame_rate())
            .write(&active.title(), active.settings.quality, &frames)
            .await?;
        Ok(EndOutcome::Container(manifest))
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

/// `<stem>.html` replaying inlined frames, images kept in `<stem>_frames/`.
///
/// Last resort of every cascade: needs nothing but a writable directory.
#[derive(Debug, Default)]
pub struct HtmlSequenceStrategy {
    active: Option<ActiveOutput>,
    buffer: JpegBuffer,
}

impl HtmlSequenceStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EncodingStrategy for HtmlSequenceStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::HtmlSequence
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
        if self.buffer.is_empty() {
            self.buffer.take();
            return write_placeholder(&active).await;
        }
        let frames = self.buffer.take();
        debug!(frames = frames.len(), page = %active.output.display(), "writing html player");

        let page = HtmlSequenceWriter::new(&active.output, active.settings.frame_rate())
            .write(&active.title(), &frames)
            .await?;
        Ok(EndOutcome::Container(page))
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
