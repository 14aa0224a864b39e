//! Animated GIF strategy for short recordings

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::ports::{EncodeError, EncodingStrategy, EndOutcome};
use crate::domain::capture::{CompressedFrame, Frame};
use crate::domain::encoding::{EncodingSettings, StrategyKind};
use crate::infrastructure::codec::decode_rgba;
use crate::infrastructure::container::{GifFrame, GifStreamWriter, GIF_FRAME_CAP};

use super::buffer::{blocking, prepare_output, write_placeholder, ActiveOutput};

/// Palettizes raw frames as they arrive; refuses recordings past the cap
#[derive(Debug, Default)]
pub struct GifStrategy {
    active: Option<ActiveOutput>,
    frames: Vec<GifFrame>,
    bytes: u64,
}

impl GifStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_cap(&self) -> Result<(), EncodeError> {
        if self.frames.len() as u64 >= GIF_FRAME_CAP {
            return Err(EncodeError::Unsuitable(format!(
                "recording exceeded the {} frame GIF limit",
                GIF_FRAME_CAP
            )));
        }
        Ok(())
    }

    fn keep(&mut self, frame: GifFrame) {
        self.bytes += frame.len() as u64;
        self.frames.push(frame);
    }
}

#[async_trait]
impl EncodingStrategy for GifStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Gif
    }

    async fn begin(&mut self, path: &Path, settings: &EncodingSettings) -> Result<PathBuf, EncodeError> {
        if self.active.is_some() {
            return Err(EncodeError::AlreadyActive);
        }
        if let Some(limit) = settings.time_limit {
            let expected = limit.frames_at(settings.frame_rate());
            if expected > GIF_FRAME_CAP {
                return Err(EncodeError::Unsuitable(format!(
                    "{} frames expected, GIF is limited to {}",
                    expected, GIF_FRAME_CAP
                )));
            }
        }

        let output = prepare_output(path, self.kind().extension()).await?;
        self.frames.clear();
        self.bytes = 0;
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
        self.check_cap()?;

        let (width, height) = (frame.width(), frame.height());
        let pixels = frame.pixels().to_vec();
        let gif_frame = blocking(move || {
            GifFrame::from_rgba(width, height, &pixels).map_err(|e| EncodeError::FrameEncode(e.to_string()))
        })
        .await?;
        self.keep(gif_frame);
        Ok(())
    }

    async fn submit_compressed(&mut self, frame: &CompressedFrame) -> Result<(), EncodeError> {
        if self.active.is_none() {
            return Ok(());
        }
        self.check_cap()?;

        let frame = frame.clone();
        let gif_frame = blocking(move || {
            let pixels = decode_rgba(&frame)?;
            GifFrame::from_rgba(frame.width(), frame.height(), &pixels)
                .map_err(|e| EncodeError::FrameEncode(e.to_string()))
        })
        .await?;
        self.keep(gif_frame);
        Ok(())
    }

    async fn end(&mut self) -> Result<EndOutcome, EncodeError> {
        let active = self.active.take().ok_or(EncodeError::NotActive)?;
        let frames = std::mem::take(&mut self.frames);
        self.bytes = 0;
        let Some(first) = frames.first() else {
            return write_placeholder(&active).await;
        };
        debug!(frames = frames.len(), width = first.width(), height = first.height(), "writing gif");

        let mut writer = GifStreamWriter::new(
            first.width(),
            first.height(),
            active.settings.frame_duration_ms(),
        );
        for frame in &frames {
            writer.push(frame);
        }
        fs::write(&active.output, writer.finish()).await?;
        Ok(EndOutcome::Container(active.output))
    }

    fn abandon(&mut self) {
        self.active = None;
        self.frames.clear();
        self.bytes = 0;
    }

    fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn buffered_bytes(&self) -> u64 {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::encoding::QualityTier;
    use crate::domain::recording::Duration as RecDuration;
    use crate::infrastructure::codec::FrameCodec;
    use chrono::Utc;
    use std::time::Duration;

    fn frame(seq: u64) -> Frame {
        Frame::new(seq, 4, 4, vec![seq as u8; 64], Utc::now(), Duration::ZERO).unwrap()
    }

    #[tokio::test]
    async fn refuses_long_time_limits_up_front() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = EncodingSettings::new(tmp.path())
            .with_frame_rate(30)
            .with_time_limit(RecDuration::from_secs(11));
        let mut strategy = GifStrategy::new();
        let err = strategy
            .begin(&tmp.path().join("clip.gif"), &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, EncodeError::Unsuitable(_)));
        assert!(!strategy.is_active());
        assert!(!tmp.path().join("clip.gif").exists());
    }

    #[tokio::test]
    async fn refuses_frames_past_the_cap() {
        let tmp = tempfile::tempdir().unwrap();
        let mut strategy = GifStrategy::new();
        strategy
            .begin(&tmp.path().join("clip.gif"), &EncodingSettings::new(tmp.path()))
            .await
            .unwrap();
        for seq in 1..=GIF_FRAME_CAP {
            strategy.submit(&frame(seq)).await.unwrap();
        }
        let err = strategy.submit(&frame(GIF_FRAME_CAP + 1)).await.unwrap_err();
        assert!(matches!(err, EncodeError::Unsuitable(_)));
        assert!(!err.is_frame_local());
    }

    #[tokio::test]
    async fn palettizes_replayed_jpegs() {
        let tmp = tempfile::tempdir().unwrap();
        let mut strategy = GifStrategy::new();
        let path = strategy
            .begin(&tmp.path().join("clip.gif"), &EncodingSettings::new(tmp.path()))
            .await
            .unwrap();
        let pixels = vec![200u8; 8 * 8 * 4];
        let raw = Frame::new(1, 8, 8, pixels, Utc::now(), Duration::ZERO).unwrap();
        let jpeg = FrameCodec::jpeg(QualityTier::High).encode(&raw).unwrap();

        strategy.submit_compressed(&jpeg).await.unwrap();
        assert!(strategy.buffered_bytes() > 0);
        strategy.end().await.unwrap();
        assert_eq!(&std::fs::read(&path).unwrap()[..6], b"GIF89a");
    }

    #[tokio::test]
    async fn output_ends_with_trailer() {
        let tmp = tempfile::tempdir().unwrap();
        let mut strategy = GifStrategy::new();
        let path = strategy
            .begin(&tmp.path().join("clip.mp4"), &EncodingSettings::new(tmp.path()).with_frame_rate(10))
            .await
            .unwrap();
        assert_eq!(path, tmp.path().join("clip.gif"));
        strategy.submit(&frame(1)).await.unwrap();
        strategy.submit(&frame(2)).await.unwrap();
        strategy.end().await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..6], b"GIF89a");
        assert_eq!(bytes.last(), Some(&0x3B));
    }
}
