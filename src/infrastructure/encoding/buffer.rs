//! State shared by the built-in strategies

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;

use crate::application::ports::{EncodeError, EndOutcome};
use crate::domain::capture::{CompressedFrame, Frame, ImageFormat};
use crate::domain::encoding::{DiagnosticReport, EncodingSettings, QualityTier, ReportStatus};
use crate::infrastructure::codec::FrameCodec;

/// Paths and settings of a begun strategy
#[derive(Debug, Clone)]
pub(crate) struct ActiveOutput {
    /// Path handed to `begin`, used to name the placeholder report
    pub requested: PathBuf,
    /// Normalized path the strategy writes
    pub output: PathBuf,
    pub settings: EncodingSettings,
}

impl ActiveOutput {
    /// Base name shown in manifests and page titles
    pub fn title(&self) -> String {
        self.requested
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording".to_string())
    }
}

/// Swap the extension and make sure the parent directory exists
pub(crate) async fn prepare_output(path: &Path, extension: &str) -> Result<PathBuf, EncodeError> {
    let output = path.with_extension(extension);
    ensure_parent(&output).await?;
    Ok(output)
}

pub(crate) async fn ensure_parent(path: &Path) -> Result<(), EncodeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// Write the "No frames captured" report in place of a container
pub(crate) async fn write_placeholder(active: &ActiveOutput) -> Result<EndOutcome, EncodeError> {
    let report = DiagnosticReport {
        status: ReportStatus::NoFrames,
        reason: "No frames captured".to_string(),
        frame_count: 0,
        resolution: None,
        frame_rate: active.settings.frame_rate(),
        quality: active.settings.quality,
        requested: active.requested.clone(),
        produced: None,
        attempts: Vec::new(),
        created: Utc::now(),
    };
    let path = report.path();
    fs::write(&path, report.render()).await?;
    Ok(EndOutcome::Placeholder(path))
}

/// Run container assembly off the async threads
pub(crate) async fn blocking<T, F>(job: F) -> Result<T, EncodeError>
where
    F: FnOnce() -> Result<T, EncodeError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| EncodeError::Io(std::io::Error::other(e)))?
}

/// Ordered JPEG payloads of the frames submitted so far
#[derive(Debug, Default)]
pub(crate) struct JpegBuffer {
    codec: Option<FrameCodec>,
    frames: Vec<CompressedFrame>,
    bytes: u64,
}

impl JpegBuffer {
    pub fn reset(&mut self, quality: QualityTier) {
        self.codec = Some(FrameCodec::jpeg(quality));
        self.frames.clear();
        self.bytes = 0;
    }

    pub async fn push(&mut self, frame: &Frame) -> Result<(), EncodeError> {
        let codec = self.codec.ok_or(EncodeError::NotActive)?;
        let compressed = codec.compress(frame).await?;
        self.bytes += compressed.len() as u64;
        self.frames.push(compressed);
        Ok(())
    }

    /// Keep an already compressed JPEG; the payload is shared, not copied
    pub fn push_compressed(&mut self, frame: &CompressedFrame) -> Result<(), EncodeError> {
        if self.codec.is_none() {
            return Err(EncodeError::NotActive);
        }
        if frame.format() != ImageFormat::Jpeg {
            return Err(EncodeError::FrameEncode(format!(
                "expected a JPEG payload, got {}",
                frame.format().extension()
            )));
        }
        self.bytes += frame.len() as u64;
        self.frames.push(frame.clone());
        Ok(())
    }

    /// Width and height of the first frame
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| (f.width(), f.height()))
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn take(&mut self) -> Vec<CompressedFrame> {
        self.codec = None;
        self.bytes = 0;
        std::mem::take(&mut self.frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn placeholder_is_named_after_requested_path() {
        let tmp = tempfile::tempdir().unwrap();
        let active = ActiveOutput {
            requested: tmp.path().join("clip.gif"),
            output: tmp.path().join("clip.gif"),
            settings: EncodingSettings::new(tmp.path()).with_frame_rate(30),
        };
        let outcome = write_placeholder(&active).await.unwrap();
        assert_eq!(
            outcome,
            EndOutcome::Placeholder(tmp.path().join("clip.gif.report.txt"))
        );
        let body = std::fs::read_to_string(outcome.path()).unwrap();
        assert!(body.starts_with("Status: No frames captured\n"));
        assert!(!tmp.path().join("clip.gif").exists());
    }

    #[test]
    fn compressed_jpegs_are_shared_and_pngs_refused() {
        let mut buffer = JpegBuffer::default();
        let jpeg = CompressedFrame::new(1, 2, 2, ImageFormat::Jpeg, vec![0xFF, 0xD8, 0xFF, 0xD9]);
        assert!(matches!(buffer.push_compressed(&jpeg), Err(EncodeError::NotActive)));

        buffer.reset(QualityTier::Medium);
        buffer.push_compressed(&jpeg).unwrap();
        assert_eq!(buffer.bytes(), 4);
        assert_eq!(buffer.dimensions(), Some((2, 2)));
        let png = CompressedFrame::new(2, 2, 2, ImageFormat::Png, vec![0x89, b'P']);
        assert!(buffer.push_compressed(&png).unwrap_err().is_frame_local());

        let frames = buffer.take();
        assert_eq!(frames.len(), 1);
        assert!(std::ptr::eq(frames[0].data().as_ptr(), jpeg.data().as_ptr()));
    }

    #[tokio::test]
    async fn prepare_output_normalizes_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = prepare_output(&tmp.path().join("a/b/clip.mp4"), "avi").await.unwrap();
        assert_eq!(path, tmp.path().join("a/b/clip.avi"));
        assert!(tmp.path().join("a/b").is_dir());
    }
}
