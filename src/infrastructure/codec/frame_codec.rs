//! Frame codec adapter (JPEG/PNG via the `image` crate)

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use async_trait::async_trait;
use image::{ExtendedColorType, ImageEncoder};

use crate::application::ports::{EncodeError, FrameCompressor};
use crate::domain::capture::{CompressedFrame, Frame, ImageFormat};
use crate::domain::encoding::QualityTier;

/// Compresses raw RGBA frames into still-image payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    format: ImageFormat,
    quality: QualityTier,
}

impl FrameCodec {
    pub fn new(format: ImageFormat, quality: QualityTier) -> Self {
        Self { format, quality }
    }

    /// JPEG codec at the tier's still-image quality
    pub fn jpeg(quality: QualityTier) -> Self {
        Self::new(ImageFormat::Jpeg, quality)
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Compress one frame on the calling thread
    pub fn encode(&self, frame: &Frame) -> Result<CompressedFrame, EncodeError> {
        let data = self.encode_rgba(frame.width(), frame.height(), frame.pixels())?;
        Ok(CompressedFrame::new(
            frame.sequence(),
            frame.width(),
            frame.height(),
            self.format,
            data,
        ))
    }

    /// Compress one frame on the blocking pool
    pub async fn compress(&self, frame: &Frame) -> Result<CompressedFrame, EncodeError> {
        let codec = *self;
        let frame = frame.clone();
        tokio::task::spawn_blocking(move || codec.encode(&frame))
            .await
            .map_err(|e| EncodeError::FrameEncode(format!("encoder task failed: {}", e)))?
    }

    /// Compress an RGBA8 buffer
    pub fn encode_rgba(&self, width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected || expected == 0 {
            return Err(EncodeError::FrameEncode(format!(
                "buffer of {} bytes does not match {}x{} RGBA",
                rgba.len(),
                width,
                height
            )));
        }

        let mut out = Vec::new();
        let result = match self.format {
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb: Vec<u8> = rgba
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect();
                JpegEncoder::new_with_quality(&mut out, self.quality.image_quality()).write_image(
                    &rgb,
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )
            }
            ImageFormat::Png => {
                let compression = match self.quality {
                    QualityTier::Low => CompressionType::Fast,
                    QualityTier::Medium | QualityTier::High => CompressionType::Default,
                    QualityTier::Ultra => CompressionType::Best,
                };
                PngEncoder::new_with_quality(&mut out, compression, FilterType::Adaptive)
                    .write_image(rgba, width, height, ExtendedColorType::Rgba8)
            }
        };
        result.map_err(|e| EncodeError::FrameEncode(e.to_string()))?;
        Ok(out)
    }
}

/// Decode a still-image payload back to RGBA8
pub fn decode_rgba(frame: &CompressedFrame) -> Result<Vec<u8>, EncodeError> {
    let format = match frame.format() {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
    };
    let decoded = image::load_from_memory_with_format(frame.data(), format)
        .map_err(|e| EncodeError::FrameEncode(e.to_string()))?
        .to_rgba8();
    if decoded.dimensions() != (frame.width(), frame.height()) {
        return Err(EncodeError::FrameEncode(format!(
            "payload is {}x{}, expected {}x{}",
            decoded.width(),
            decoded.height(),
            frame.width(),
            frame.height()
        )));
    }
    Ok(decoded.into_raw())
}

/// JPEG compression at the requested tier, for the fallback journal
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCompressor;

#[async_trait]
impl FrameCompressor for JpegCompressor {
    async fn compress(&self, frame: &Frame, quality: QualityTier) -> Result<CompressedFrame, EncodeError> {
        FrameCodec::jpeg(quality).compress(frame).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn gradient(width: u32, height: u32) -> Frame {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 8) as u8, (y * 8) as u8, 128, 255]);
            }
        }
        Frame::new(7, width, height, pixels, Utc::now(), Duration::ZERO).unwrap()
    }

    #[test]
    fn jpeg_has_soi_and_eoi_markers() {
        let compressed = FrameCodec::jpeg(QualityTier::Medium).encode(&gradient(16, 16)).unwrap();
        let data = compressed.data();
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
        assert_eq!(&data[data.len() - 2..], &[0xFF, 0xD9]);
        assert_eq!(compressed.sequence(), 7);
        assert_eq!((compressed.width(), compressed.height()), (16, 16));
    }

    #[test]
    fn higher_tier_is_not_smaller() {
        let frame = gradient(32, 32);
        let low = FrameCodec::jpeg(QualityTier::Low).encode(&frame).unwrap();
        let ultra = FrameCodec::jpeg(QualityTier::Ultra).encode(&frame).unwrap();
        assert!(ultra.len() >= low.len());
    }

    #[test]
    fn png_signature() {
        let codec = FrameCodec::new(ImageFormat::Png, QualityTier::Low);
        let compressed = codec.encode(&gradient(8, 8)).unwrap();
        assert_eq!(&compressed.data()[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(compressed.format(), ImageFormat::Png);
    }

    #[test]
    fn mismatched_buffer_is_a_frame_error() {
        let codec = FrameCodec::jpeg(QualityTier::High);
        let err = codec.encode_rgba(10, 10, &[0; 16]).unwrap_err();
        assert!(err.is_frame_local());
    }

    #[test]
    fn jpeg_decodes_to_original_size() {
        let compressed = FrameCodec::jpeg(QualityTier::Ultra).encode(&gradient(12, 6)).unwrap();
        let rgba = decode_rgba(&compressed).unwrap();
        assert_eq!(rgba.len(), 12 * 6 * 4);
        // Flat blue channel survives lossy coding closely
        assert!(rgba.chunks_exact(4).all(|px| px[2].abs_diff(128) < 16 && px[3] == 255));
    }

    #[test]
    fn garbage_payload_is_a_frame_error() {
        let junk = CompressedFrame::new(1, 4, 4, ImageFormat::Jpeg, vec![0xFF, 0xD8, 0x00]);
        assert!(decode_rgba(&junk).unwrap_err().is_frame_local());
    }

    #[tokio::test]
    async fn jpeg_compressor_uses_requested_tier() {
        let frame = gradient(32, 32);
        let via_port = JpegCompressor.compress(&frame, QualityTier::Low).await.unwrap();
        let direct = FrameCodec::jpeg(QualityTier::Low).encode(&frame).unwrap();
        assert_eq!(via_port.data(), direct.data());
        assert_eq!(via_port.format(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn compress_runs_off_thread() {
        let compressed = FrameCodec::jpeg(QualityTier::High)
            .compress(&gradient(8, 8))
            .await
            .unwrap();
        assert!(!compressed.is_empty());
    }
}
