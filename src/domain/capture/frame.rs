//! Frame value objects

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Bytes per pixel of a raw frame (RGBA8)
pub const BYTES_PER_PIXEL: usize = 4;

/// A raw captured screen image.
///
/// The pixel buffer is owned: a frame is always a copy of the capturer's
/// working buffer, so nothing in flight aliases the next capture.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    sequence: u64,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    captured_at: DateTime<Utc>,
    offset: Duration,
}

impl Frame {
    /// Create a frame from an RGBA8 buffer.
    ///
    /// Returns `None` when the buffer length does not match the dimensions.
    pub fn new(
        sequence: u64,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        captured_at: DateTime<Utc>,
        offset: Duration,
    ) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * BYTES_PER_PIXEL {
            return None;
        }
        Some(Self {
            sequence,
            width,
            height,
            pixels,
            captured_at,
            offset,
        })
    }

    /// Monotonically increasing capture sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixels, row-major, no padding
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Wall-clock capture time
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Time since the capture loop started
    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// Pixel at (x, y) as `[r, g, b, a]`
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .field("offset", &self.offset)
            .finish()
    }
}

/// Still-image payload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    /// File extension for a stored payload
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// MIME type, used for data URIs
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// A single frame compressed into a still-image payload.
///
/// The payload is shared: clones made for the fallback journal and for a
/// strategy's buffer point at the same bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct CompressedFrame {
    sequence: u64,
    width: u32,
    height: u32,
    format: ImageFormat,
    data: Arc<[u8]>,
}

impl CompressedFrame {
    pub fn new(sequence: u64, width: u32, height: u32, format: ImageFormat, data: Vec<u8>) -> Self {
        Self {
            sequence,
            width,
            height,
            format,
            data: data.into(),
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Encoded payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for CompressedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedFrame")
            .field("sequence", &self.sequence)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Format a byte count for display (e.g. "1.5 MB")
pub fn human_readable_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = bytes as f64;
    if size < KB {
        format!("{} B", bytes)
    } else if size < MB {
        format!("{:.1} KB", size / KB)
    } else if size < GB {
        format!("{:.1} MB", size / MB)
    } else {
        format!("{:.2} GB", size / GB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> Vec<u8> {
        vec![0x80; width as usize * height as usize * BYTES_PER_PIXEL]
    }

    #[test]
    fn frame_rejects_mismatched_buffer() {
        assert!(Frame::new(0, 4, 4, vec![0; 10], Utc::now(), Duration::ZERO).is_none());
        assert!(Frame::new(0, 4, 4, solid(4, 4), Utc::now(), Duration::ZERO).is_some());
    }

    #[test]
    fn pixel_lookup() {
        let mut pixels = solid(2, 2);
        pixels[12..16].copy_from_slice(&[1, 2, 3, 4]);
        let frame = Frame::new(7, 2, 2, pixels, Utc::now(), Duration::ZERO).unwrap();
        assert_eq!(frame.pixel(1, 1), [1, 2, 3, 4]);
        assert_eq!(frame.sequence(), 7);
    }

    #[test]
    fn debug_hides_pixels() {
        let frame = Frame::new(3, 2, 2, solid(2, 2), Utc::now(), Duration::ZERO).unwrap();
        let text = format!("{:?}", frame);
        assert!(text.contains("bytes: 16"));
    }

    #[test]
    fn format_metadata() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
    }

    #[test]
    fn compressed_clones_share_the_payload() {
        let frame = CompressedFrame::new(1, 2, 2, ImageFormat::Jpeg, vec![0xFF, 0xD8, 0xFF, 0xD9]);
        let copy = frame.clone();
        assert_eq!(copy, frame);
        assert!(std::ptr::eq(copy.data().as_ptr(), frame.data().as_ptr()));
    }

    #[test]
    fn human_readable_sizes() {
        assert_eq!(human_readable_size(512), "512 B");
        assert_eq!(human_readable_size(1536), "1.5 KB");
        assert_eq!(human_readable_size(5 * 1024 * 1024), "5.0 MB");
    }
}
