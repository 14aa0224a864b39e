//! RIFF builder and the MJPEG-in-AVI writer
//!
//! RIFF is little-endian: `[fourcc][u32 size][payload]`, where the size
//! excludes the 8-byte header and odd payloads are followed by one pad
//! byte. `RIFF` and `LIST` nodes carry a 4-byte form type before their
//! children.

use crate::domain::capture::CompressedFrame;
use crate::domain::error::ContainerError;

/// `AVIF_HASINDEX` in `avih`, `AVIIF_KEYFRAME` in `idx1`
const FLAG_INDEX: u32 = 0x10;

/// Growable little-endian buffer with a stack of open lists
#[derive(Debug, Default)]
pub struct RiffBuilder {
    buf: Vec<u8>,
    open: Vec<(usize, [u8; 4])>,
}

impl RiffBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Open a `RIFF` or `LIST` node with its form type
    pub fn open_list(&mut self, tag: &[u8; 4], form: &[u8; 4]) {
        self.open.push((self.buf.len(), *form));
        self.buf.extend_from_slice(tag);
        self.buf.extend_from_slice(&[0; 4]);
        self.buf.extend_from_slice(form);
    }

    /// Close the innermost list and patch its size
    pub fn close(&mut self) -> Result<(), ContainerError> {
        let (start, form) = self
            .open
            .pop()
            .ok_or_else(|| ContainerError::Unbalanced("close without open list".to_string()))?;
        let size = (self.buf.len() - start - 8) as u64;
        let size32 = u32::try_from(size).map_err(|_| ContainerError::SizeOverflow {
            fourcc: String::from_utf8_lossy(&form).into_owned(),
            size,
        })?;
        self.buf[start + 4..start + 8].copy_from_slice(&size32.to_le_bytes());
        Ok(())
    }

    /// Write a data chunk, padded to an even length
    pub fn chunk(&mut self, fourcc: &[u8; 4], payload: &[u8]) -> Result<(), ContainerError> {
        let size = u32::try_from(payload.len()).map_err(|_| ContainerError::SizeOverflow {
            fourcc: String::from_utf8_lossy(fourcc).into_owned(),
            size: payload.len() as u64,
        })?;
        self.buf.extend_from_slice(fourcc);
        self.buf.extend_from_slice(&size.to_le_bytes());
        self.buf.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            self.buf.push(0);
        }
        Ok(())
    }

    pub fn finish(self) -> Result<Vec<u8>, ContainerError> {
        if let Some((_, form)) = self.open.last() {
            return Err(ContainerError::Unbalanced(format!(
                "'{}' list left open",
                String::from_utf8_lossy(form)
            )));
        }
        Ok(self.buf)
    }
}

/// Little-endian payload assembly for fixed-layout chunks
#[derive(Debug, Default)]
struct Fields(Vec<u8>);

impl Fields {
    fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn i16(mut self, v: i16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn tag(mut self, v: &[u8; 4]) -> Self {
        self.0.extend_from_slice(v);
        self
    }

    fn zeros(mut self, n: usize) -> Self {
        self.0.resize(self.0.len() + n, 0);
        self
    }
}

/// Writes JPEG frames as an MJPEG video stream in an AVI file
#[derive(Debug, Clone, Copy)]
pub struct AviRiffWriter {
    width: u32,
    height: u32,
    frame_rate: u32,
}

impl AviRiffWriter {
    pub fn new(width: u32, height: u32, frame_rate: u32) -> Self {
        Self {
            width,
            height,
            frame_rate: frame_rate.max(1),
        }
    }

    pub fn micros_per_frame(&self) -> u32 {
        1_000_000 / self.frame_rate
    }

    pub fn write(&self, frames: &[CompressedFrame]) -> Result<Vec<u8>, ContainerError> {
        let width = i16::try_from(self.width).map_err(|_| ContainerError::FieldOverflow {
            field: "width",
            value: self.width as u64,
        })?;
        let height = i16::try_from(self.height).map_err(|_| ContainerError::FieldOverflow {
            field: "height",
            value: self.height as u64,
        })?;
        let count = u32::try_from(frames.len()).map_err(|_| ContainerError::FieldOverflow {
            field: "frame count",
            value: frames.len() as u64,
        })?;
        let largest = frames.iter().map(|f| f.len()).max().unwrap_or(0) as u64;
        let largest32 = u32::try_from(largest).map_err(|_| ContainerError::FieldOverflow {
            field: "buffer size",
            value: largest,
        })?;

        let mut b = RiffBuilder::new();
        b.open_list(b"RIFF", b"AVI ");

        b.open_list(b"LIST", b"hdrl");
        let avih = Fields::default()
            .u32(self.micros_per_frame())
            .u32(largest32.saturating_mul(self.frame_rate))
            .u32(0) // padding granularity
            .u32(FLAG_INDEX)
            .u32(count)
            .u32(0) // initial frames
            .u32(1) // streams
            .u32(largest32)
            .u32(self.width)
            .u32(self.height)
            .zeros(16);
        b.chunk(b"avih", &avih.0)?;

        b.open_list(b"LIST", b"strl");
        let strh = Fields::default()
            .tag(b"vids")
            .tag(b"MJPG")
            .u32(0) // flags
            .u16(0) // priority
            .u16(0) // language
            .u32(0) // initial frames
            .u32(1) // scale
            .u32(self.frame_rate)
            .u32(0) // start
            .u32(count)
            .u32(largest32)
            .u32(u32::MAX) // default quality
            .u32(0) // sample size varies
            .i16(0)
            .i16(0)
            .i16(width)
            .i16(height);
        b.chunk(b"strh", &strh.0)?;
        let strf = Fields::default()
            .u32(40)
            .i32(self.width as i32)
            .i32(self.height as i32)
            .u16(1) // planes
            .u16(24) // bit count
            .tag(b"MJPG")
            .u32(self.width.saturating_mul(self.height).saturating_mul(3))
            .i32(0)
            .i32(0)
            .u32(0)
            .u32(0);
        b.chunk(b"strf", &strf.0)?;
        b.close()?; // strl
        b.close()?; // hdrl

        b.open_list(b"LIST", b"movi");
        let movi_type = b.position() - 4;
        let mut index = Fields::default();
        for frame in frames {
            let relative = b.position() - movi_type;
            let relative = u32::try_from(relative)
                .map_err(|_| ContainerError::OffsetOverflow { offset: relative })?;
            index = index
                .tag(b"00dc")
                .u32(FLAG_INDEX)
                .u32(relative)
                .u32(frame.len() as u32);
            b.chunk(b"00dc", frame.data())?;
        }
        b.close()?; // movi

        b.chunk(b"idx1", &index.0)?;
        b.close()?; // RIFF
        b.finish()
    }
}

/// One parsed RIFF node, for inspecting written files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiffNode {
    pub fourcc: [u8; 4],
    /// Form type for `RIFF`/`LIST` nodes
    pub form: Option<[u8; 4]>,
    pub offset: u64,
    /// Value of the size field (header and pad excluded)
    pub size: u32,
    pub children: Vec<RiffNode>,
}

impl RiffNode {
    pub fn kind(&self) -> &str {
        let bytes = self.form.as_ref().unwrap_or(&self.fourcc);
        std::str::from_utf8(bytes).unwrap_or("????")
    }

    /// Payload range (after the size field) within the parsed buffer
    pub fn body(&self) -> std::ops::Range<usize> {
        (self.offset + 8) as usize..(self.offset + 8 + self.size as u64) as usize
    }

    pub fn find(&self, path: &str) -> Option<&RiffNode> {
        let mut node = self;
        for part in path.split('/') {
            node = node.children.iter().find(|c| c.kind() == part)?;
        }
        Some(node)
    }
}

/// Parse a RIFF tree, checking every size against its enclosing node
pub fn parse_riff(data: &[u8]) -> Result<Vec<RiffNode>, ContainerError> {
    parse_range(data, 0, data.len() as u64)
}

fn parse_range(data: &[u8], start: u64, end: u64) -> Result<Vec<RiffNode>, ContainerError> {
    let mut nodes = Vec::new();
    let mut pos = start;
    while pos < end {
        if end - pos < 8 {
            return Err(ContainerError::Unbalanced(format!(
                "truncated chunk header at offset {}",
                pos
            )));
        }
        let p = pos as usize;
        let fourcc = [data[p], data[p + 1], data[p + 2], data[p + 3]];
        let size = u32::from_le_bytes([data[p + 4], data[p + 5], data[p + 6], data[p + 7]]);
        let body_end = pos + 8 + size as u64;
        if body_end > end {
            return Err(ContainerError::Unbalanced(format!(
                "'{}' chunk at offset {} overruns its parent",
                String::from_utf8_lossy(&fourcc),
                pos
            )));
        }
        let is_list = &fourcc == b"RIFF" || &fourcc == b"LIST";
        let (form, children) = if is_list && size >= 4 {
            let form = [data[p + 8], data[p + 9], data[p + 10], data[p + 11]];
            (Some(form), parse_range(data, pos + 12, body_end)?)
        } else {
            (None, Vec::new())
        };
        nodes.push(RiffNode {
            fourcc,
            form,
            offset: pos,
            size,
            children,
        });
        pos = body_end + (size as u64 % 2);
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capture::ImageFormat;

    fn frames(sizes: &[usize]) -> Vec<CompressedFrame> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                CompressedFrame::new(i as u64 + 1, 32, 24, ImageFormat::Jpeg, vec![0xA0 + i as u8; n])
            })
            .collect()
    }

    fn le32(data: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
    }

    #[test]
    fn riff_size_covers_file() {
        let bytes = AviRiffWriter::new(32, 24, 15).write(&frames(&[5, 6, 7])).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"AVI ");
        assert_eq!(le32(&bytes, 4) as usize, bytes.len() - 8);
    }

    #[test]
    fn odd_chunks_are_padded() {
        let bytes = AviRiffWriter::new(32, 24, 15).write(&frames(&[5, 6, 7])).unwrap();
        let tree = parse_riff(&bytes).unwrap();
        let movi = tree[0].find("movi").unwrap();
        let sizes: Vec<u32> = movi.children.iter().map(|c| c.size).collect();
        assert_eq!(sizes, vec![5, 6, 7]);
        assert_eq!(movi.children[1].offset, movi.children[0].offset + 8 + 6);
    }

    #[test]
    fn header_fields() {
        let bytes = AviRiffWriter::new(32, 24, 25).write(&frames(&[4, 4])).unwrap();
        let tree = parse_riff(&bytes).unwrap();
        let avih = tree[0].find("hdrl/avih").unwrap();
        let body = avih.body();
        assert_eq!(avih.size, 56);
        assert_eq!(le32(&bytes, body.start), 40_000);
        assert_eq!(le32(&bytes, body.start + 12), FLAG_INDEX);
        assert_eq!(le32(&bytes, body.start + 16), 2);
        assert_eq!(le32(&bytes, body.start + 32), 32);
        assert_eq!(le32(&bytes, body.start + 36), 24);

        let strh = tree[0].find("hdrl/strl/strh").unwrap();
        assert_eq!(&bytes[strh.body().start..strh.body().start + 8], b"vidsMJPG");
        let strf = tree[0].find("hdrl/strl/strf").unwrap();
        assert_eq!(strf.size, 40);
    }

    #[test]
    fn index_points_at_chunks() {
        let input = frames(&[3, 8]);
        let bytes = AviRiffWriter::new(32, 24, 10).write(&input).unwrap();
        let tree = parse_riff(&bytes).unwrap();
        let movi = tree[0].find("movi").unwrap();
        let idx1 = tree[0].find("idx1").unwrap();
        assert_eq!(idx1.size, 32);
        let movi_type = movi.offset as usize + 8;
        for (i, frame) in input.iter().enumerate() {
            let entry = idx1.body().start + i * 16;
            assert_eq!(&bytes[entry..entry + 4], b"00dc");
            let chunk = movi_type + le32(&bytes, entry + 8) as usize;
            assert_eq!(&bytes[chunk..chunk + 4], b"00dc");
            assert_eq!(le32(&bytes, entry + 12) as usize, frame.len());
            assert_eq!(&bytes[chunk + 8..chunk + 8 + frame.len()], frame.data());
        }
    }

    #[test]
    fn empty_recording_still_balances() {
        let bytes = AviRiffWriter::new(32, 24, 10).write(&[]).unwrap();
        let tree = parse_riff(&bytes).unwrap();
        assert!(tree[0].find("movi").unwrap().children.is_empty());
    }
}
