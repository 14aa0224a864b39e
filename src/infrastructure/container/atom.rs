//! In-memory builder for ISO base media boxes
//!
//! A box is `[u32 big-endian length][4-byte type][payload]`, the length
//! covering the header. Boxes whose size depends on their children are
//! opened with a placeholder length, filled, then patched when closed.

use crate::domain::error::ContainerError;

/// Growable buffer with a stack of open boxes
#[derive(Debug, Default)]
pub struct AtomBuilder {
    buf: Vec<u8>,
    open: Vec<(usize, [u8; 4])>,
}

impl AtomBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute offset of the next byte written
    pub fn position(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Open a box; its length is patched by the matching `close`
    pub fn open(&mut self, fourcc: &[u8; 4]) {
        self.open.push((self.buf.len(), *fourcc));
        self.buf.extend_from_slice(&[0; 4]);
        self.buf.extend_from_slice(fourcc);
    }

    /// Open a full box (version + 24-bit flags after the header)
    pub fn open_full(&mut self, fourcc: &[u8; 4], version: u8, flags: u32) {
        self.open(fourcc);
        self.u32(((version as u32) << 24) | (flags & 0x00FF_FFFF));
    }

    /// Close the innermost open box and patch its length
    pub fn close(&mut self) -> Result<(), ContainerError> {
        let (start, fourcc) = self
            .open
            .pop()
            .ok_or_else(|| ContainerError::Unbalanced("close without open box".to_string()))?;
        let size = (self.buf.len() - start) as u64;
        let size32 = u32::try_from(size).map_err(|_| ContainerError::SizeOverflow {
            fourcc: String::from_utf8_lossy(&fourcc).into_owned(),
            size,
        })?;
        self.buf[start..start + 4].copy_from_slice(&size32.to_be_bytes());
        Ok(())
    }

    /// Write a complete box with a known payload
    pub fn leaf(&mut self, fourcc: &[u8; 4], payload: &[u8]) -> Result<(), ContainerError> {
        self.open(fourcc);
        self.bytes(payload);
        self.close()
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn zeros(&mut self, count: usize) {
        self.buf.resize(self.buf.len() + count, 0);
    }

    /// Finish building; every opened box must have been closed
    pub fn finish(self) -> Result<Vec<u8>, ContainerError> {
        if let Some((_, fourcc)) = self.open.last() {
            return Err(ContainerError::Unbalanced(format!(
                "'{}' box left open",
                String::from_utf8_lossy(fourcc)
            )));
        }
        Ok(self.buf)
    }
}

/// One parsed box, for inspecting written files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxNode {
    pub fourcc: [u8; 4],
    pub offset: u64,
    pub size: u64,
    pub children: Vec<BoxNode>,
}

impl BoxNode {
    pub fn kind(&self) -> &str {
        std::str::from_utf8(&self.fourcc).unwrap_or("????")
    }

    /// Payload range (after the 8-byte header) within the parsed buffer
    pub fn body(&self) -> std::ops::Range<usize> {
        (self.offset + 8) as usize..(self.offset + self.size) as usize
    }

    /// Depth-first search by `/`-separated path, e.g. `trak/mdia/mdhd`
    pub fn find(&self, path: &str) -> Option<&BoxNode> {
        let mut node = self;
        for part in path.split('/') {
            node = node.children.iter().find(|c| c.kind() == part)?;
        }
        Some(node)
    }
}

/// Boxes that only contain other boxes
const CONTAINERS: &[&[u8; 4]] = &[b"moov", b"trak", b"mdia", b"minf", b"dinf", b"stbl"];

/// Parse a box tree, checking that every length exactly covers its box.
///
/// Containers listed above are descended into; everything else is a leaf.
pub fn parse_boxes(data: &[u8]) -> Result<Vec<BoxNode>, ContainerError> {
    parse_range(data, 0, data.len() as u64)
}

fn parse_range(data: &[u8], start: u64, end: u64) -> Result<Vec<BoxNode>, ContainerError> {
    let mut nodes = Vec::new();
    let mut pos = start;
    while pos < end {
        if end - pos < 8 {
            return Err(ContainerError::Unbalanced(format!(
                "truncated box header at offset {}",
                pos
            )));
        }
        let p = pos as usize;
        let size = u32::from_be_bytes([data[p], data[p + 1], data[p + 2], data[p + 3]]) as u64;
        let fourcc = [data[p + 4], data[p + 5], data[p + 6], data[p + 7]];
        if size < 8 || pos + size > end {
            return Err(ContainerError::Unbalanced(format!(
                "'{}' box at offset {} has invalid length {}",
                String::from_utf8_lossy(&fourcc),
                pos,
                size
            )));
        }
        let children = if CONTAINERS.contains(&&fourcc) {
            parse_range(data, pos + 8, pos + size)?
        } else {
            Vec::new()
        };
        nodes.push(BoxNode {
            fourcc,
            offset: pos,
            size,
            children,
        });
        pos += size;
    }
    Ok(nodes)
}
