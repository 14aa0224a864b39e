//! Animated GIF writer with a fixed 3-3-2 palette and LZW coding

use std::collections::HashMap;

use crate::domain::capture::BYTES_PER_PIXEL;
use crate::domain::error::ContainerError;

/// Frames wider than this are downscaled before quantization
pub const GIF_MAX_WIDTH: u32 = 640;

/// Longest recording the GIF strategy accepts
pub const GIF_FRAME_CAP: u64 = 300;

const TRAILER: u8 = 0x3B;
const MIN_CODE_SIZE: u8 = 8;
const CLEAR_CODE: u16 = 1 << MIN_CODE_SIZE;
const EOI_CODE: u16 = CLEAR_CODE + 1;
const MAX_CODE_SIZE: u8 = 12;
const MAX_CODES: u16 = 1 << MAX_CODE_SIZE;

/// Palette entry `i` is `rrrgggbb`
pub fn palette() -> [u8; 768] {
    let mut table = [0u8; 768];
    for i in 0..256usize {
        table[i * 3] = (((i >> 5) & 7) * 255 / 7) as u8;
        table[i * 3 + 1] = (((i >> 2) & 7) * 255 / 7) as u8;
        table[i * 3 + 2] = ((i & 3) * 255 / 3) as u8;
    }
    table
}

/// Nearest palette index for an RGB colour
pub fn quantize(r: u8, g: u8, b: u8) -> u8 {
    (r & 0xE0) | ((g >> 5) << 2) | (b >> 6)
}

/// One palettized, LZW-coded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifFrame {
    width: u16,
    height: u16,
    lzw: Vec<u8>,
}

impl GifFrame {
    /// Downscale, quantize and LZW-code an RGBA8 image
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, ContainerError> {
        if rgba.len() != width as usize * height as usize * BYTES_PER_PIXEL || width == 0 || height == 0 {
            return Err(ContainerError::FieldOverflow {
                field: "pixel buffer",
                value: rgba.len() as u64,
            });
        }
        let (out_w, out_h) = scaled_size(width, height);
        let mut indices = Vec::with_capacity(out_w as usize * out_h as usize);
        for y in 0..out_h {
            let sy = (y as u64 * height as u64 / out_h as u64) as usize;
            for x in 0..out_w {
                let sx = (x as u64 * width as u64 / out_w as u64) as usize;
                let i = (sy * width as usize + sx) * BYTES_PER_PIXEL;
                indices.push(quantize(rgba[i], rgba[i + 1], rgba[i + 2]));
            }
        }
        Ok(Self {
            width: fit_u16("width", out_w)?,
            height: fit_u16("height", out_h)?,
            lzw: lzw_encode(&indices),
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Coded size in bytes, before sub-block framing
    pub fn len(&self) -> usize {
        self.lzw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lzw.is_empty()
    }
}

fn fit_u16(field: &'static str, value: u32) -> Result<u16, ContainerError> {
    u16::try_from(value).map_err(|_| ContainerError::FieldOverflow {
        field,
        value: value as u64,
    })
}

/// Output size after the width cap, keeping the aspect ratio
pub fn scaled_size(width: u32, height: u32) -> (u32, u32) {
    if width <= GIF_MAX_WIDTH {
        return (width, height);
    }
    let scaled = (height as u64 * GIF_MAX_WIDTH as u64 / width as u64).max(1);
    (GIF_MAX_WIDTH, scaled as u32)
}

struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    bits: u8,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            acc: 0,
            bits: 0,
        }
    }

    fn write(&mut self, code: u16, size: u8) {
        self.acc |= (code as u32) << self.bits;
        self.bits += size;
        while self.bits >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push(self.acc as u8);
        }
        self.out
    }
}

/// Variable-width LZW over 8-bit indices, LSB-first packing
pub fn lzw_encode(indices: &[u8]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    let mut dict: HashMap<(u16, u8), u16> = HashMap::new();
    let mut size = MIN_CODE_SIZE + 1;
    let mut next = EOI_CODE + 1;

    writer.write(CLEAR_CODE, size);
    let Some((&first, rest)) = indices.split_first() else {
        writer.write(EOI_CODE, size);
        return writer.finish();
    };

    let mut prefix = first as u16;
    for &k in rest {
        if let Some(&code) = dict.get(&(prefix, k)) {
            prefix = code;
            continue;
        }
        writer.write(prefix, size);
        if next > (1 << size) - 1 && size < MAX_CODE_SIZE {
            size += 1;
        }
        if next < MAX_CODES {
            dict.insert((prefix, k), next);
            next += 1;
        } else {
            writer.write(CLEAR_CODE, size);
            dict.clear();
            size = MIN_CODE_SIZE + 1;
            next = EOI_CODE + 1;
        }
        prefix = k as u16;
    }

    writer.write(prefix, size);
    if next > (1 << size) - 1 && size < MAX_CODE_SIZE {
        size += 1;
    }
    writer.write(EOI_CODE, size);
    writer.finish()
}

/// Assembles a looping GIF89a stream
#[derive(Debug)]
pub struct GifStreamWriter {
    buf: Vec<u8>,
    delay_cs: u16,
    frames: usize,
}

impl GifStreamWriter {
    /// Header, logical screen, global palette and loop extension
    pub fn new(width: u16, height: u16, frame_duration_ms: u32) -> Self {
        let mut buf = Vec::with_capacity(1024);
        buf.extend_from_slice(b"GIF89a");
        buf.extend_from_slice(&width.to_le_bytes());
        buf.extend_from_slice(&height.to_le_bytes());
        // global table, 8-bit colour resolution, 256 entries
        buf.push(0xF7);
        buf.push(0); // background index
        buf.push(0); // square pixels
        buf.extend_from_slice(&palette());

        buf.extend_from_slice(&[0x21, 0xFF, 0x0B]);
        buf.extend_from_slice(b"NETSCAPE2.0");
        buf.extend_from_slice(&[0x03, 0x01, 0x00, 0x00, 0x00]); // loop forever

        // Viewers treat a zero delay as "as fast as possible"
        let delay_cs = (frame_duration_ms / 10).clamp(1, u16::MAX as u32) as u16;
        Self {
            buf,
            delay_cs,
            frames: 0,
        }
    }

    pub fn delay(&self) -> u16 {
        self.delay_cs
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn push(&mut self, frame: &GifFrame) {
        // Graphic control: disposal "do not dispose", no transparency
        self.buf.extend_from_slice(&[0x21, 0xF9, 0x04, 0x04]);
        self.buf.extend_from_slice(&self.delay_cs.to_le_bytes());
        self.buf.extend_from_slice(&[0x00, 0x00]);

        self.buf.push(0x2C);
        self.buf.extend_from_slice(&[0, 0, 0, 0]);
        self.buf.extend_from_slice(&frame.width.to_le_bytes());
        self.buf.extend_from_slice(&frame.height.to_le_bytes());
        self.buf.push(0); // no local table, not interlaced

        self.buf.push(MIN_CODE_SIZE);
        for block in frame.lzw.chunks(255) {
            self.buf.push(block.len() as u8);
            self.buf.extend_from_slice(block);
        }
        self.buf.push(0);
        self.frames += 1;
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf.push(TRAILER);
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference decoder for the encoder's output
    fn lzw_decode(data: &[u8]) -> Vec<u8> {
        let mut table: Vec<Vec<u8>> = (0..=255u8).map(|i| vec![i]).collect();
        table.push(Vec::new());
        table.push(Vec::new());
        let mut size = MIN_CODE_SIZE + 1;
        let mut prev: Option<Vec<u8>> = None;
        let mut out = Vec::new();
        let (mut acc, mut bits, mut pos) = (0u32, 0u8, 0usize);

        loop {
            while bits < size {
                acc |= (data[pos] as u32) << bits;
                pos += 1;
                bits += 8;
            }
            let code = (acc & ((1 << size) - 1)) as u16;
            acc >>= size;
            bits -= size;

            if code == CLEAR_CODE {
                table.truncate(EOI_CODE as usize + 1);
                size = MIN_CODE_SIZE + 1;
                prev = None;
                continue;
            }
            if code == EOI_CODE {
                return out;
            }
            let entry = match (table.get(code as usize), &prev) {
                (Some(e), _) => e.clone(),
                (None, Some(p)) => {
                    let mut e = p.clone();
                    e.push(p[0]);
                    e
                }
                (None, None) => panic!("invalid first code {}", code),
            };
            out.extend_from_slice(&entry);
            if let Some(p) = prev {
                if table.len() < MAX_CODES as usize {
                    let mut e = p;
                    e.push(entry[0]);
                    table.push(e);
                }
            }
            if table.len() == 1 << size && size < MAX_CODE_SIZE {
                size += 1;
            }
            prev = Some(entry);
        }
    }

    #[test]
    fn lzw_round_trips_small_input() {
        let input = b"TOBEORNOTTOBEORTOBEORNOT".to_vec();
        assert_eq!(lzw_decode(&lzw_encode(&input)), input);
    }

    #[test]
    fn lzw_handles_empty_input() {
        assert!(lzw_decode(&lzw_encode(&[])).is_empty());
    }

    #[test]
    fn lzw_survives_dictionary_reset() {
        // Pseudo-random data fills the 4096-entry table several times over
        let mut state = 0x1234_5678u32;
        let input: Vec<u8> = (0..60_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect();
        assert_eq!(lzw_decode(&lzw_encode(&input)), input);
    }

    #[test]
    fn palette_extremes() {
        let table = palette();
        assert_eq!(&table[..3], &[0, 0, 0]);
        assert_eq!(&table[765..], &[255, 255, 255]);
        assert_eq!(quantize(255, 255, 255), 255);
        assert_eq!(quantize(255, 0, 0), 0b1110_0000);
    }

    #[test]
    fn wide_frames_are_downscaled() {
        assert_eq!(scaled_size(1920, 1080), (640, 360));
        assert_eq!(scaled_size(320, 200), (320, 200));
        let rgba = vec![200u8; 1280 * 4 * 4];
        let frame = GifFrame::from_rgba(1280, 4, &rgba).unwrap();
        assert_eq!((frame.width(), frame.height()), (640, 2));
    }

    #[test]
    fn stream_layout() {
        let rgba = vec![10u8; 4 * 3 * 4];
        let frame = GifFrame::from_rgba(4, 3, &rgba).unwrap();
        let mut writer = GifStreamWriter::new(4, 3, 100);
        writer.push(&frame);
        writer.push(&frame);
        assert_eq!(writer.delay(), 10);
        assert_eq!(writer.frame_count(), 2);
        let bytes = writer.finish();
        assert_eq!(&bytes[..6], b"GIF89a");
        assert_eq!(&bytes[6..10], &[4, 0, 3, 0]);
        assert_eq!(bytes[10], 0xF7);
        assert_eq!(bytes.last(), Some(&TRAILER));
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        assert!(GifFrame::from_rgba(4, 4, &[0; 8]).is_err());
    }
}
