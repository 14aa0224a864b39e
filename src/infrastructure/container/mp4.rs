//! MP4 writer storing every frame as an independent JPEG sample

use crate::domain::capture::CompressedFrame;
use crate::domain::error::ContainerError;

use super::atom::AtomBuilder;

/// Movie and media timescale (milliseconds)
pub const TIMESCALE: u32 = 1000;

const IDENTITY_MATRIX: [u32; 9] = [0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000];

/// ISO-639-2 "und" packed as three 5-bit letters
const LANGUAGE_UND: u16 =
    (((b'u' - 0x60) as u16) << 10) | (((b'n' - 0x60) as u16) << 5) | ((b'd' - 0x60) as u16);

/// Absolute file offsets of each stored sample, in storage order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChunkOffsetTable {
    offsets: Vec<u32>,
}

impl ChunkOffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the offset of the next sample; must fit a 32-bit `stco` entry
    pub fn record(&mut self, offset: u64) -> Result<(), ContainerError> {
        let offset32 = u32::try_from(offset).map_err(|_| ContainerError::OffsetOverflow { offset })?;
        self.offsets.push(offset32);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }
}

/// Lays out `ftyp`, `mdat` and `moov` for a sequence of JPEG samples
#[derive(Debug, Clone, Copy)]
pub struct Mp4AtomWriter {
    width: u32,
    height: u32,
    frame_rate: u32,
}

impl Mp4AtomWriter {
    pub fn new(width: u32, height: u32, frame_rate: u32) -> Self {
        Self {
            width,
            height,
            frame_rate: frame_rate.max(1),
        }
    }

    /// Duration of `count` samples in timescale units
    pub fn duration_for(&self, count: usize) -> u64 {
        count as u64 * TIMESCALE as u64 / self.frame_rate as u64
    }

    /// Per-sample duration in timescale units
    pub fn sample_delta(&self) -> u32 {
        TIMESCALE / self.frame_rate
    }

    /// Build the complete file image
    pub fn write(&self, frames: &[CompressedFrame]) -> Result<Vec<u8>, ContainerError> {
        let width = fit_u16("width", self.width)?;
        let height = fit_u16("height", self.height)?;
        let duration = fit_u32("duration", self.duration_for(frames.len()))?;
        let sizes = frames
            .iter()
            .map(|f| fit_u32("sample size", f.len() as u64))
            .collect::<Result<Vec<_>, _>>()?;

        let mut b = AtomBuilder::new();
        self.write_ftyp(&mut b)?;

        let mut table = ChunkOffsetTable::new();
        b.open(b"mdat");
        for frame in frames {
            table.record(b.position())?;
            b.bytes(frame.data());
        }
        b.close()?;

        b.open(b"moov");
        self.write_mvhd(&mut b, duration)?;
        b.open(b"trak");
        self.write_tkhd(&mut b, duration)?;
        b.open(b"mdia");
        self.write_mdhd(&mut b, duration)?;
        write_hdlr(&mut b)?;
        b.open(b"minf");
        write_vmhd(&mut b)?;
        write_dinf(&mut b)?;
        b.open(b"stbl");
        write_stsd(&mut b, width, height)?;
        self.write_stts(&mut b, frames.len() as u32)?;
        write_stsc(&mut b, frames.len())?;
        write_stsz(&mut b, &sizes)?;
        write_stco(&mut b, &table)?;
        b.close()?; // stbl
        b.close()?; // minf
        b.close()?; // mdia
        b.close()?; // trak
        b.close()?; // moov

        b.finish()
    }

    fn write_ftyp(&self, b: &mut AtomBuilder) -> Result<(), ContainerError> {
        b.open(b"ftyp");
        b.bytes(b"mp42");
        b.u32(0);
        for brand in [b"mp42", b"mp41", b"isom"] {
            b.bytes(brand);
        }
        b.close()
    }

    fn write_mvhd(&self, b: &mut AtomBuilder, duration: u32) -> Result<(), ContainerError> {
        b.open_full(b"mvhd", 0, 0);
        b.u32(0); // creation time
        b.u32(0); // modification time
        b.u32(TIMESCALE);
        b.u32(duration);
        b.u32(0x0001_0000); // rate 1.0
        b.u16(0x0100); // volume 1.0
        b.zeros(10);
        for v in IDENTITY_MATRIX {
            b.u32(v);
        }
        b.zeros(24); // pre_defined
        b.u32(2); // next track id
        b.close()
    }

    fn write_tkhd(&self, b: &mut AtomBuilder, duration: u32) -> Result<(), ContainerError> {
        // flags: enabled | in movie | in preview
        b.open_full(b"tkhd", 0, 0x0000_0007);
        b.u32(0);
        b.u32(0);
        b.u32(1); // track id
        b.u32(0);
        b.u32(duration);
        b.zeros(8);
        b.i16(0); // layer
        b.i16(0); // alternate group
        b.i16(0); // volume, video track
        b.u16(0);
        for v in IDENTITY_MATRIX {
            b.u32(v);
        }
        b.u32(self.width << 16);
        b.u32(self.height << 16);
        b.close()
    }

    fn write_mdhd(&self, b: &mut AtomBuilder, duration: u32) -> Result<(), ContainerError> {
        b.open_full(b"mdhd", 0, 0);
        b.u32(0);
        b.u32(0);
        b.u32(TIMESCALE);
        b.u32(duration);
        b.u16(LANGUAGE_UND);
        b.u16(0);
        b.close()
    }

    fn write_stts(&self, b: &mut AtomBuilder, count: u32) -> Result<(), ContainerError> {
        b.open_full(b"stts", 0, 0);
        if count == 0 {
            b.u32(0);
        } else {
            b.u32(1);
            b.u32(count);
            b.u32(self.sample_delta());
        }
        b.close()
    }
}

fn fit_u16(field: &'static str, value: u32) -> Result<u16, ContainerError> {
    u16::try_from(value).map_err(|_| ContainerError::FieldOverflow {
        field,
        value: value as u64,
    })
}

fn fit_u32(field: &'static str, value: u64) -> Result<u32, ContainerError> {
    u32::try_from(value).map_err(|_| ContainerError::FieldOverflow { field, value })
}

fn write_hdlr(b: &mut AtomBuilder) -> Result<(), ContainerError> {
    b.open_full(b"hdlr", 0, 0);
    b.u32(0);
    b.bytes(b"vide");
    b.zeros(12);
    b.bytes(b"VideoHandler\0");
    b.close()
}

fn write_vmhd(b: &mut AtomBuilder) -> Result<(), ContainerError> {
    b.open_full(b"vmhd", 0, 1);
    b.u16(0); // graphics mode: copy
    b.zeros(6); // opcolor
    b.close()
}

fn write_dinf(b: &mut AtomBuilder) -> Result<(), ContainerError> {
    b.open(b"dinf");
    b.open_full(b"dref", 0, 0);
    b.u32(1);
    // Self-contained: media lives in this file
    b.open_full(b"url ", 0, 1);
    b.close()?;
    b.close()?;
    b.close()
}

fn write_stsd(b: &mut AtomBuilder, width: u16, height: u16) -> Result<(), ContainerError> {
    b.open_full(b"stsd", 0, 0);
    b.u32(1);
    b.open(b"jpeg");
    b.zeros(6);
    b.u16(1); // data reference index
    b.u16(0);
    b.u16(0);
    b.zeros(12);
    b.u16(width);
    b.u16(height);
    b.u32(0x0048_0000); // 72 dpi
    b.u32(0x0048_0000);
    b.u32(0);
    b.u16(1); // frames per sample
    let name = b"Photo - JPEG";
    let mut compressor = [0u8; 32];
    compressor[0] = name.len() as u8;
    compressor[1..=name.len()].copy_from_slice(name);
    b.bytes(&compressor);
    b.u16(0x0018); // depth
    b.i16(-1);
    b.close()?;
    b.close()
}

/// One sample per chunk, so every `stco` entry is a valid chunk offset
fn write_stsc(b: &mut AtomBuilder, count: usize) -> Result<(), ContainerError> {
    b.open_full(b"stsc", 0, 0);
    if count == 0 {
        b.u32(0);
    } else {
        b.u32(1);
        b.u32(1); // first chunk
        b.u32(1); // samples per chunk
        b.u32(1); // sample description index
    }
    b.close()
}

fn write_stsz(b: &mut AtomBuilder, sizes: &[u32]) -> Result<(), ContainerError> {
    b.open_full(b"stsz", 0, 0);
    b.u32(0); // sizes vary
    b.u32(sizes.len() as u32);
    for size in sizes {
        b.u32(*size);
    }
    b.close()
}

fn write_stco(b: &mut AtomBuilder, table: &ChunkOffsetTable) -> Result<(), ContainerError> {
    b.open_full(b"stco", 0, 0);
    b.u32(table.len() as u32);
    for offset in table.offsets() {
        b.u32(*offset);
    }
    b.close()
}
