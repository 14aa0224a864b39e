//! Container writers
//!
//! Binary containers are assembled in memory and written in one go.

pub mod atom;
pub mod gif;
pub mod html_sequence;
pub mod image_sequence;
pub mod mp4;
pub mod riff;

pub use atom::{parse_boxes, AtomBuilder, BoxNode};
pub use gif::{GifFrame, GifStreamWriter, GIF_FRAME_CAP, GIF_MAX_WIDTH};
pub use html_sequence::HtmlSequenceWriter;
pub use image_sequence::{frames_dir, ImageSequenceWriter, SequenceManifest, MANIFEST_NAME};
pub use mp4::{ChunkOffsetTable, Mp4AtomWriter};
pub use riff::{parse_riff, AviRiffWriter, RiffBuilder, RiffNode};
