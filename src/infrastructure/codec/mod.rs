//! Still-image compression of captured frames

mod frame_codec;

pub use frame_codec::{decode_rgba, FrameCodec, JpegCompressor};
