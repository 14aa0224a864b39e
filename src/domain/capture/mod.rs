//! Captured frames and capture geometry

mod frame;
mod region;

pub use frame::{human_readable_size, CompressedFrame, Frame, ImageFormat, BYTES_PER_PIXEL};
pub use region::{CaptureMode, MonitorInfo, Region, MAX_REGION_HEIGHT, MAX_REGION_WIDTH};
