//! Screen capture providers

mod ffmpeg_grab;
mod test_pattern;

pub use ffmpeg_grab::{parse_xdotool_geometry, parse_xrandr_monitors, FfmpegScreenCapturer};
pub use test_pattern::{render_pattern, TestPatternCapturer, TEST_PATTERN_HEIGHT, TEST_PATTERN_WIDTH};
