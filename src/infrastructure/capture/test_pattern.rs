//! Synthetic capture source

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::application::ports::{CaptureError, ScreenCapturer};
use crate::domain::capture::{MonitorInfo, Region, BYTES_PER_PIXEL};

pub const TEST_PATTERN_WIDTH: u32 = 640;
pub const TEST_PATTERN_HEIGHT: u32 = 360;

/// Colour bars with a bright band sweeping across at each capture.
///
/// Exposes a single primary monitor; every capture is deterministic given
/// the number of previous captures.
#[derive(Debug)]
pub struct TestPatternCapturer {
    monitor: Region,
    ticks: AtomicU64,
}

impl TestPatternCapturer {
    pub fn new() -> Self {
        Self::with_size(TEST_PATTERN_WIDTH, TEST_PATTERN_HEIGHT)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            monitor: Region::new(0, 0, width, height),
            ticks: AtomicU64::new(0),
        }
    }

    /// Captures served so far
    pub fn captures(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Default for TestPatternCapturer {
    fn default() -> Self {
        Self::new()
    }
}

const BARS: [[u8; 3]; 8] = [
    [235, 235, 235],
    [235, 235, 16],
    [16, 235, 235],
    [16, 235, 16],
    [235, 16, 235],
    [235, 16, 16],
    [16, 16, 235],
    [16, 16, 16],
];

/// Fill `buffer` with the pattern for capture number `tick`
pub fn render_pattern(region: Region, tick: u64, buffer: &mut Vec<u8>) {
    let (width, height) = (region.width as usize, region.height as usize);
    buffer.clear();
    buffer.reserve(width * height * BYTES_PER_PIXEL);

    let band = (tick as usize * 8) % width.max(1);
    for y in 0..height {
        for x in 0..width {
            let gx = (x as i64 + region.x as i64).unsigned_abs() as usize;
            let [r, g, b] = if x.abs_diff(band) < 4 {
                [255, 255, 255]
            } else if y * 4 >= height * 3 {
                let v = (gx * 255 / width.max(1)) as u8;
                [v, v, v]
            } else {
                BARS[gx * BARS.len() / width.max(1) % BARS.len()]
            };
            buffer.extend_from_slice(&[r, g, b, 255]);
        }
    }
}

#[async_trait]
impl ScreenCapturer for TestPatternCapturer {
    async fn monitors(&self) -> Result<Vec<MonitorInfo>, CaptureError> {
        Ok(vec![MonitorInfo {
            index: 0,
            name: "test-pattern".to_string(),
            bounds: self.monitor,
            primary: true,
        }])
    }

    async fn active_window_bounds(&self) -> Result<Region, CaptureError> {
        // Centre half of the screen stands in for a window
        let (w, h) = (self.monitor.width / 2, self.monitor.height / 2);
        Ok(Region::new((w / 2) as i32, (h / 2) as i32, w.max(1), h.max(1)))
    }

    async fn capture_region(&self, region: Region, buffer: &mut Vec<u8>) -> Result<(), CaptureError> {
        if !region.is_capturable() {
            return Err(CaptureError::InvalidRegion(region));
        }
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        render_pattern(region, tick, buffer);
        Ok(())
    }
}
