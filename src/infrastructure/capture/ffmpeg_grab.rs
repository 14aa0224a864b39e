//! One-shot screen grabs through the ffmpeg CLI

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::{CaptureError, ScreenCapturer};
use crate::domain::capture::{MonitorInfo, Region, BYTES_PER_PIXEL};

/// Captures regions with `x11grab` (Linux) or `gdigrab` (Windows).
///
/// Monitors come from `xrandr --listmonitors` and the focused window from
/// `xdotool`, so those tools must be installed for the matching modes.
pub struct FfmpegScreenCapturer {
    display: String,
}

impl FfmpegScreenCapturer {
    pub fn new() -> Self {
        Self {
            display: std::env::var("DISPLAY").unwrap_or_else(|_| ":0".to_string()),
        }
    }

    /// Arguments for a single RGBA frame of `region` on stdout
    pub fn build_args(&self, region: Region) -> Vec<String> {
        let size = format!("{}x{}", region.width, region.height);
        let mut args = vec!["-loglevel".to_string(), "error".to_string()];
        if cfg!(windows) {
            args.extend([
                "-f".to_string(),
                "gdigrab".to_string(),
                "-offset_x".to_string(),
                region.x.to_string(),
                "-offset_y".to_string(),
                region.y.to_string(),
                "-video_size".to_string(),
                size,
                "-i".to_string(),
                "desktop".to_string(),
            ]);
        } else {
            args.extend([
                "-f".to_string(),
                "x11grab".to_string(),
                "-video_size".to_string(),
                size,
                "-i".to_string(),
                format!("{}+{},{}", self.display, region.x, region.y),
            ]);
        }
        args.extend([
            "-frames:v".to_string(),
            "1".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgba".to_string(),
            "-".to_string(),
        ]);
        args
    }
}

impl Default for FfmpegScreenCapturer {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_tool(program: &str, args: &[&str]) -> Result<String, CaptureError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CaptureError::ToolNotFound(program.to_string())
            } else {
                CaptureError::CaptureFailed(format!("{}: {}", program, e))
            }
        })?;
    if !output.status.success() {
        return Err(CaptureError::CaptureFailed(format!(
            "{} exited with status: {}",
            program, output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl ScreenCapturer for FfmpegScreenCapturer {
    async fn monitors(&self) -> Result<Vec<MonitorInfo>, CaptureError> {
        if cfg!(windows) {
            return Err(CaptureError::MonitorUnavailable);
        }
        let listing = run_tool("xrandr", &["--listmonitors"]).await?;
        let monitors = parse_xrandr_monitors(&listing);
        if monitors.is_empty() {
            return Err(CaptureError::MonitorUnavailable);
        }
        Ok(monitors)
    }

    async fn active_window_bounds(&self) -> Result<Region, CaptureError> {
        let shell = run_tool("xdotool", &["getactivewindow", "getwindowgeometry", "--shell"]).await?;
        parse_xdotool_geometry(&shell)
            .ok_or_else(|| CaptureError::CaptureFailed("unrecognized xdotool output".to_string()))
    }

    async fn capture_region(&self, region: Region, buffer: &mut Vec<u8>) -> Result<(), CaptureError> {
        if !region.is_capturable() {
            return Err(CaptureError::InvalidRegion(region));
        }
        let args = self.build_args(region);
        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptureError::ToolNotFound("ffmpeg".to_string())
                } else {
                    CaptureError::CaptureFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureError::CaptureFailed(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        let expected = region.area() as usize * BYTES_PER_PIXEL;
        if output.stdout.len() != expected {
            return Err(CaptureError::CaptureFailed(format!(
                "expected {} bytes of RGBA, got {}",
                expected,
                output.stdout.len()
            )));
        }

        debug!(region = %region, bytes = expected, "captured region");
        buffer.clear();
        buffer.extend_from_slice(&output.stdout);
        Ok(())
    }
}

/// Parse `xrandr --listmonitors`:
///
/// ```text
/// Monitors: 2
///  0: +*DP-1 2560/597x1440/336+0+0  DP-1
///  1: +HDMI-1 1920/527x1080/296+2560+0  HDMI-1
/// ```
pub fn parse_xrandr_monitors(listing: &str) -> Vec<MonitorInfo> {
    listing
        .lines()
        .filter_map(|line| {
            let (index, rest) = line.trim().split_once(':')?;
            let index = index.trim().parse().ok()?;
            let mut fields = rest.split_whitespace();
            let flagged = fields.next()?;
            let bounds = parse_xrandr_geometry(fields.next()?)?;
            Some(MonitorInfo {
                index,
                name: flagged.trim_start_matches(['+', '*']).to_string(),
                bounds,
                primary: flagged.contains('*'),
            })
        })
        .collect()
}

/// `2560/597x1440/336+0+0` (pixels/millimetres, then offsets)
fn parse_xrandr_geometry(geometry: &str) -> Option<Region> {
    let (width, rest) = geometry.split_once('x')?;
    let width = width.split('/').next()?.parse().ok()?;
    let split = rest.find(['+', '-'])?;
    let (height, offsets) = rest.split_at(split);
    let height = height.split('/').next()?.parse().ok()?;

    let second = offsets[1..].find(['+', '-'])? + 1;
    let (x, y) = offsets.split_at(second);
    let x = x.trim_start_matches('+').parse().ok()?;
    let y = y.trim_start_matches('+').parse().ok()?;
    Some(Region::new(x, y, width, height))
}

/// Parse `xdotool getwindowgeometry --shell` (`X=`, `Y=`, `WIDTH=`, `HEIGHT=`)
pub fn parse_xdotool_geometry(shell: &str) -> Option<Region> {
    let value = |key: &str| {
        shell
            .lines()
            .find_map(|line| line.trim().strip_prefix(key)?.strip_prefix('='))
    };
    Some(Region::new(
        value("X")?.parse().ok()?,
        value("Y")?.parse().ok()?,
        value("WIDTH")?.parse().ok()?,
        value("HEIGHT")?.parse().ok()?,
    ))
}
