//! Capture geometry value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::SettingsError;

/// Largest capturable width (8K UHD)
pub const MAX_REGION_WIDTH: u32 = 7680;

/// Largest capturable height (8K UHD)
pub const MAX_REGION_HEIGHT: u32 = 4320;

/// A rectangle in virtual-desktop coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the region covers no pixels
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the region can be captured: non-empty and within 8K
    pub const fn is_capturable(&self) -> bool {
        !self.is_empty() && self.width <= MAX_REGION_WIDTH && self.height <= MAX_REGION_HEIGHT
    }

    /// Pixel count
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for Region {
    type Err = SettingsError;

    /// Parse `x,y,width,height`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SettingsError::InvalidRegion(s.to_string());
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, w, h] = parts.as_slice() else {
            return Err(invalid());
        };

        Ok(Self {
            x: x.parse().map_err(|_| invalid())?,
            y: y.parse().map_err(|_| invalid())?,
            width: w.parse().map_err(|_| invalid())?,
            height: h.parse().map_err(|_| invalid())?,
        })
    }
}

/// What part of the screen a recording captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureMode {
    #[default]
    FullScreen,
    ActiveWindow,
    CustomRegion,
}

impl CaptureMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FullScreen => "full",
            Self::ActiveWindow => "window",
            Self::CustomRegion => "region",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CaptureMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" | "fullscreen" | "screen" => Ok(Self::FullScreen),
            "window" | "active" | "activewindow" => Ok(Self::ActiveWindow),
            "region" | "custom" | "customregion" => Ok(Self::CustomRegion),
            _ => Err(SettingsError::InvalidCaptureMode(s.to_string())),
        }
    }
}

/// A display reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    pub index: usize,
    pub name: String,
    pub bounds: Region,
    pub primary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region_is_not_capturable() {
        assert!(!Region::new(0, 0, 0, 0).is_capturable());
        assert!(!Region::new(10, 10, 100, 0).is_capturable());
    }

    #[test]
    fn oversized_region_is_not_capturable() {
        assert!(!Region::new(0, 0, MAX_REGION_WIDTH + 1, 100).is_capturable());
        assert!(!Region::new(0, 0, 100, MAX_REGION_HEIGHT + 1).is_capturable());
        assert!(Region::new(0, 0, MAX_REGION_WIDTH, MAX_REGION_HEIGHT).is_capturable());
    }

    #[test]
    fn parse_region() {
        let region: Region = "10, -20, 640, 480".parse().unwrap();
        assert_eq!(region, Region::new(10, -20, 640, 480));
        assert_eq!(region.to_string(), "10,-20,640,480");
    }

    #[test]
    fn parse_region_invalid() {
        assert!("1,2,3".parse::<Region>().is_err());
        assert!("a,b,c,d".parse::<Region>().is_err());
        assert!("0,0,-5,10".parse::<Region>().is_err());
    }

    #[test]
    fn capture_mode_parse() {
        assert_eq!("full".parse::<CaptureMode>().unwrap(), CaptureMode::FullScreen);
        assert_eq!("Window".parse::<CaptureMode>().unwrap(), CaptureMode::ActiveWindow);
        assert_eq!("region".parse::<CaptureMode>().unwrap(), CaptureMode::CustomRegion);
        assert!("tab".parse::<CaptureMode>().is_err());
    }
}
