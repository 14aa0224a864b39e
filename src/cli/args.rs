//! CLI argument definitions using Clap

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::capture::CaptureMode;
use crate::domain::encoding::{ContainerFamily, EncodingSettings, QualityTier};

/// ScreenReel - periodic screen capture into video files
#[derive(Parser, Debug)]
#[command(name = "screenreel")]
#[command(version)]
#[command(about = "Record the screen into MP4, AVI, GIF or image sequences with automatic format fallback")]
#[command(long_about = None)]
pub struct Cli {
    /// Recording duration (e.g., 30s, 1m, 1m30s). Without it, records until Ctrl+C
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Output container
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<ContainerArg>,

    /// Frames per second (1-120)
    #[arg(short = 'r', long, value_name = "FPS")]
    pub fps: Option<u32>,

    /// Quality tier
    #[arg(short = 'q', long, value_name = "TIER")]
    pub quality: Option<QualityArg>,

    /// What to capture
    #[arg(short = 'm', long, value_name = "MODE")]
    pub mode: Option<ModeArg>,

    /// Monitor index for full-screen capture
    #[arg(long, value_name = "N")]
    pub monitor: Option<usize>,

    /// Region to capture as x,y,width,height (implies --mode region)
    #[arg(long, value_name = "X,Y,W,H")]
    pub region: Option<String>,

    /// Output directory
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Output file name, without extension
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Try ffmpeg's H.264 encoder before the built-in MP4 writer
    #[arg(long)]
    pub external_encoder: bool,

    /// Record a synthetic test pattern instead of the screen
    #[arg(long)]
    pub test_pattern: bool,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Debug logging on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List monitors available for capture
    Monitors {
        /// Query the synthetic test pattern source instead of the screen
        #[arg(long)]
        test_pattern: bool,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ContainerArg {
    Mp4,
    Avi,
    Gif,
    Images,
    Html,
}

impl From<ContainerArg> for ContainerFamily {
    fn from(arg: ContainerArg) -> Self {
        match arg {
            ContainerArg::Mp4 => ContainerFamily::Mp4,
            ContainerArg::Avi => ContainerFamily::Avi,
            ContainerArg::Gif => ContainerFamily::Gif,
            ContainerArg::Images => ContainerFamily::ImageSequence,
            ContainerArg::Html => ContainerFamily::HtmlSequence,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum QualityArg {
    Low,
    Medium,
    High,
    Ultra,
}

impl From<QualityArg> for QualityTier {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Low => QualityTier::Low,
            QualityArg::Medium => QualityTier::Medium,
            QualityArg::High => QualityTier::High,
            QualityArg::Ultra => QualityTier::Ultra,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Full,
    Window,
    Region,
}

impl From<ModeArg> for CaptureMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Full => CaptureMode::FullScreen,
            ModeArg::Window => CaptureMode::ActiveWindow,
            ModeArg::Region => CaptureMode::CustomRegion,
        }
    }
}

/// Parsed record options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub settings: EncodingSettings,
    pub notify: bool,
    pub test_pattern: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "output_dir",
    "file_name",
    "container",
    "frame_rate",
    "quality",
    "capture_mode",
    "monitor",
    "region",
    "duration",
    "notify",
    "external_encoder",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["screenreel"]);
        assert!(cli.duration.is_none());
        assert!(cli.format.is_none());
        assert!(cli.fps.is_none());
        assert!(!cli.external_encoder);
        assert!(!cli.test_pattern);
        assert!(!cli.notify);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_recording_flags() {
        let cli = Cli::parse_from([
            "screenreel", "-d", "10s", "-f", "gif", "-r", "12", "-q", "ultra", "-m", "window",
        ]);
        assert_eq!(cli.duration, Some("10s".to_string()));
        assert_eq!(cli.format, Some(ContainerArg::Gif));
        assert_eq!(cli.fps, Some(12));
        assert_eq!(cli.quality, Some(QualityArg::Ultra));
        assert_eq!(cli.mode, Some(ModeArg::Window));
    }

    #[test]
    fn cli_parses_region_and_output() {
        let cli = Cli::parse_from([
            "screenreel", "--region", "0,0,800,600", "-o", "/tmp/out", "--name", "demo",
        ]);
        assert_eq!(cli.region, Some("0,0,800,600".to_string()));
        assert_eq!(cli.output_dir, Some("/tmp/out".to_string()));
        assert_eq!(cli.name, Some("demo".to_string()));
    }

    #[test]
    fn cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["screenreel", "-f", "webm"]).is_err());
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["screenreel", "config", "set", "container", "avi"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "container");
            assert_eq!(value, "avi");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn cli_parses_monitors() {
        let cli = Cli::parse_from(["screenreel", "monitors", "--test-pattern"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Monitors { test_pattern: true })
        ));
    }

    #[test]
    fn value_enums_convert() {
        assert_eq!(ContainerFamily::from(ContainerArg::Images), ContainerFamily::ImageSequence);
        assert_eq!(QualityTier::from(QualityArg::Low), QualityTier::Low);
        assert_eq!(CaptureMode::from(ModeArg::Region), CaptureMode::CustomRegion);
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("frame_rate"));
        assert!(is_valid_config_key("external_encoder"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
