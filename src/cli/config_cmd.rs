//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::capture::{CaptureMode, Region};
use crate::domain::config::AppConfig;
use crate::domain::encoding::{ContainerFamily, QualityTier, MAX_FRAME_RATE, MIN_FRAME_RATE};
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

/// Validate `value` for `key` and store it in canonical form
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "output_dir" => config.output_dir = Some(value.to_string()),
        "file_name" => {
            if value.contains(['/', '\\']) {
                return Err(invalid("File name must not contain path separators".to_string()));
            }
            config.file_name = Some(value.to_string());
        }
        "container" => {
            let family: ContainerFamily = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            config.container = Some(family.to_string());
        }
        "frame_rate" => {
            let fps: u32 = value
                .parse()
                .ok()
                .filter(|fps| (MIN_FRAME_RATE..=MAX_FRAME_RATE).contains(fps))
                .ok_or_else(|| {
                    invalid(format!(
                        "Value must be a whole number from {} to {}",
                        MIN_FRAME_RATE, MAX_FRAME_RATE
                    ))
                })?;
            config.frame_rate = Some(fps);
        }
        "quality" => {
            let tier: QualityTier = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            config.quality = Some(tier.as_str().to_string());
        }
        "capture_mode" => {
            let mode: CaptureMode = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            config.capture_mode = Some(mode.as_str().to_string());
        }
        "monitor" => {
            let index: usize = value
                .parse()
                .map_err(|_| invalid("Value must be a monitor index".to_string()))?;
            config.monitor = Some(index);
        }
        "region" => {
            let region: Region = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            if !region.is_capturable() {
                return Err(invalid("Region must be non-empty and within capture limits".to_string()));
            }
            config.region = Some(region.to_string());
        }
        "duration" => {
            value
                .parse::<Duration>()
                .map_err(|e| invalid(e.to_string()))?;
            config.duration = Some(value.to_string());
        }
        "notify" => config.notify = Some(parse_bool(value).map_err(|_| invalid(bool_message()))?),
        "external_encoder" => {
            config.external_encoder = Some(parse_bool(value).map_err(|_| invalid(bool_message()))?)
        }
        _ => return Err(invalid("Unknown key".to_string())),
    }
    Ok(())
}

fn bool_message() -> String {
    "Value must be 'true' or 'false'".to_string()
}

/// Current value of `key`, if set
fn value_of(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "output_dir" => config.output_dir.clone(),
        "file_name" => config.file_name.clone(),
        "container" => config.container.clone(),
        "frame_rate" => config.frame_rate.map(|v| v.to_string()),
        "quality" => config.quality.clone(),
        "capture_mode" => config.capture_mode.clone(),
        "monitor" => config.monitor.map(|v| v.to_string()),
        "region" => config.region.clone(),
        "duration" => config.duration.clone(),
        "notify" => config.notify.map(|v| v.to_string()),
        "external_encoder" => config.external_encoder.map(|v| v.to_string()),
        _ => None,
    }
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    match value_of(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        let value = value_of(&config, key);
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::XdgConfigStore;

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("false"), Ok(false));
        assert_eq!(parse_bool("yes"), Ok(true));
        assert_eq!(parse_bool("no"), Ok(false));
        assert_eq!(parse_bool("1"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("invalid").is_err());
    }

    #[test]
    fn container_is_stored_canonically() {
        let mut config = AppConfig::empty();
        apply_value(&mut config, "container", "MJPEG").unwrap();
        assert_eq!(config.container, Some("avi".to_string()));
    }

    #[test]
    fn frame_rate_bounds() {
        let mut config = AppConfig::empty();
        assert!(apply_value(&mut config, "frame_rate", "0").is_err());
        assert!(apply_value(&mut config, "frame_rate", "121").is_err());
        assert!(apply_value(&mut config, "frame_rate", "fast").is_err());
        apply_value(&mut config, "frame_rate", "120").unwrap();
        assert_eq!(config.frame_rate, Some(120));
    }

    #[test]
    fn region_must_be_capturable() {
        let mut config = AppConfig::empty();
        assert!(apply_value(&mut config, "region", "0,0,0,0").is_err());
        assert!(apply_value(&mut config, "region", "1,2,3").is_err());
        apply_value(&mut config, "region", " 10, 20, 640, 480").unwrap();
        assert_eq!(config.region, Some("10,20,640,480".to_string()));
    }

    #[test]
    fn duration_and_flags() {
        let mut config = AppConfig::empty();
        apply_value(&mut config, "duration", "1m30s").unwrap();
        assert!(apply_value(&mut config, "duration", "soon").is_err());
        apply_value(&mut config, "external_encoder", "yes").unwrap();
        assert_eq!(config.external_encoder, Some(true));
        assert!(apply_value(&mut config, "notify", "maybe").is_err());
    }

    #[test]
    fn file_name_rejects_separators() {
        let mut config = AppConfig::empty();
        assert!(apply_value(&mut config, "file_name", "a/b").is_err());
        apply_value(&mut config, "file_name", "demo").unwrap();
        assert_eq!(value_of(&config, "file_name"), Some("demo".to_string()));
    }

    #[tokio::test]
    async fn set_then_get_round_trips_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        let presenter = Presenter::new();

        handle_config_command(
            ConfigAction::Set {
                key: "quality".to_string(),
                value: "HIGH".to_string(),
            },
            &store,
            &presenter,
        )
        .await
        .unwrap();

        let config = store.load().await.unwrap();
        assert_eq!(config.quality, Some("high".to_string()));
    }

    #[tokio::test]
    async fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        let result = handle_config_command(
            ConfigAction::Get {
                key: "api_key".to_string(),
            },
            &store,
            &Presenter::new(),
        )
        .await;
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
