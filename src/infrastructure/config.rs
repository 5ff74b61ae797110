use crate::infrastructure::error::InfraError;
use crate::infrastructure::foreground_service::ForegroundServiceConfig;
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const DEFAULT_TICK_INTERVAL_SECONDS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub app_name: String,
    pub timezone: Tz,
    pub device_id: Option<String>,
    pub tick_interval_seconds: u64,
    pub foreground_service: ForegroundServiceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "SirenBlock".to_string(),
            timezone: Tz::UTC,
            device_id: None,
            tick_interval_seconds: DEFAULT_TICK_INTERVAL_SECONDS,
            foreground_service: ForegroundServiceConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), InfraError> {
        if self.tick_interval_seconds == 0 {
            return Err(InfraError::InvalidConfig(
                "tickIntervalSeconds must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppConfigFile {
    app_name: Option<String>,
    timezone: Option<String>,
    device_id: Option<String>,
    tick_interval_seconds: Option<u64>,
    foreground_service: Option<ForegroundServiceConfig>,
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    let defaults = EngineConfig::default();
    HashMap::from([(
        APP_JSON,
        serde_json::json!({
            "schema": 1,
            "appName": defaults.app_name,
            "timezone": "UTC",
            "deviceId": null,
            "tickIntervalSeconds": defaults.tick_interval_seconds,
            "foregroundService": defaults.foreground_service,
        }),
    )])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn parse_timezone(value: &str) -> Result<Tz, InfraError> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|error| InfraError::InvalidConfig(format!("unknown timezone '{value}': {error}")))
}

pub fn load_engine_config(config_dir: &Path) -> Result<EngineConfig, InfraError> {
    let path = config_dir.join(APP_JSON);
    let file: AppConfigFile = serde_json::from_value(read_config(&path)?)?;
    let defaults = EngineConfig::default();

    let timezone = match file
        .timezone
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        Some(name) => parse_timezone(name)?,
        None => defaults.timezone,
    };
    let tick_interval_seconds = file
        .tick_interval_seconds
        .unwrap_or(defaults.tick_interval_seconds);

    let config = EngineConfig {
        app_name: file
            .app_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or(defaults.app_name),
        timezone,
        device_id: file
            .device_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()),
        tick_interval_seconds,
        foreground_service: file
            .foreground_service
            .unwrap_or(defaults.foreground_service),
    };
    config.validate().map_err(|error| match error {
        InfraError::InvalidConfig(message) => {
            InfraError::InvalidConfig(format!("{message} in {}", path.display()))
        }
        other => other,
    })?;
    Ok(config)
}
