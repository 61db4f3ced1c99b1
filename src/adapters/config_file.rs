//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] on a single JSON document.
//!
//! - Missing file: defaults, nothing is written.
//! - Validation: every field is range-checked on load and before save.
//! - Atomic writes: the document is written to a sibling temp file and
//!   renamed over the target.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::AppConfig;

pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn validate_config(cfg: &AppConfig) -> Result<(), ConfigError> {
    if cfg.app_name.trim().is_empty() {
        return Err(ConfigError::ValidationFailed("app_name must not be empty"));
    }
    if cfg.app_name.contains(['/', '\\']) {
        return Err(ConfigError::ValidationFailed(
            "app_name must not contain path separators",
        ));
    }
    if cfg.log.max_files == 0 {
        return Err(ConfigError::ValidationFailed("log.max_files must be at least 1"));
    }
    if cfg.log.level.parse::<log::LevelFilter>().is_err() {
        return Err(ConfigError::ValidationFailed(
            "log.level must be off, error, warn, info, debug or trace",
        ));
    }
    if !(-40.0..=125.0).contains(&cfg.hardware.sim_temperature_c) {
        return Err(ConfigError::ValidationFailed(
            "hardware.sim_temperature_c must be -40.0–125.0",
        ));
    }
    if cfg.wifi.ssid.len() > 32 {
        return Err(ConfigError::ValidationFailed("wifi.ssid must be at most 32 bytes"));
    }
    if !cfg.wifi.password.is_empty() && !(8..=64).contains(&cfg.wifi.password.len()) {
        return Err(ConfigError::ValidationFailed(
            "wifi.password must be empty or 8–64 bytes",
        ));
    }
    if !(1..=300).contains(&cfg.wifi.connect_timeout_secs) {
        return Err(ConfigError::ValidationFailed(
            "wifi.connect_timeout_secs must be 1–300",
        ));
    }
    if !(1..=16 * 1024 * 1024).contains(&cfg.web.max_body_bytes) {
        return Err(ConfigError::ValidationFailed(
            "web.max_body_bytes must be 1–16777216",
        ));
    }
    Ok(())
}

impl ConfigPort for JsonFileConfig {
    fn load(&self) -> Result<AppConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Config: {} not found, using defaults", self.path.display());
                return Ok(AppConfig::default());
            }
            Err(e) => {
                warn!("Config: read {} failed: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };

        let cfg: AppConfig = serde_json::from_str(&text).map_err(|e| {
            warn!("Config: {} is not valid JSON: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        validate_config(&cfg)?;
        info!("Config: loaded {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        validate_config(config)?;

        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::IoError)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|_| ConfigError::IoError)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|e| {
                warn!("Config: write {} failed: {}", self.path.display(), e);
                ConfigError::IoError
            })?;
        info!("Config: saved {}", self.path.display());
        Ok(())
    }
}
