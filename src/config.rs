//! Application configuration.
//!
//! All tunable parameters for an application built on the framework.
//! Every section has defaults, so a partial JSON file (or none at all)
//! yields a usable configuration. Loaded and persisted through
//! [`ConfigPort`](crate::app::ports::ConfigPort).

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name used in log lines and log file names.
    pub app_name: String,
    /// Pause between two `run` hook calls (milliseconds, 0 = none).
    pub loop_interval_ms: u32,

    pub log: LogConfig,
    pub hardware: HardwareConfig,
    pub wifi: WifiConfig,
    pub web: WebConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "RPIApp".into(),
            loop_interval_ms: 0,
            log: LogConfig::default(),
            hardware: HardwareConfig::default(),
            wifi: WifiConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl AppConfig {
    /// Configuration for a named application, defaults elsewhere.
    pub fn named(app_name: &str) -> Self {
        Self {
            app_name: app_name.into(),
            ..Self::default()
        }
    }
}

/// Rotating file logger settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Write log files at all.
    pub enabled: bool,
    /// Directory holding the log files.
    pub dir: PathBuf,
    /// Number of log files kept; older ones are deleted at start-up.
    pub max_files: usize,
    /// Also print every line to stderr.
    pub echo_stderr: bool,
    /// Maximum level written (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("logs"),
            max_files: 10,
            echo_stderr: true,
            level: "info".into(),
        }
    }
}

/// Hardware back-end selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Fall back to the simulated back end when no GPIO controller is found.
    pub allow_simulation: bool,
    /// CPU temperature reported by the simulated back end (Celsius).
    pub sim_temperature_c: f32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            allow_simulation: true,
            sim_temperature_c: 45.0,
        }
    }
}

/// Wi-Fi station settings. An empty SSID means "do not connect".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
    /// How long a single association attempt may take (seconds).
    pub connect_timeout_secs: u32,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            connect_timeout_secs: 10,
        }
    }
}

/// Embedded web server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Largest request body accepted; bigger ones get 413.
    pub max_body_bytes: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            max_body_bytes: 64 * 1024,
        }
    }
}
