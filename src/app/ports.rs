//! Port traits: the boundary between the framework core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService / PiHardwareAdapter
//! ```
//!
//! Driven adapters (GPIO back ends, Wi-Fi radios, event sinks, config
//! storage) implement these traits. The core consumes them through
//! generics or trait objects, so nothing above this layer touches a
//! vendor library directly.

use core::fmt;
use core::str::FromStr;
use std::net::Ipv4Addr;

use crate::config::AppConfig;
use crate::error::{Error, Result};

// ───────────────────────────────────────────────────────────────
// Pin vocabulary shared by every hardware back end
// ───────────────────────────────────────────────────────────────

/// A pin as the application names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinId {
    /// Numbered GPIO (BCM numbering on Linux boards, GPn on the Pico).
    Gpio(u8),
    /// The board's built-in LED (`"LED"` on the Pico 2 W).
    OnboardLed,
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(n) => write!(f, "GPIO{n}"),
            Self::OnboardLed => write!(f, "LED"),
        }
    }
}

impl From<u8> for PinId {
    fn from(n: u8) -> Self {
        Self::Gpio(n)
    }
}

impl FromStr for PinId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("led") {
            return Ok(Self::OnboardLed);
        }
        let digits = s
            .strip_prefix("GPIO")
            .or_else(|| s.strip_prefix("gpio"))
            .unwrap_or(s);
        digits
            .parse::<u8>()
            .map(Self::Gpio)
            .map_err(|_| Error::Config("pin must be a GPIO number or \"LED\""))
    }
}

/// Direction a pin is configured for by [`setup_pin`](crate::adapters::hardware::PiHardwareAdapter::setup_pin).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

/// Input bias resistor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pull {
    Up,
    Down,
    #[default]
    None,
}

/// Which of the hardware environments is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Full-size Raspberry Pi running Linux.
    LinuxBoard,
    /// Pico-class microcontroller board.
    Microcontroller,
    /// In-memory stand-in for hosts without GPIO.
    Simulated,
}

// ───────────────────────────────────────────────────────────────
// Hardware back end (driven adapter: domain → GPIO / PWM / sensors)
// ───────────────────────────────────────────────────────────────

/// One hardware environment. Exactly one back end is active per adapter.
///
/// Duty cycles are percentages (`0.0..=100.0`); each back end converts to
/// its native resolution.
pub trait HardwareBackend: Send {
    fn platform(&self) -> Platform;

    /// Human-readable board model.
    fn model(&self) -> String;

    /// Current CPU / core temperature in Celsius.
    fn cpu_temperature(&mut self) -> Result<f32>;

    fn setup_output(&mut self, pin: PinId, initial: Option<bool>) -> Result<()>;
    fn setup_input(&mut self, pin: PinId, pull: Pull) -> Result<()>;

    /// Drive an output pin.
    fn write(&mut self, pin: PinId, high: bool) -> Result<()>;

    /// Sample an input pin.
    fn read(&mut self, pin: PinId) -> Result<bool>;

    /// Last level written to an output pin.
    fn output_level(&self, pin: PinId) -> Result<bool>;

    fn setup_pwm(&mut self, pin: PinId, freq_hz: u32, duty_percent: f32) -> Result<()>;
    fn set_pwm_duty(&mut self, pin: PinId, duty_percent: f32) -> Result<()>;
    fn set_pwm_frequency(&mut self, pin: PinId, freq_hz: u32) -> Result<()>;

    /// Release every claimed pin.
    fn cleanup(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Wi-Fi radio (driven adapter: domain ↔ network stack)
// ───────────────────────────────────────────────────────────────

/// The station-mode radio a [`WifiManager`](crate::adapters::wifi::WifiManager)
/// drives. `associate` only starts the attempt; completion is observed
/// through `is_associated`.
pub trait WifiRadio {
    fn associate(&mut self, ssid: &str, password: &str) -> Result<()>;
    fn disassociate(&mut self, ssid: &str);
    fn is_associated(&mut self, ssid: &str) -> bool;
    fn ip_address(&mut self) -> Option<Ipv4Addr>;
    fn rssi(&mut self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The lifecycle emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists application configuration.
///
/// Implementations validate before persisting; invalid values are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    /// Load configuration. Returns [`AppConfig::default()`] if nothing is stored.
    fn load(&self) -> core::result::Result<AppConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &AppConfig) -> core::result::Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
