//! Unified error types for the framework.
//!
//! A single `Error` enum that every subsystem converts into, so an
//! application's `setup`/`run` hooks can propagate hardware, sensor and
//! network failures with `?` and the lifecycle reports them uniformly.
//! The sub-enums are `Copy`; the context that does not fit in them is
//! logged at the failure site.

use core::fmt;

use crate::app::ports::PinId;

// ---------------------------------------------------------------------------
// Top-level framework error
// ---------------------------------------------------------------------------

/// Every fallible operation in the framework funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A GPIO or PWM operation failed.
    Gpio(GpioError),
    /// A sensor could not be read or returned unusable data.
    Sensor(SensorError),
    /// A communication subsystem (Wi-Fi, web server) failed.
    Comms(CommsError),
    /// Hardware or subsystem initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// Log directory or file could not be prepared.
    Log(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Log(msg) => write!(f, "log: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// GPIO errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// The pin does not exist on this board or is already claimed.
    PinUnavailable(u8),
    /// The pin identifier has no meaning on the active platform.
    UnsupportedPin,
    /// The pin was configured for a different mode.
    WrongMode(u8),
    /// The pin was released by `cleanup()`.
    Released(u8),
    /// The onboard LED was configured for a different mode.
    LedWrongMode,
    /// The onboard LED is not configured or was released.
    LedReleased,
    /// Writing a level failed.
    WriteFailed,
    /// Reading a level failed.
    ReadFailed,
    /// PWM frequency or duty could not be applied.
    PwmFailed,
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinUnavailable(pin) => write!(f, "GPIO{pin} unavailable"),
            Self::UnsupportedPin => write!(f, "pin not supported on this platform"),
            Self::WrongMode(pin) => write!(f, "GPIO{pin} configured for another mode"),
            Self::Released(pin) => write!(f, "GPIO{pin} already released"),
            Self::LedWrongMode => write!(f, "onboard LED configured for another mode"),
            Self::LedReleased => write!(f, "onboard LED not configured"),
            Self::WriteFailed => write!(f, "GPIO write failed"),
            Self::ReadFailed => write!(f, "GPIO read failed"),
            Self::PwmFailed => write!(f, "PWM update failed"),
        }
    }
}

impl GpioError {
    pub fn wrong_mode(pin: PinId) -> Self {
        match pin {
            PinId::Gpio(n) => Self::WrongMode(n),
            PinId::OnboardLed => Self::LedWrongMode,
        }
    }

    pub fn released(pin: PinId) -> Self {
        match pin {
            PinId::Gpio(n) => Self::Released(n),
            PinId::OnboardLed => Self::LedReleased,
        }
    }
}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error.
    AdcReadFailed,
    /// Neither `vcgencmd` nor the thermal zone produced a reading.
    TemperatureUnavailable,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::TemperatureUnavailable => write!(f, "CPU temperature unavailable"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    WifiConnectFailed,
    WifiTimeout,
    WebBindFailed,
    WebAlreadyRunning,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::WifiTimeout => write!(f, "WiFi connect timed out"),
            Self::WebBindFailed => write!(f, "web server bind failed"),
            Self::WebAlreadyRunning => write!(f, "web server already running"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// embedded-hal interop
// ---------------------------------------------------------------------------

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl embedded_hal::pwm::Error for Error {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Framework-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
