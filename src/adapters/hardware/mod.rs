//! Hardware adapter: one uniform GPIO/PWM/temperature interface over
//! whichever hardware environment is active.
//!
//! ```text
//!   PiHardwareAdapter ──▶ dyn HardwareBackend
//!                           ├─ LinuxBackend  (rppal, `rpi` feature)
//!                           ├─ PicoBackend   (board support via PicoBoard)
//!                           └─ SimBackend    (host / tests)
//! ```
//!
//! Exactly one back end is active per adapter. Pin handles share it, so
//! [`cleanup`](PiHardwareAdapter::cleanup) invalidates every handle at
//! once; later calls on them fail with `GpioError::Released`.

pub mod handles;
pub mod linux;
pub mod pico;
pub mod sim;

use std::sync::{Arc, Mutex};

use log::info;
#[cfg(all(target_os = "linux", feature = "rpi"))]
use log::warn;

use crate::app::ports::{HardwareBackend, PinId, PinMode, Platform, Pull};
use crate::config::HardwareConfig;
use crate::device::Device;
use crate::drivers::led::Led;
use crate::error::{Error, Result};
use crate::pins;

pub use handles::{DigitalIn, DigitalOut, PwmOut, SharedBackend};

use handles::lock;

pub struct PiHardwareAdapter {
    backend: SharedBackend,
    platform: Platform,
}

impl PiHardwareAdapter {
    /// Pick the back end for the current environment.
    ///
    /// A usable Linux GPIO controller wins; otherwise the simulated back
    /// end is used when `allow_simulation` is set.
    pub fn detect(cfg: &HardwareConfig) -> Result<Self> {
        #[cfg(all(target_os = "linux", feature = "rpi"))]
        match linux::LinuxBackend::new() {
            Ok(backend) => return Ok(Self::with_backend(backend)),
            Err(e) => warn!("Hardware: Linux GPIO unusable: {}", e),
        }

        if cfg.allow_simulation {
            return Ok(Self::with_backend(sim::SimBackend::new(cfg.sim_temperature_c)));
        }
        Err(Error::Init("GPIO library not available"))
    }

    pub fn with_backend(backend: impl HardwareBackend + 'static) -> Self {
        let platform = backend.platform();
        info!("Hardware: {} ({:?})", backend.model(), platform);
        Self {
            backend: Arc::new(Mutex::new(Box::new(backend))),
            platform,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_simulated(&self) -> bool {
        self.platform == Platform::Simulated
    }

    pub fn model(&self) -> String {
        lock(&self.backend).model()
    }

    /// CPU temperature in Celsius.
    pub fn cpu_temperature(&self) -> Result<f32> {
        lock(&self.backend).cpu_temperature()
    }

    pub fn cpu_temp(&self) -> Result<f32> {
        self.cpu_temperature()
    }

    pub fn setup_pin(&self, pin: impl Into<PinId>, mode: PinMode) -> Result<()> {
        let pin = pin.into();
        let mut backend = lock(&self.backend);
        match mode {
            PinMode::Output => backend.setup_output(pin, None),
            PinMode::Input => backend.setup_input(pin, Pull::None),
        }
    }

    pub fn digital_out(&self, pin: impl Into<PinId>, initial: Option<bool>) -> Result<DigitalOut> {
        let pin = pin.into();
        lock(&self.backend).setup_output(pin, initial)?;
        Ok(DigitalOut::new(pin, Arc::clone(&self.backend)))
    }

    pub fn digital_in(&self, pin: impl Into<PinId>, pull: Pull) -> Result<DigitalIn> {
        let pin = pin.into();
        lock(&self.backend).setup_input(pin, pull)?;
        Ok(DigitalIn::new(pin, Arc::clone(&self.backend)))
    }

    /// PWM output at `freq_hz` with `duty_percent` (`0.0..=100.0`).
    pub fn pwm(&self, pin: impl Into<PinId>, freq_hz: u32, duty_percent: f32) -> Result<PwmOut> {
        let pin = pin.into();
        let duty = duty_percent.clamp(0.0, 100.0);
        lock(&self.backend).setup_pwm(pin, freq_hz, duty)?;
        Ok(PwmOut::new(pin, freq_hz, duty, Arc::clone(&self.backend)))
    }

    /// PWM output at the default frequency, duty 0.
    pub fn pwm_default(&self, pin: impl Into<PinId>) -> Result<PwmOut> {
        self.pwm(pin, pins::DEFAULT_PWM_FREQ_HZ, 0.0)
    }

    pub fn led(&self, pin: impl Into<PinId>) -> Result<Led<DigitalOut>> {
        let out = self.digital_out(pin, Some(false))?;
        Ok(Led::new(out.pin().to_string(), out))
    }

    /// The board's status LED: the onboard LED on a microcontroller,
    /// the status GPIO elsewhere.
    pub fn default_led_pin(&self) -> PinId {
        match self.platform {
            Platform::Microcontroller => PinId::OnboardLed,
            Platform::LinuxBoard | Platform::Simulated => PinId::Gpio(pins::STATUS_LED_GPIO),
        }
    }

    /// Release every claimed pin. Existing handles stop working.
    pub fn cleanup(&self) {
        lock(&self.backend).cleanup();
        info!("GPIO cleaned up");
    }
}

impl Device for PiHardwareAdapter {
    fn name(&self) -> &str {
        "hardware"
    }

    fn release(&mut self) -> Result<()> {
        self.cleanup();
        Ok(())
    }
}
