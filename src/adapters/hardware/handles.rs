//! Pin handles handed out by [`PiHardwareAdapter`](super::PiHardwareAdapter).
//!
//! Each handle remembers its pin and shares the adapter's back end. They
//! implement the `embedded-hal` 1.0 traits, so drivers written against
//! `OutputPin`, `InputPin` or `SetDutyCycle` run unchanged on every
//! platform the adapter supports.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::{self, InputPin, OutputPin, StatefulOutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

use crate::app::ports::{HardwareBackend, PinId};
use crate::error::{Error, Result};

/// The active back end, shared between the adapter and its handles.
pub type SharedBackend = Arc<Mutex<Box<dyn HardwareBackend>>>;

pub(crate) fn lock(backend: &SharedBackend) -> MutexGuard<'_, Box<dyn HardwareBackend>> {
    backend.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Digital output ────────────────────────────────────────────

pub struct DigitalOut {
    pin: PinId,
    backend: SharedBackend,
}

impl DigitalOut {
    pub(crate) fn new(pin: PinId, backend: SharedBackend) -> Self {
        Self { pin, backend }
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }

    pub fn set(&mut self, high: bool) -> Result<()> {
        lock(&self.backend).write(self.pin, high)
    }

    /// Last level written.
    pub fn level(&self) -> Result<bool> {
        lock(&self.backend).output_level(self.pin)
    }
}

impl digital::ErrorType for DigitalOut {
    type Error = Error;
}

impl OutputPin for DigitalOut {
    fn set_low(&mut self) -> Result<()> {
        self.set(false)
    }

    fn set_high(&mut self) -> Result<()> {
        self.set(true)
    }
}

impl StatefulOutputPin for DigitalOut {
    fn is_set_high(&mut self) -> Result<bool> {
        self.level()
    }

    fn is_set_low(&mut self) -> Result<bool> {
        self.level().map(|high| !high)
    }
}

// ── Digital input ─────────────────────────────────────────────

pub struct DigitalIn {
    pin: PinId,
    backend: SharedBackend,
}

impl DigitalIn {
    pub(crate) fn new(pin: PinId, backend: SharedBackend) -> Self {
        Self { pin, backend }
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }

    pub fn read(&mut self) -> Result<bool> {
        lock(&self.backend).read(self.pin)
    }
}

impl digital::ErrorType for DigitalIn {
    type Error = Error;
}

impl InputPin for DigitalIn {
    fn is_high(&mut self) -> Result<bool> {
        self.read()
    }

    fn is_low(&mut self) -> Result<bool> {
        self.read().map(|high| !high)
    }
}

// ── PWM output ────────────────────────────────────────────────

/// PWM channel. Duty is tracked as a percentage; `SetDutyCycle` maps the
/// full `u16` range onto `0..=100 %`.
pub struct PwmOut {
    pin: PinId,
    freq_hz: u32,
    duty_percent: f32,
    backend: SharedBackend,
}

impl PwmOut {
    pub(crate) fn new(pin: PinId, freq_hz: u32, duty_percent: f32, backend: SharedBackend) -> Self {
        Self {
            pin,
            freq_hz,
            duty_percent: duty_percent.clamp(0.0, 100.0),
            backend,
        }
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }

    pub fn frequency(&self) -> u32 {
        self.freq_hz
    }

    pub fn duty(&self) -> f32 {
        self.duty_percent
    }

    /// Set the duty cycle in percent, clamped to `0.0..=100.0`.
    pub fn set_duty(&mut self, duty_percent: f32) -> Result<()> {
        let duty = duty_percent.clamp(0.0, 100.0);
        lock(&self.backend).set_pwm_duty(self.pin, duty)?;
        self.duty_percent = duty;
        Ok(())
    }

    pub fn set_frequency(&mut self, freq_hz: u32) -> Result<()> {
        lock(&self.backend).set_pwm_frequency(self.pin, freq_hz)?;
        self.freq_hz = freq_hz;
        Ok(())
    }
}

impl pwm::ErrorType for PwmOut {
    type Error = Error;
}

impl SetDutyCycle for PwmOut {
    fn max_duty_cycle(&self) -> u16 {
        u16::MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<()> {
        self.set_duty(f32::from(duty) / f32::from(u16::MAX) * 100.0)
    }
}
