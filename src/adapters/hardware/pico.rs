//! Microcontroller back end (Raspberry Pi Pico 2 W).
//!
//! Board support code implements [`PicoBoard`] with raw register-level
//! operations (16-bit PWM duty, 16-bit ADC samples); [`PicoBackend`]
//! turns those into the framework's uniform interface.
//!
//! ## Conversions
//!
//! | Quantity     | Board unit        | Framework unit        |
//! |--------------|-------------------|-----------------------|
//! | PWM duty     | `0..=65535`       | percent `0.0..=100.0` |
//! | Temperature  | ADC4 `0..=65535`  | Celsius, 2 decimals   |

use std::collections::HashMap;

use log::{info, warn};

use crate::app::ports::{HardwareBackend, PinId, Platform, Pull};
use crate::error::{GpioError, Result, SensorError};
use crate::pins;

/// ADC reference voltage.
const V_REF: f32 = 3.3;
/// Full-scale 16-bit ADC reading.
const ADC_MAX: f32 = 65_535.0;
/// Sensor voltage at 27 °C.
const V_27C: f32 = 0.706;
/// Sensor slope (V per °C).
const SLOPE_V_PER_C: f32 = 0.001_721;

/// Raw board operations a Pico port provides.
pub trait PicoBoard: Send {
    fn configure_output(&mut self, pin: PinId) -> Result<()>;
    fn configure_input(&mut self, pin: PinId, pull: Pull) -> Result<()>;
    fn set_level(&mut self, pin: PinId, high: bool) -> Result<()>;
    fn level(&mut self, pin: PinId) -> Result<bool>;
    fn configure_pwm(&mut self, pin: PinId, freq_hz: u32) -> Result<()>;
    fn set_duty_u16(&mut self, pin: PinId, duty: u16) -> Result<()>;
    fn read_adc_u16(&mut self, channel: u8) -> Result<u16>;
}

/// Percent duty → 16-bit compare value (`duty * 655.35`, truncated).
pub fn duty_percent_to_u16(duty_percent: f32) -> u16 {
    // f64: in f32, 100 * 655.35 lands just below 65535.
    (f64::from(duty_percent.clamp(0.0, 100.0)) * 655.35) as u16
}

/// On-die temperature sensor reading → Celsius, rounded to 2 decimals.
pub fn adc_to_celsius(raw: u16) -> f32 {
    let voltage = f32::from(raw) * V_REF / ADC_MAX;
    let celsius = 27.0 - (voltage - V_27C) / SLOPE_V_PER_C;
    (celsius * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Claimed {
    Output { high: bool },
    Input,
    Pwm,
}

/// Back end for Pico-class boards.
pub struct PicoBackend<B: PicoBoard> {
    board: B,
    claimed: HashMap<PinId, Claimed>,
}

impl<B: PicoBoard> PicoBackend<B> {
    pub fn new(board: B) -> Self {
        info!("Pico: back end ready");
        Self {
            board,
            claimed: HashMap::new(),
        }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    fn expect(&self, pin: PinId, want: fn(&Claimed) -> bool) -> Result<()> {
        match self.claimed.get(&pin) {
            Some(c) if want(c) => Ok(()),
            Some(_) => Err(GpioError::wrong_mode(pin).into()),
            None => Err(GpioError::released(pin).into()),
        }
    }
}

impl<B: PicoBoard> HardwareBackend for PicoBackend<B> {
    fn platform(&self) -> Platform {
        Platform::Microcontroller
    }

    fn model(&self) -> String {
        "Raspberry Pi Pico 2 W".into()
    }

    fn cpu_temperature(&mut self) -> Result<f32> {
        match self.board.read_adc_u16(pins::PICO_TEMP_ADC_CHANNEL) {
            Ok(raw) => Ok(adc_to_celsius(raw)),
            Err(e) => {
                warn!("Pico: temperature sensor error: {}", e);
                Err(SensorError::AdcReadFailed.into())
            }
        }
    }

    fn setup_output(&mut self, pin: PinId, initial: Option<bool>) -> Result<()> {
        self.board.configure_output(pin)?;
        let high = initial.unwrap_or(false);
        if initial.is_some() {
            self.board.set_level(pin, high)?;
        }
        self.claimed.insert(pin, Claimed::Output { high });
        Ok(())
    }

    fn setup_input(&mut self, pin: PinId, pull: Pull) -> Result<()> {
        self.board.configure_input(pin, pull)?;
        self.claimed.insert(pin, Claimed::Input);
        Ok(())
    }

    fn write(&mut self, pin: PinId, high: bool) -> Result<()> {
        self.expect(pin, |c| matches!(c, Claimed::Output { .. }))?;
        self.board.set_level(pin, high)?;
        self.claimed.insert(pin, Claimed::Output { high });
        Ok(())
    }

    fn read(&mut self, pin: PinId) -> Result<bool> {
        self.expect(pin, |c| !matches!(c, Claimed::Pwm))?;
        self.board.level(pin)
    }

    fn output_level(&self, pin: PinId) -> Result<bool> {
        self.expect(pin, |c| matches!(c, Claimed::Output { .. }))?;
        match self.claimed.get(&pin) {
            Some(Claimed::Output { high }) => Ok(*high),
            _ => Err(GpioError::ReadFailed.into()),
        }
    }

    fn setup_pwm(&mut self, pin: PinId, freq_hz: u32, duty_percent: f32) -> Result<()> {
        self.board.configure_pwm(pin, freq_hz)?;
        self.board.set_duty_u16(pin, duty_percent_to_u16(duty_percent))?;
        self.claimed.insert(pin, Claimed::Pwm);
        Ok(())
    }

    fn set_pwm_duty(&mut self, pin: PinId, duty_percent: f32) -> Result<()> {
        self.expect(pin, |c| matches!(c, Claimed::Pwm))?;
        self.board.set_duty_u16(pin, duty_percent_to_u16(duty_percent))
    }

    fn set_pwm_frequency(&mut self, pin: PinId, freq_hz: u32) -> Result<()> {
        self.expect(pin, |c| matches!(c, Claimed::Pwm))?;
        self.board.configure_pwm(pin, freq_hz)
    }

    fn cleanup(&mut self) {
        // Pins on the microcontroller stay configured; nothing to release.
    }
}
