//! Simulated back end for hosts without a GPIO controller.
//!
//! Tracks pin modes, levels and PWM settings in memory. A [`SimProbe`]
//! shares that state so tests can inject input levels and inspect
//! outputs after the back end has been boxed into an adapter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use crate::app::ports::{HardwareBackend, PinId, Platform, Pull};
use crate::error::{GpioError, Result};

/// Mode and level of one simulated pin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimPin {
    Output { high: bool },
    Input { pull: Pull, high: bool },
    Pwm { freq_hz: u32, duty_percent: f32 },
}

#[derive(Debug, Default)]
struct SimState {
    pins: HashMap<PinId, SimPin>,
    temperature_c: f32,
    cleanups: u32,
}

/// In-memory hardware back end.
pub struct SimBackend {
    state: Arc<Mutex<SimState>>,
}

impl SimBackend {
    pub fn new(temperature_c: f32) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                temperature_c,
                ..SimState::default()
            })),
        }
    }

    /// A handle on the shared state for injection and inspection.
    pub fn probe(&self) -> SimProbe {
        SimProbe {
            state: Arc::clone(&self.state),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SimState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl HardwareBackend for SimBackend {
    fn platform(&self) -> Platform {
        Platform::Simulated
    }

    fn model(&self) -> String {
        "Raspberry Pi (simulated)".into()
    }

    fn cpu_temperature(&mut self) -> Result<f32> {
        Ok(self.with_state(|s| s.temperature_c))
    }

    fn setup_output(&mut self, pin: PinId, initial: Option<bool>) -> Result<()> {
        self.with_state(|s| {
            s.pins.insert(
                pin,
                SimPin::Output {
                    high: initial.unwrap_or(false),
                },
            );
        });
        debug!("Sim: {} -> output", pin);
        Ok(())
    }

    fn setup_input(&mut self, pin: PinId, pull: Pull) -> Result<()> {
        // Floating inputs read low; a pull-up reads high until driven.
        let high = matches!(pull, Pull::Up);
        self.with_state(|s| {
            s.pins.insert(pin, SimPin::Input { pull, high });
        });
        debug!("Sim: {} -> input ({:?})", pin, pull);
        Ok(())
    }

    fn write(&mut self, pin: PinId, high: bool) -> Result<()> {
        self.with_state(|s| match s.pins.get_mut(&pin) {
            Some(SimPin::Output { high: level }) => {
                *level = high;
                Ok(())
            }
            Some(_) => Err(wrong_mode(pin)),
            None => Err(released(pin)),
        })
    }

    fn read(&mut self, pin: PinId) -> Result<bool> {
        self.with_state(|s| match s.pins.get(&pin) {
            Some(SimPin::Input { high, .. } | SimPin::Output { high }) => Ok(*high),
            Some(SimPin::Pwm { .. }) => Err(wrong_mode(pin)),
            None => Err(released(pin)),
        })
    }

    fn output_level(&self, pin: PinId) -> Result<bool> {
        self.with_state(|s| match s.pins.get(&pin) {
            Some(SimPin::Output { high }) => Ok(*high),
            Some(_) => Err(wrong_mode(pin)),
            None => Err(released(pin)),
        })
    }

    fn setup_pwm(&mut self, pin: PinId, freq_hz: u32, duty_percent: f32) -> Result<()> {
        self.with_state(|s| {
            s.pins.insert(
                pin,
                SimPin::Pwm {
                    freq_hz,
                    duty_percent: duty_percent.clamp(0.0, 100.0),
                },
            );
        });
        debug!("Sim: {} -> PWM {} Hz", pin, freq_hz);
        Ok(())
    }

    fn set_pwm_duty(&mut self, pin: PinId, duty_percent: f32) -> Result<()> {
        self.with_state(|s| match s.pins.get_mut(&pin) {
            Some(SimPin::Pwm { duty_percent: d, .. }) => {
                *d = duty_percent.clamp(0.0, 100.0);
                Ok(())
            }
            Some(_) => Err(wrong_mode(pin)),
            None => Err(released(pin)),
        })
    }

    fn set_pwm_frequency(&mut self, pin: PinId, freq_hz: u32) -> Result<()> {
        self.with_state(|s| match s.pins.get_mut(&pin) {
            Some(SimPin::Pwm { freq_hz: f, .. }) => {
                *f = freq_hz;
                Ok(())
            }
            Some(_) => Err(wrong_mode(pin)),
            None => Err(released(pin)),
        })
    }

    fn cleanup(&mut self) {
        self.with_state(|s| {
            s.pins.clear();
            s.cleanups += 1;
        });
    }
}

/// Shared view of a [`SimBackend`]'s state.
#[derive(Clone)]
pub struct SimProbe {
    state: Arc<Mutex<SimState>>,
}

impl SimProbe {
    fn with_state<T>(&self, f: impl FnOnce(&mut SimState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Current mode/level of a pin, `None` if unclaimed.
    pub fn pin(&self, pin: impl Into<PinId>) -> Option<SimPin> {
        let pin = pin.into();
        self.with_state(|s| s.pins.get(&pin).copied())
    }

    /// Drive a simulated input from the outside world.
    pub fn set_input(&self, pin: impl Into<PinId>, level: bool) {
        let pin = pin.into();
        self.with_state(|s| {
            if let Some(SimPin::Input { high, .. }) = s.pins.get_mut(&pin) {
                *high = level;
            }
        });
    }

    pub fn set_temperature(&self, celsius: f32) {
        self.with_state(|s| s.temperature_c = celsius);
    }

    /// Number of claimed pins.
    pub fn claimed(&self) -> usize {
        self.with_state(|s| s.pins.len())
    }

    pub fn cleanups(&self) -> u32 {
        self.with_state(|s| s.cleanups)
    }
}

fn wrong_mode(pin: PinId) -> crate::error::Error {
    GpioError::wrong_mode(pin).into()
}

fn released(pin: PinId) -> crate::error::Error {
    GpioError::released(pin).into()
}
