//! Mock adapters for integration tests.
//!
//! Records every call so tests can assert on the full history without
//! touching real GPIO, PWM or ADC registers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rpi_app_framework::adapters::hardware::pico::PicoBoard;
use rpi_app_framework::app::events::AppEvent;
use rpi_app_framework::app::ports::{EventSink, PinId, Pull};
use rpi_app_framework::error::{GpioError, Result, SensorError};

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Pico board mock ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BoardCall {
    Output(PinId),
    Input(PinId, Pull),
    Level(PinId, bool),
    Pwm(PinId, u32),
    Duty(PinId, u16),
}

#[derive(Default)]
pub struct BoardLog {
    pub calls: Vec<BoardCall>,
    pub levels: HashMap<PinId, bool>,
    pub adc: Option<u16>,
}

/// Pico board that records calls into a shared log.
#[derive(Clone, Default)]
pub struct MockPicoBoard {
    pub log: Arc<Mutex<BoardLog>>,
}

#[allow(dead_code)]
impl MockPicoBoard {
    pub fn with_adc(raw: u16) -> Self {
        let board = Self::default();
        board.log.lock().unwrap().adc = Some(raw);
        board
    }

    pub fn calls(&self) -> Vec<BoardCall> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn last_duty(&self, pin: PinId) -> Option<u16> {
        self.calls().iter().rev().find_map(|c| match c {
            BoardCall::Duty(p, d) if *p == pin => Some(*d),
            _ => None,
        })
    }
}

impl PicoBoard for MockPicoBoard {
    fn configure_output(&mut self, pin: PinId) -> Result<()> {
        self.log.lock().unwrap().calls.push(BoardCall::Output(pin));
        Ok(())
    }

    fn configure_input(&mut self, pin: PinId, pull: Pull) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.calls.push(BoardCall::Input(pin, pull));
        log.levels.insert(pin, pull == Pull::Up);
        Ok(())
    }

    fn set_level(&mut self, pin: PinId, high: bool) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.calls.push(BoardCall::Level(pin, high));
        log.levels.insert(pin, high);
        Ok(())
    }

    fn level(&mut self, pin: PinId) -> Result<bool> {
        self.log
            .lock()
            .unwrap()
            .levels
            .get(&pin)
            .copied()
            .ok_or_else(|| GpioError::ReadFailed.into())
    }

    fn configure_pwm(&mut self, pin: PinId, freq_hz: u32) -> Result<()> {
        self.log.lock().unwrap().calls.push(BoardCall::Pwm(pin, freq_hz));
        Ok(())
    }

    fn set_duty_u16(&mut self, pin: PinId, duty: u16) -> Result<()> {
        self.log.lock().unwrap().calls.push(BoardCall::Duty(pin, duty));
        Ok(())
    }

    fn read_adc_u16(&mut self, _channel: u8) -> Result<u16> {
        self.log
            .lock()
            .unwrap()
            .adc
            .ok_or_else(|| SensorError::AdcReadFailed.into())
    }
}
