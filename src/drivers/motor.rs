//! Dual DC motor driver (TB6612FNG H-bridge).
//!
//! Each channel has two direction inputs (IN1/IN2) and a PWM speed
//! input; one STBY line enables the whole chip.
//!
//! | IN1 | IN2 | PWM  | Result        |
//! |-----|-----|------|---------------|
//! | H   | L   | duty | Forward       |
//! | L   | H   | duty | Reverse       |
//! | H   | H   | 0    | Short brake   |
//! | L   | L   | 0    | Coast (stop)  |
//!
//! The driver is a dumb actuator: no ramping, no current sensing.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::{info, warn};

use crate::adapters::hardware::{DigitalOut, PiHardwareAdapter, PwmOut};
use crate::device::Device;
use crate::error::{GpioError, Result};
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Coasting,
    Braking,
    /// `speed` is `1..=100` percent.
    Running { speed: u8, dir: Direction },
}

/// Pins of one H-bridge channel.
pub struct MotorChannel<O, P> {
    pub in1: O,
    pub in2: O,
    pub pwm: P,
}

struct ChannelDriver<O, P> {
    pins: MotorChannel<O, P>,
    state: MotorState,
}

pub struct Tb6612fng<O: OutputPin, P: SetDutyCycle> {
    a: ChannelDriver<O, P>,
    b: ChannelDriver<O, P>,
    stby: O,
    awake: bool,
}

fn write_failed(what: &str, e: impl core::fmt::Debug) -> crate::error::Error {
    warn!("Motor: {} failed: {:?}", what, e);
    GpioError::WriteFailed.into()
}

fn pwm_failed(e: impl core::fmt::Debug) -> crate::error::Error {
    warn!("Motor: PWM update failed: {:?}", e);
    GpioError::PwmFailed.into()
}

impl<O: OutputPin, P: SetDutyCycle> Tb6612fng<O, P> {
    /// Take the pins, coast both channels and bring the chip out of standby.
    pub fn new(a: MotorChannel<O, P>, b: MotorChannel<O, P>, stby: O) -> Result<Self> {
        let mut motor = Self {
            a: ChannelDriver {
                pins: a,
                state: MotorState::Coasting,
            },
            b: ChannelDriver {
                pins: b,
                state: MotorState::Coasting,
            },
            stby,
            awake: false,
        };
        motor.coast(Channel::A)?;
        motor.coast(Channel::B)?;
        motor.wake()?;
        info!("Motor: TB6612FNG ready");
        Ok(motor)
    }

    fn channel(&mut self, ch: Channel) -> &mut ChannelDriver<O, P> {
        match ch {
            Channel::A => &mut self.a,
            Channel::B => &mut self.b,
        }
    }

    fn set_inputs(&mut self, ch: Channel, in1: bool, in2: bool) -> Result<()> {
        let pins = &mut self.channel(ch).pins;
        pins.in1
            .set_state(in1.into())
            .map_err(|e| write_failed("IN1", e))?;
        pins.in2
            .set_state(in2.into())
            .map_err(|e| write_failed("IN2", e))
    }

    fn set_speed(&mut self, ch: Channel, percent: u8) -> Result<()> {
        self.channel(ch)
            .pins
            .pwm
            .set_duty_cycle_percent(percent)
            .map_err(pwm_failed)
    }

    /// Run a channel. `speed` is `-100..=100`; the sign picks the
    /// direction, out-of-range values are clamped, `0` coasts.
    pub fn drive(&mut self, ch: Channel, speed: i16) -> Result<()> {
        let speed = speed.clamp(-100, 100);
        if speed == 0 {
            return self.coast(ch);
        }

        let dir = if speed > 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        };
        let percent = speed.unsigned_abs() as u8;

        match dir {
            Direction::Forward => self.set_inputs(ch, true, false)?,
            Direction::Reverse => self.set_inputs(ch, false, true)?,
        }
        self.set_speed(ch, percent)?;
        self.channel(ch).state = MotorState::Running {
            speed: percent,
            dir,
        };
        Ok(())
    }

    /// Short brake: both inputs high, duty 0.
    pub fn brake(&mut self, ch: Channel) -> Result<()> {
        self.set_speed(ch, 0)?;
        self.set_inputs(ch, true, true)?;
        self.channel(ch).state = MotorState::Braking;
        Ok(())
    }

    /// Free-wheel: both inputs low, duty 0.
    pub fn coast(&mut self, ch: Channel) -> Result<()> {
        self.set_speed(ch, 0)?;
        self.set_inputs(ch, false, false)?;
        self.channel(ch).state = MotorState::Coasting;
        Ok(())
    }

    pub fn stop_all(&mut self) -> Result<()> {
        self.coast(Channel::A)?;
        self.coast(Channel::B)
    }

    /// Pull STBY low. Outputs go high-impedance until [`wake`](Self::wake).
    pub fn standby(&mut self) -> Result<()> {
        self.stby.set_low().map_err(|e| write_failed("STBY", e))?;
        self.awake = false;
        Ok(())
    }

    pub fn wake(&mut self) -> Result<()> {
        self.stby.set_high().map_err(|e| write_failed("STBY", e))?;
        self.awake = true;
        Ok(())
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    pub fn state(&self, ch: Channel) -> MotorState {
        match ch {
            Channel::A => self.a.state,
            Channel::B => self.b.state,
        }
    }
}

impl Tb6612fng<DigitalOut, PwmOut> {
    /// Claim the default motor pins from `hw`.
    pub fn with_default_pins(hw: &PiHardwareAdapter) -> Result<Self> {
        let channel = |in1: u8, in2: u8, pwm: u8| -> Result<MotorChannel<DigitalOut, PwmOut>> {
            Ok(MotorChannel {
                in1: hw.digital_out(in1, Some(false))?,
                in2: hw.digital_out(in2, Some(false))?,
                pwm: hw.pwm(pwm, pins::MOTOR_PWM_FREQ_HZ, 0.0)?,
            })
        };
        Self::new(
            channel(pins::MOTOR_AIN1_GPIO, pins::MOTOR_AIN2_GPIO, pins::MOTOR_PWMA_GPIO)?,
            channel(pins::MOTOR_BIN1_GPIO, pins::MOTOR_BIN2_GPIO, pins::MOTOR_PWMB_GPIO)?,
            hw.digital_out(pins::MOTOR_STBY_GPIO, Some(false))?,
        )
    }
}

impl<O: OutputPin, P: SetDutyCycle> Device for Tb6612fng<O, P> {
    fn name(&self) -> &str {
        "TB6612FNG"
    }

    fn release(&mut self) -> Result<()> {
        self.stop_all()?;
        self.standby()
    }
}
