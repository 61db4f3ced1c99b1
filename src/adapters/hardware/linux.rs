//! Linux single-board-computer back end.
//!
//! - Board model and CPU temperature come from the kernel (`/proc`,
//!   `/sys`) and `vcgencmd`; those helpers are plain std and compile on
//!   every target so they can be tested on the host.
//! - GPIO and software PWM go through `rppal`, compiled only for
//!   `target_os = "linux"` with the `rpi` feature.

use std::fs;
use std::path::Path;
use std::process::Command;

use log::debug;

use crate::error::{Result, SensorError};

pub const DEVICE_TREE_MODEL: &str = "/proc/device-tree/model";
pub const THERMAL_ZONE_TEMP: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Board model from the device tree. NUL padding is stripped.
pub fn read_model(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(raw) => {
            let model = raw.trim_matches('\0');
            if model.is_empty() {
                "Raspberry Pi (unknown)".into()
            } else {
                model.into()
            }
        }
        Err(e) => {
            debug!("Linux: model read failed ({})", e);
            "Raspberry Pi (detection failed)".into()
        }
    }
}

/// Parse `vcgencmd measure_temp` output (`temp=48.3'C`).
pub fn parse_vcgencmd(output: &str) -> Option<f32> {
    let start = output.find("temp=")? + "temp=".len();
    let rest = &output[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Parse a thermal-zone file (millidegrees) into Celsius, 2 decimals.
pub fn parse_thermal_zone(contents: &str) -> Option<f32> {
    let milli: i64 = contents.trim().parse().ok()?;
    Some((milli as f32 / 1000.0 * 100.0).round() / 100.0)
}

/// CPU temperature: `vcgencmd` first, thermal zone as fallback.
pub fn read_cpu_temperature(thermal_zone: &Path) -> Result<f32> {
    match Command::new("vcgencmd").arg("measure_temp").output() {
        Ok(out) if out.status.success() => {
            if let Some(t) = parse_vcgencmd(&String::from_utf8_lossy(&out.stdout)) {
                return Ok(t);
            }
        }
        Ok(out) => debug!("Linux: vcgencmd exited with {}", out.status),
        Err(e) => debug!("Linux: vcgencmd unavailable ({})", e),
    }

    fs::read_to_string(thermal_zone)
        .ok()
        .as_deref()
        .and_then(parse_thermal_zone)
        .ok_or_else(|| SensorError::TemperatureUnavailable.into())
}

#[cfg(all(target_os = "linux", feature = "rpi"))]
pub use gpio::LinuxBackend;

#[cfg(all(target_os = "linux", feature = "rpi"))]
mod gpio {
    use std::collections::HashMap;
    use std::path::Path;

    use log::{info, warn};
    use rppal::gpio::{Gpio, InputPin, OutputPin};

    use crate::app::ports::{HardwareBackend, PinId, Platform, Pull};
    use crate::error::{Error, GpioError, Result};

    enum LinuxPin {
        Output(OutputPin),
        Input(InputPin),
        Pwm {
            pin: OutputPin,
            freq_hz: u32,
            duty_percent: f32,
        },
    }

    /// rppal-backed GPIO on a full-size Raspberry Pi (BCM numbering).
    ///
    /// Pins are reset to their original mode when released, which is
    /// what `cleanup()` relies on.
    pub struct LinuxBackend {
        gpio: Gpio,
        pins: HashMap<u8, LinuxPin>,
        model: String,
    }

    impl LinuxBackend {
        pub fn new() -> Result<Self> {
            let gpio = Gpio::new().map_err(|e| {
                warn!("Linux: GPIO controller unavailable ({})", e);
                Error::Init("GPIO library not available")
            })?;
            let model = super::read_model(Path::new(super::DEVICE_TREE_MODEL));
            info!("Linux: GPIO ready on {}", model);
            Ok(Self {
                gpio,
                pins: HashMap::new(),
                model,
            })
        }

        fn claim(&mut self, pin: PinId) -> Result<rppal::gpio::Pin> {
            let n = number(pin)?;
            // Reconfiguring drops the previous handle first.
            self.pins.remove(&n);
            self.gpio.get(n).map_err(|e| {
                warn!("Linux: GPIO{} unavailable ({})", n, e);
                GpioError::PinUnavailable(n).into()
            })
        }

        fn get_mut(&mut self, pin: PinId) -> Result<(u8, &mut LinuxPin)> {
            let n = number(pin)?;
            self.pins
                .get_mut(&n)
                .map(|p| (n, p))
                .ok_or_else(|| GpioError::Released(n).into())
        }
    }

    fn number(pin: PinId) -> Result<u8> {
        match pin {
            PinId::Gpio(n) => Ok(n),
            PinId::OnboardLed => Err(GpioError::UnsupportedPin.into()),
        }
    }

    fn apply_pwm(pin: &mut OutputPin, freq_hz: u32, duty_percent: f32) -> Result<()> {
        let duty = f64::from(duty_percent.clamp(0.0, 100.0)) / 100.0;
        pin.set_pwm_frequency(f64::from(freq_hz), duty).map_err(|e| {
            warn!("Linux: PWM update failed ({})", e);
            GpioError::PwmFailed.into()
        })
    }

    impl HardwareBackend for LinuxBackend {
        fn platform(&self) -> Platform {
            Platform::LinuxBoard
        }

        fn model(&self) -> String {
            self.model.clone()
        }

        fn cpu_temperature(&mut self) -> Result<f32> {
            super::read_cpu_temperature(Path::new(super::THERMAL_ZONE_TEMP))
        }

        fn setup_output(&mut self, pin: PinId, initial: Option<bool>) -> Result<()> {
            let mut out = self.claim(pin)?.into_output();
            match initial {
                Some(true) => out.set_high(),
                Some(false) => out.set_low(),
                None => {}
            }
            self.pins.insert(number(pin)?, LinuxPin::Output(out));
            Ok(())
        }

        fn setup_input(&mut self, pin: PinId, pull: Pull) -> Result<()> {
            let raw = self.claim(pin)?;
            let input = match pull {
                Pull::Up => raw.into_input_pullup(),
                Pull::Down => raw.into_input_pulldown(),
                Pull::None => raw.into_input(),
            };
            self.pins.insert(number(pin)?, LinuxPin::Input(input));
            Ok(())
        }

        fn write(&mut self, pin: PinId, high: bool) -> Result<()> {
            match self.get_mut(pin)? {
                (_, LinuxPin::Output(out)) => {
                    if high {
                        out.set_high();
                    } else {
                        out.set_low();
                    }
                    Ok(())
                }
                (n, _) => Err(GpioError::WrongMode(n).into()),
            }
        }

        fn read(&mut self, pin: PinId) -> Result<bool> {
            match self.get_mut(pin)? {
                (_, LinuxPin::Input(input)) => Ok(input.is_high()),
                (_, LinuxPin::Output(out)) => Ok(out.is_set_high()),
                (n, LinuxPin::Pwm { .. }) => Err(GpioError::WrongMode(n).into()),
            }
        }

        fn output_level(&self, pin: PinId) -> Result<bool> {
            let n = number(pin)?;
            match self.pins.get(&n) {
                Some(LinuxPin::Output(out)) => Ok(out.is_set_high()),
                Some(_) => Err(GpioError::WrongMode(n).into()),
                None => Err(GpioError::Released(n).into()),
            }
        }

        fn setup_pwm(&mut self, pin: PinId, freq_hz: u32, duty_percent: f32) -> Result<()> {
            let mut out = self.claim(pin)?.into_output_low();
            apply_pwm(&mut out, freq_hz, duty_percent)?;
            self.pins.insert(
                number(pin)?,
                LinuxPin::Pwm {
                    pin: out,
                    freq_hz,
                    duty_percent,
                },
            );
            Ok(())
        }

        fn set_pwm_duty(&mut self, pin: PinId, duty_percent: f32) -> Result<()> {
            match self.get_mut(pin)? {
                (_, LinuxPin::Pwm { pin, freq_hz, duty_percent: d }) => {
                    apply_pwm(pin, *freq_hz, duty_percent)?;
                    *d = duty_percent;
                    Ok(())
                }
                (n, _) => Err(GpioError::WrongMode(n).into()),
            }
        }

        fn set_pwm_frequency(&mut self, pin: PinId, freq_hz: u32) -> Result<()> {
            match self.get_mut(pin)? {
                (_, LinuxPin::Pwm { pin, freq_hz: f, duty_percent }) => {
                    apply_pwm(pin, freq_hz, *duty_percent)?;
                    *f = freq_hz;
                    Ok(())
                }
                (n, _) => Err(GpioError::WrongMode(n).into()),
            }
        }

        fn cleanup(&mut self) {
            self.pins.clear();
        }
    }
}
