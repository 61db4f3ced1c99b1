//! PiHardwareAdapter over the simulated and Pico back ends.

use embedded_hal::digital::{InputPin, OutputPin, StatefulOutputPin};
use embedded_hal::pwm::SetDutyCycle;
use rpi_app_framework::adapters::hardware::PiHardwareAdapter;
use rpi_app_framework::adapters::hardware::pico::PicoBackend;
use rpi_app_framework::adapters::hardware::sim::{SimBackend, SimPin};
use rpi_app_framework::app::ports::{PinId, PinMode, Platform, Pull};
use rpi_app_framework::error::{Error, GpioError, SensorError};

use crate::mock_hw::{BoardCall, MockPicoBoard};

fn sim() -> (PiHardwareAdapter, rpi_app_framework::adapters::hardware::sim::SimProbe) {
    let backend = SimBackend::new(45.0);
    let probe = backend.probe();
    (PiHardwareAdapter::with_backend(backend), probe)
}

// ── Simulated back end ────────────────────────────────────────

#[test]
fn sim_reports_platform_model_and_temperature() {
    let (hw, probe) = sim();
    assert_eq!(hw.platform(), Platform::Simulated);
    assert_eq!(hw.model(), "Raspberry Pi (simulated)");
    assert_eq!(hw.cpu_temperature().unwrap(), 45.0);

    probe.set_temperature(61.25);
    assert_eq!(hw.cpu_temp().unwrap(), 61.25);
}

#[test]
fn embedded_hal_traits_reach_the_backend() {
    let (hw, probe) = sim();

    let mut out = hw.digital_out(17, None).unwrap();
    out.set_high().unwrap();
    assert!(out.is_set_high().unwrap());
    out.toggle().unwrap();
    assert_eq!(probe.pin(17), Some(SimPin::Output { high: false }));

    let mut button = hw.digital_in(27, Pull::Up).unwrap();
    assert!(button.is_high().unwrap());
    probe.set_input(27, false);
    assert!(button.is_low().unwrap());

    let mut pwm = hw.pwm(18, 1_000, 0.0).unwrap();
    pwm.set_duty_cycle_fully_on().unwrap();
    assert_eq!(pwm.duty(), 100.0);
    pwm.set_duty_cycle_percent(25).unwrap();
    assert!((pwm.duty() - 25.0).abs() < 0.01);
}

#[test]
fn pwm_frequency_can_change() {
    let (hw, probe) = sim();
    let mut pwm = hw.pwm_default(12).unwrap();
    assert_eq!(pwm.frequency(), 1_000);
    assert_eq!(pwm.duty(), 0.0);

    pwm.set_frequency(50).unwrap();
    assert_eq!(
        probe.pin(12),
        Some(SimPin::Pwm {
            freq_hz: 50,
            duty_percent: 0.0
        })
    );
}

#[test]
fn wrong_mode_is_an_error() {
    let (hw, _) = sim();
    hw.setup_pin(4, PinMode::Input).unwrap();
    let mut pwm = hw.pwm(4, 1_000, 10.0).unwrap();
    pwm.set_duty(20.0).unwrap();

    let mut out = hw.digital_out(5, None).unwrap();
    hw.setup_pin(5, PinMode::Input).unwrap();
    assert_eq!(out.set_high(), Err(Error::Gpio(GpioError::WrongMode(5))));
}

#[test]
fn cleanup_releases_every_pin() {
    let (hw, probe) = sim();
    let mut led = hw.led(17).unwrap();
    let _pwm = hw.pwm(12, 1_000, 50.0).unwrap();
    led.on().unwrap();
    assert_eq!(probe.claimed(), 2);

    hw.cleanup();

    assert_eq!(probe.claimed(), 0);
    assert_eq!(led.on(), Err(Error::Gpio(GpioError::Released(17))));
}

// ── Pico back end ─────────────────────────────────────────────

#[test]
fn pico_converts_duty_to_16_bit() {
    let board = MockPicoBoard::default();
    let hw = PiHardwareAdapter::with_backend(PicoBackend::new(board.clone()));
    assert_eq!(hw.platform(), Platform::Microcontroller);
    assert_eq!(hw.model(), "Raspberry Pi Pico 2 W");

    let mut pwm = hw.pwm(15, 1_000, 50.0).unwrap();
    assert_eq!(board.last_duty(PinId::Gpio(15)), Some(32_767));
    pwm.set_duty(100.0).unwrap();
    assert_eq!(board.last_duty(PinId::Gpio(15)), Some(65_535));
    assert!(board.calls().contains(&BoardCall::Pwm(PinId::Gpio(15), 1_000)));
}

#[test]
fn pico_onboard_led_is_the_default() {
    let board = MockPicoBoard::default();
    let hw = PiHardwareAdapter::with_backend(PicoBackend::new(board.clone()));
    assert_eq!(hw.default_led_pin(), PinId::OnboardLed);

    let mut led = hw.led(hw.default_led_pin()).unwrap();
    led.on().unwrap();
    assert!(led.is_on().unwrap());
    assert_eq!(
        board.calls().last(),
        Some(&BoardCall::Level(PinId::OnboardLed, true))
    );
}

#[test]
fn pico_temperature_from_adc() {
    // 0.706 V on the sensor is 27 °C.
    let raw = (0.706_f32 / 3.3 * 65_535.0).round() as u16;
    let hw = PiHardwareAdapter::with_backend(PicoBackend::new(MockPicoBoard::with_adc(raw)));
    let t = hw.cpu_temperature().unwrap();
    assert!((t - 27.0).abs() < 0.1, "got {t}");
}

#[test]
fn pico_adc_failure_is_a_sensor_error() {
    let hw = PiHardwareAdapter::with_backend(PicoBackend::new(MockPicoBoard::default()));
    assert_eq!(
        hw.cpu_temperature(),
        Err(Error::Sensor(SensorError::AdcReadFailed))
    );
}

#[test]
fn pico_input_reads_through_the_board() {
    let board = MockPicoBoard::default();
    let hw = PiHardwareAdapter::with_backend(PicoBackend::new(board.clone()));
    let mut input = hw.digital_in(3, Pull::Up).unwrap();
    assert!(input.is_high().unwrap());
    assert!(board.calls().contains(&BoardCall::Input(PinId::Gpio(3), Pull::Up)));
}
