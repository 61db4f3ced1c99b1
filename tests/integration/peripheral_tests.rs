//! LED and motor drivers on adapter handles.

use rpi_app_framework::adapters::hardware::PiHardwareAdapter;
use rpi_app_framework::adapters::hardware::sim::{SimBackend, SimPin, SimProbe};
use rpi_app_framework::device::Device;
use rpi_app_framework::drivers::delay::StdDelay;
use rpi_app_framework::drivers::motor::{Channel, Direction, MotorState, Tb6612fng};
use rpi_app_framework::pins;

fn sim() -> (PiHardwareAdapter, SimProbe) {
    let backend = SimBackend::new(40.0);
    let probe = backend.probe();
    (PiHardwareAdapter::with_backend(backend), probe)
}

fn level(probe: &SimProbe, pin: u8) -> Option<bool> {
    match probe.pin(pin) {
        Some(SimPin::Output { high }) => Some(high),
        _ => None,
    }
}

fn duty(probe: &SimProbe, pin: u8) -> Option<f32> {
    match probe.pin(pin) {
        Some(SimPin::Pwm { duty_percent, .. }) => Some(duty_percent),
        _ => None,
    }
}

#[test]
fn led_blink_leaves_the_pin_low() {
    let (hw, probe) = sim();
    let mut led = hw.led(pins::STATUS_LED_GPIO).unwrap();
    assert_eq!(led.name(), "GPIO17");

    led.blink(&mut StdDelay, 1, 2).unwrap();
    assert_eq!(level(&probe, pins::STATUS_LED_GPIO), Some(false));

    led.toggle().unwrap();
    assert_eq!(level(&probe, pins::STATUS_LED_GPIO), Some(true));
    led.release().unwrap();
    assert_eq!(level(&probe, pins::STATUS_LED_GPIO), Some(false));
}

#[test]
fn motor_on_default_pins() {
    let (hw, probe) = sim();
    let mut motor = Tb6612fng::with_default_pins(&hw).unwrap();
    assert_eq!(level(&probe, pins::MOTOR_STBY_GPIO), Some(true));
    assert!(matches!(
        probe.pin(pins::MOTOR_PWMA_GPIO),
        Some(SimPin::Pwm {
            freq_hz: pins::MOTOR_PWM_FREQ_HZ,
            ..
        })
    ));

    motor.drive(Channel::A, 75).unwrap();
    assert_eq!(level(&probe, pins::MOTOR_AIN1_GPIO), Some(true));
    assert_eq!(level(&probe, pins::MOTOR_AIN2_GPIO), Some(false));
    let a = duty(&probe, pins::MOTOR_PWMA_GPIO).unwrap();
    assert!((a - 75.0).abs() < 0.01, "duty {a}");

    motor.drive(Channel::B, -30).unwrap();
    assert_eq!(level(&probe, pins::MOTOR_BIN1_GPIO), Some(false));
    assert_eq!(level(&probe, pins::MOTOR_BIN2_GPIO), Some(true));
    assert_eq!(
        motor.state(Channel::B),
        MotorState::Running {
            speed: 30,
            dir: Direction::Reverse
        }
    );

    motor.brake(Channel::A).unwrap();
    assert_eq!(duty(&probe, pins::MOTOR_PWMA_GPIO), Some(0.0));
    assert_eq!(level(&probe, pins::MOTOR_AIN2_GPIO), Some(true));

    motor.release().unwrap();
    assert_eq!(level(&probe, pins::MOTOR_STBY_GPIO), Some(false));
    assert_eq!(motor.state(Channel::A), MotorState::Coasting);
    assert_eq!(motor.state(Channel::B), MotorState::Coasting);
}

#[test]
fn motor_after_cleanup_reports_write_failure() {
    let (hw, _) = sim();
    let mut motor = Tb6612fng::with_default_pins(&hw).unwrap();
    hw.cleanup();
    assert!(motor.drive(Channel::A, 50).is_err());
}
