//! Default pin assignments and PWM constants.
//!
//! Single source of truth for the wiring the demo binary and the
//! convenience constructors assume. Boards wired differently pass their
//! own numbers; nothing below is mandatory.

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// External status LED on full-size boards (BCM numbering).
pub const STATUS_LED_GPIO: u8 = 17;

// ---------------------------------------------------------------------------
// TB6612FNG dual H-bridge (BCM numbering)
// ---------------------------------------------------------------------------

pub const MOTOR_AIN1_GPIO: u8 = 5;
pub const MOTOR_AIN2_GPIO: u8 = 6;
pub const MOTOR_PWMA_GPIO: u8 = 12;
pub const MOTOR_BIN1_GPIO: u8 = 20;
pub const MOTOR_BIN2_GPIO: u8 = 21;
pub const MOTOR_PWMB_GPIO: u8 = 13;
/// Digital output: LOW = driver in standby.
pub const MOTOR_STBY_GPIO: u8 = 16;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Default PWM frequency when none is given.
pub const DEFAULT_PWM_FREQ_HZ: u32 = 1_000;
/// PWM frequency for the motor driver (inaudible on most motors).
pub const MOTOR_PWM_FREQ_HZ: u32 = 20_000;

// ---------------------------------------------------------------------------
// Microcontroller (Pico 2 W)
// ---------------------------------------------------------------------------

/// ADC channel wired to the on-die temperature sensor.
pub const PICO_TEMP_ADC_CHANNEL: u8 = 4;
