//! Peripheral drivers built on `embedded-hal` traits.

pub mod delay;
pub mod led;
pub mod motor;
