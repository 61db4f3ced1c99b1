//! Application core: lifecycle and port traits, zero vendor I/O.
//!
//! [`service`] runs an application's hooks; every interaction with
//! hardware, storage or logging goes through the **port traits** in
//! [`ports`], keeping this layer testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
