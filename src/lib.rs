//! Lightweight application framework for Raspberry Pi-class boards.
//!
//! An application implements [`App`](app::service::App) and is driven by
//! [`AppService`](app::service::AppService). Hardware goes through
//! [`PiHardwareAdapter`](adapters::hardware::PiHardwareAdapter), which
//! picks the Linux, microcontroller or simulated back end and hands out
//! `embedded-hal` pin handles. Real GPIO on Linux needs the `rpi` feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod device;
pub mod drivers;
pub mod error;
pub mod logging;
pub mod pins;

pub use error::{Error, Result};
