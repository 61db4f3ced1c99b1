//! rpi-app: demo application.
//!
//! Blinks the status LED once per second and serves a small status page.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  PiHardwareAdapter   LogEventSink   JsonFileConfig       │
//! │  (Linux / Pico / sim) (EventSink)   (ConfigPort)         │
//! │  WifiManager          WebServer                          │
//! │                                                          │
//! │  ──────────────── Port Trait Boundary ────────────────   │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │  AppService ─▶ MyApp (setup · run · teardown)  │      │
//! │  └────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `rpi-app [config.json]`
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::json;

use rpi_app_framework::adapters::config_file::JsonFileConfig;
use rpi_app_framework::adapters::hardware::{DigitalOut, PiHardwareAdapter};
use rpi_app_framework::adapters::log_sink::LogEventSink;
use rpi_app_framework::adapters::signals;
use rpi_app_framework::adapters::web::{Response, WebServer};
use rpi_app_framework::adapters::wifi::{NmcliRadio, WifiManager};
use rpi_app_framework::app::ports::ConfigPort;
use rpi_app_framework::app::service::{App, AppContext, AppService};
use rpi_app_framework::config::AppConfig;
use rpi_app_framework::device::Device;
use rpi_app_framework::drivers::delay::StdDelay;
use rpi_app_framework::drivers::led::Led;
use rpi_app_framework::logging;

// ── Demo application ──────────────────────────────────────────

struct MyApp {
    hw: Arc<PiHardwareAdapter>,
    led: Option<Led<DigitalOut>>,
    delay: StdDelay,
    web: WebServer,
}

impl MyApp {
    fn new(hw: Arc<PiHardwareAdapter>, web: WebServer) -> Self {
        Self {
            hw,
            led: None,
            delay: StdDelay,
            web,
        }
    }
}

impl App for MyApp {
    fn setup(&mut self, ctx: &mut AppContext) -> Result<()> {
        let mut led = self
            .hw
            .led(self.hw.default_led_pin())
            .context("status LED")?;
        led.off()?;
        self.led = Some(led);

        let hw = Arc::clone(&self.hw);
        let name = ctx.name().to_owned();
        self.web.get("/status", move |_| {
            Response::json(&json!({
                "app": name,
                "model": hw.model(),
                "cpu_temp_c": hw.cpu_temp().ok(),
            }))
        });
        self.web.start().context("web server")?;

        ctx.log("MyApp setup complete");
        Ok(())
    }

    fn run(&mut self, _ctx: &mut AppContext) -> Result<()> {
        if let Some(led) = self.led.as_mut() {
            led.blink(&mut self.delay, 500, 1)?;
        }
        Ok(())
    }

    fn teardown(&mut self, ctx: &mut AppContext) -> Result<()> {
        self.web.release()?;
        if let Some(mut led) = self.led.take() {
            led.release()?;
        }
        self.hw.cleanup();
        ctx.log("MyApp stopped");
        Ok(())
    }
}

// ── Entry point ───────────────────────────────────────────────

fn load_config() -> Result<AppConfig> {
    match std::env::args().nth(1) {
        Some(path) => JsonFileConfig::new(&path)
            .load()
            .with_context(|| format!("loading {path}")),
        None => Ok(AppConfig {
            loop_interval_ms: 1_000,
            ..AppConfig::named("MyApp")
        }),
    }
}

fn main() -> Result<()> {
    let config = load_config()?;

    logging::init(&config.log, &config.app_name)?;
    logging::install_panic_hook();

    info!("╔══════════════════════════════════════╗");
    info!("║  rpi-app v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let hw = Arc::new(PiHardwareAdapter::detect(&config.hardware)?);
    info!("Board: {} ({:?})", hw.model(), hw.platform());
    match hw.cpu_temp() {
        Ok(t) => info!("CPU temperature: {:.2} °C", t),
        Err(e) => warn!("CPU temperature unavailable: {}", e),
    }

    if !config.wifi.ssid.is_empty() {
        let mut wifi = WifiManager::from_config(NmcliRadio::default(), &config.wifi)?;
        let timeout = Duration::from_secs(u64::from(config.wifi.connect_timeout_secs));
        if let Err(e) = wifi.connect(timeout) {
            warn!("WiFi: {}, continuing without network", e);
        }
    }

    let mut app = MyApp::new(hw, WebServer::new(&config.web));
    let mut service = AppService::new(config, LogEventSink::new());
    signals::stop_on_signal(service.stop_handle())?;
    service.start(&mut app)
}
