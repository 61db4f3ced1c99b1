//! WiFi station-mode manager.
//!
//! [`WifiManager`] validates credentials and drives a [`WifiRadio`]
//! through one association attempt, polling until the link is up or the
//! timeout expires.
//!
//! ## Radios
//!
//! - [`NmcliRadio`]: NetworkManager on Linux boards (`nmcli`).
//! - [`SimRadio`]: in-memory radio for host-side tests.
//!
//! ## Reconnection policy
//!
//! None. A dropped link is reported by [`WifiManager::is_connected`];
//! the application decides whether to call `connect` again.

use core::fmt;
use std::net::Ipv4Addr;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::app::ports::WifiRadio;
use crate::config::WifiConfig;
use crate::device::Device;
use crate::error::{CommsError, Error};

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    Timeout,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::Timeout => write!(f, "WiFi connection timed out"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        match e {
            ConnectivityError::NoCredentials => Error::Config("no WiFi credentials configured"),
            ConnectivityError::InvalidSsid => Error::Config("invalid SSID"),
            ConnectivityError::InvalidPassword => Error::Config("invalid WiFi password"),
            ConnectivityError::ConnectionFailed => CommsError::WifiConnectFailed.into(),
            ConnectivityError::Timeout => CommsError::WifiTimeout.into(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

/// Space through tilde.
fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi manager
// ───────────────────────────────────────────────────────────────

pub struct WifiManager<R: WifiRadio> {
    radio: R,
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    poll_interval: Duration,
}

impl<R: WifiRadio> WifiManager<R> {
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Manager with credentials taken from `cfg`. An empty SSID leaves
    /// the manager unconfigured.
    pub fn from_config(radio: R, cfg: &WifiConfig) -> Result<Self, ConnectivityError> {
        let mut wifi = Self::new(radio);
        if !cfg.ssid.is_empty() {
            wifi.set_credentials(&cfg.ssid, &cfg.password)?;
        }
        Ok(wifi)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    /// One association attempt, waiting up to `timeout` for the link.
    /// Already connected is a no-op.
    pub fn connect(&mut self, timeout: Duration) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.radio.is_associated(&self.ssid) {
            self.state = WifiState::Connected;
            return Ok(());
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = WifiState::Connecting;

        if let Err(e) = self.radio.associate(&self.ssid, &self.password) {
            error!("WiFi: association failed: {}", e);
            self.state = WifiState::Failed;
            return Err(ConnectivityError::ConnectionFailed);
        }

        let deadline = Instant::now() + timeout;
        loop {
            if self.radio.is_associated(&self.ssid) {
                self.state = WifiState::Connected;
                info!(
                    "WiFi: connected (IP={:?}, RSSI={:?})",
                    self.radio.ip_address(),
                    self.radio.rssi()
                );
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                warn!("WiFi: no link after {:?}", timeout);
                self.state = WifiState::Failed;
                return Err(ConnectivityError::Timeout);
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    pub fn disconnect(&mut self) {
        if !self.ssid.is_empty() {
            self.radio.disassociate(&self.ssid);
        }
        self.state = WifiState::Disconnected;
        info!("WiFi: disconnected");
    }

    /// Live link check. A dropped link moves the state back to `Disconnected`.
    pub fn is_connected(&mut self) -> bool {
        let up = !self.ssid.is_empty() && self.radio.is_associated(&self.ssid);
        if !up && self.state == WifiState::Connected {
            warn!("WiFi: connection lost");
            self.state = WifiState::Disconnected;
        }
        up
    }

    pub fn ip_address(&mut self) -> Option<Ipv4Addr> {
        if self.is_connected() {
            self.radio.ip_address()
        } else {
            None
        }
    }

    pub fn rssi(&mut self) -> Option<i8> {
        if self.is_connected() {
            self.radio.rssi()
        } else {
            None
        }
    }
}

impl<R: WifiRadio> Device for WifiManager<R> {
    fn name(&self) -> &str {
        "WiFi"
    }

    fn release(&mut self) -> crate::Result<()> {
        self.disconnect();
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkManager radio
// ───────────────────────────────────────────────────────────────

/// Station radio driven through the `nmcli` command-line client.
pub struct NmcliRadio {
    interface: String,
}

impl NmcliRadio {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    fn run(args: &[&str]) -> Option<String> {
        match Command::new("nmcli").args(args).output() {
            Ok(out) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
            Ok(out) => {
                debug!(
                    "WiFi(nmcli): {:?} failed: {}",
                    args.first(),
                    String::from_utf8_lossy(&out.stderr).trim()
                );
                None
            }
            Err(e) => {
                debug!("WiFi(nmcli): not available ({})", e);
                None
            }
        }
    }
}

impl Default for NmcliRadio {
    fn default() -> Self {
        Self::new("wlan0")
    }
}

impl WifiRadio for NmcliRadio {
    fn associate(&mut self, ssid: &str, password: &str) -> crate::Result<()> {
        let mut args = vec!["device", "wifi", "connect", ssid, "ifname", self.interface.as_str()];
        if !password.is_empty() {
            args.extend(["password", password]);
        }
        Self::run(&args)
            .map(|_| ())
            .ok_or_else(|| CommsError::WifiConnectFailed.into())
    }

    fn disassociate(&mut self, _ssid: &str) {
        if Self::run(&["device", "disconnect", self.interface.as_str()]).is_none() {
            warn!("WiFi(nmcli): disconnect of {} failed", self.interface);
        }
    }

    fn is_associated(&mut self, ssid: &str) -> bool {
        Self::run(&["-t", "-f", "ACTIVE,SSID", "device", "wifi", "list", "ifname", self.interface.as_str()])
            .is_some_and(|out| is_active_ssid(&out, ssid))
    }

    fn ip_address(&mut self) -> Option<Ipv4Addr> {
        Self::run(&["-t", "-g", "IP4.ADDRESS", "device", "show", self.interface.as_str()])
            .and_then(|out| parse_ip4_address(&out))
    }

    fn rssi(&mut self) -> Option<i8> {
        Self::run(&["-t", "-f", "ACTIVE,SIGNAL", "device", "wifi", "list", "ifname", self.interface.as_str()])
            .and_then(|out| parse_active_signal(&out))
    }
}

/// `nmcli -t` escapes `:` inside fields as `\:`.
fn is_active_ssid(output: &str, ssid: &str) -> bool {
    let wanted = format!("yes:{}", ssid.replace(':', "\\:"));
    output.lines().any(|line| line == wanted)
}

fn parse_ip4_address(output: &str) -> Option<Ipv4Addr> {
    let first = output.lines().next()?.split('|').next()?;
    first.split('/').next()?.trim().parse().ok()
}

/// nmcli reports signal quality in percent; map it onto dBm
/// (`quality = 2 * (dBm + 100)`).
fn parse_active_signal(output: &str) -> Option<i8> {
    let quality: i16 = output
        .lines()
        .find_map(|line| line.strip_prefix("yes:"))?
        .trim()
        .parse()
        .ok()?;
    Some((quality.clamp(0, 100) / 2 - 100) as i8)
}

// ───────────────────────────────────────────────────────────────
// Simulated radio
// ───────────────────────────────────────────────────────────────

/// In-memory radio. Associates after a configurable number of polls.
#[derive(Debug, Clone)]
pub struct SimRadio {
    associated: Option<String>,
    pending: Option<String>,
    polls_until_up: Option<u32>,
    remaining: u32,
    reject: bool,
    ip: Ipv4Addr,
    rssi: i8,
}

impl SimRadio {
    /// Radio that links up on the first poll.
    pub fn new() -> Self {
        Self {
            associated: None,
            pending: None,
            polls_until_up: Some(0),
            remaining: 0,
            reject: false,
            ip: Ipv4Addr::new(192, 168, 4, 2),
            rssi: -60,
        }
    }

    /// Link comes up after `polls` unsuccessful polls.
    pub fn with_delay(mut self, polls: u32) -> Self {
        self.polls_until_up = Some(polls);
        self
    }

    /// The access point never answers.
    pub fn unreachable(mut self) -> Self {
        self.polls_until_up = None;
        self
    }

    /// `associate` itself fails.
    pub fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    /// Simulate the access point going away.
    pub fn drop_link(&mut self) {
        self.associated = None;
    }
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiRadio for SimRadio {
    fn associate(&mut self, ssid: &str, _password: &str) -> crate::Result<()> {
        if self.reject {
            return Err(CommsError::WifiConnectFailed.into());
        }
        self.pending = Some(ssid.to_owned());
        self.remaining = self.polls_until_up.unwrap_or(0);
        Ok(())
    }

    fn disassociate(&mut self, _ssid: &str) {
        self.associated = None;
        self.pending = None;
    }

    fn is_associated(&mut self, ssid: &str) -> bool {
        if self.pending.as_deref() == Some(ssid) && self.polls_until_up.is_some() {
            if self.remaining == 0 {
                self.associated = self.pending.take();
            } else {
                self.remaining -= 1;
            }
        }
        self.associated.as_deref() == Some(ssid)
    }

    fn ip_address(&mut self) -> Option<Ipv4Addr> {
        self.associated.as_ref().map(|_| self.ip)
    }

    fn rssi(&mut self) -> Option<i8> {
        self.associated.as_ref().map(|_| self.rssi)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
