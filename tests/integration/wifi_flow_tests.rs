//! WifiManager against the simulated radio.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use rpi_app_framework::adapters::wifi::{ConnectivityError, SimRadio, WifiManager, WifiState};
use rpi_app_framework::config::WifiConfig;
use rpi_app_framework::device::Device;
use rpi_app_framework::error::Error;

fn config(ssid: &str, password: &str) -> WifiConfig {
    WifiConfig {
        ssid: ssid.into(),
        password: password.into(),
        ..WifiConfig::default()
    }
}

#[test]
fn configured_manager_connects() {
    let mut wifi = WifiManager::from_config(SimRadio::new().with_delay(2), &config("Home", "hunter2hunter2"))
        .unwrap()
        .with_poll_interval(Duration::from_millis(1));
    assert_eq!(wifi.ssid(), "Home");

    wifi.connect(Duration::from_secs(1)).unwrap();
    assert_eq!(wifi.state(), WifiState::Connected);
    assert_eq!(wifi.ip_address(), Some(Ipv4Addr::new(192, 168, 4, 2)));

    // Connecting again is a no-op.
    wifi.connect(Duration::from_secs(1)).unwrap();

    wifi.release().unwrap();
    assert_eq!(wifi.state(), WifiState::Disconnected);
    assert_eq!(wifi.ip_address(), None);
}

#[test]
fn empty_ssid_leaves_manager_unconfigured() {
    let mut wifi = WifiManager::from_config(SimRadio::new(), &WifiConfig::default()).unwrap();
    assert_eq!(
        wifi.connect(Duration::from_millis(10)),
        Err(ConnectivityError::NoCredentials)
    );
}

#[test]
fn bad_password_in_config_is_rejected() {
    assert!(matches!(
        WifiManager::from_config(SimRadio::new(), &config("Home", "1234")),
        Err(ConnectivityError::InvalidPassword)
    ));
}

#[test]
fn timeout_is_a_single_attempt() {
    let mut wifi = WifiManager::new(SimRadio::new().unreachable())
        .with_poll_interval(Duration::from_millis(5));
    wifi.set_credentials("Far", "password1").unwrap();

    let started = Instant::now();
    let err = wifi.connect(Duration::from_millis(50)).unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err, ConnectivityError::Timeout);
    assert_eq!(Error::from(err).to_string(), "comms: WiFi connect timed out");
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(2));
    assert_eq!(wifi.state(), WifiState::Failed);
    assert!(!wifi.is_connected());
}
