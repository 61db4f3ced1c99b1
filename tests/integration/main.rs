//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters or the simulated back end. All tests run on the
//! host with no real hardware required.

mod app_lifecycle_tests;
mod hardware_adapter_tests;
mod mock_hw;
mod peripheral_tests;
mod web_server_tests;
mod wifi_flow_tests;
