//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter        | Implements         | Connects to                    |
//! |----------------|--------------------|--------------------------------|
//! | `hardware`     | HardwareBackend    | rppal / Pico board / simulator |
//! | `config_file`  | ConfigPort         | JSON file on disk              |
//! | `log_sink`     | EventSink          | `log` facade                   |
//! | `wifi`         | WifiRadio          | NetworkManager / simulator     |
//! | `web`          | -                  | warp HTTP server               |
//! | `signals`      | -                  | SIGINT / SIGTERM               |

pub mod config_file;
pub mod hardware;
pub mod log_sink;
pub mod signals;
pub mod web;
pub mod wifi;
