//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing lifecycle events through the `log`
//! facade, which ends up in the rotating log file when it is installed.

use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { app } => {
                info!("START | app={}", app);
            }
            AppEvent::Stopped { app, iterations } => {
                info!("STOP  | app={} | iterations={}", app, iterations);
            }
            AppEvent::Fault { app, stage, reason } => {
                error!("FAULT | app={} | stage={:?} | {}", app, stage, reason);
            }
        }
    }
}
