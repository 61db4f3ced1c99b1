//! Outbound lifecycle events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them.

/// Structured events emitted by the application lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application is about to run its setup hook.
    Started { app: String },

    /// The run loop ended after the running flag was cleared.
    Stopped { app: String, iterations: u64 },

    /// A hook returned an error; the loop has been stopped.
    Fault { app: String, stage: Stage, reason: String },
}

/// Which hook a fault came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    Run,
    Teardown,
}
