//! Application lifecycle: the framework core.
//!
//! [`AppService`] owns the running flag, the configuration and an event
//! sink. It drives a user-supplied [`App`]: `setup` once, then `run`
//! repeatedly until the flag is cleared by a stop request or a fault.
//!
//! ```text
//!            ┌──────────────── AppService ────────────────┐
//!  start ──▶ │ setup ─▶ run ─▶ run ─▶ … ─▶ teardown        │ ──▶ EventSink
//!            └──────────▲───────────────────────────────────┘
//!                       │ StopHandle::stop() / fault
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use log::{error, info, warn};

use crate::config::AppConfig;

use super::events::{AppEvent, Stage};
use super::ports::EventSink;

// ───────────────────────────────────────────────────────────────
// App hooks
// ───────────────────────────────────────────────────────────────

/// Hooks an application implements.
///
/// `run` is one iteration of the main loop; it is called again for as
/// long as the running flag stays set. Returning an error is treated
/// as an unhandled fault and stops the loop.
pub trait App {
    fn setup(&mut self, ctx: &mut AppContext) -> anyhow::Result<()>;

    fn run(&mut self, ctx: &mut AppContext) -> anyhow::Result<()>;

    /// Release peripherals. Runs once after the loop ends, also after a fault.
    fn teardown(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Running flag
// ───────────────────────────────────────────────────────────────

/// Cloneable handle on the running flag. Safe to move to another thread
/// or a signal handler.
///
/// A stop requested before [`AppService::start`] is kept and honoured by
/// the next `start`: `setup` and `teardown` still run, `run` does not.
#[derive(Debug, Clone)]
pub struct StopHandle {
    state: Arc<AtomicU8>,
}

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

impl StopHandle {
    fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(IDLE)),
        }
    }

    /// Clear the running flag. Idempotent.
    pub fn stop(&self) {
        self.state.store(STOPPED, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    /// Set the flag unless a stop is already pending.
    fn arm(&self) -> bool {
        self.state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn reset(&self) {
        self.state.store(IDLE, Ordering::Release);
    }
}

// ───────────────────────────────────────────────────────────────
// Context handed to the hooks
// ───────────────────────────────────────────────────────────────

/// What an [`App`] sees while it runs.
pub struct AppContext {
    config: AppConfig,
    running: StopHandle,
    iterations: u64,
}

impl AppContext {
    pub fn name(&self) -> &str {
        &self.config.app_name
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.is_running()
    }

    /// Request the loop to end after the current iteration.
    pub fn stop(&self) {
        self.running.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.running.clone()
    }

    /// Number of completed `run` calls.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Log a line tagged with the application name.
    pub fn log(&self, message: &str) {
        info!("[{}] {}", self.config.app_name, message);
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// Runs an [`App`] through its lifecycle.
pub struct AppService<S: EventSink> {
    ctx: AppContext,
    sink: S,
}

impl<S: EventSink> AppService<S> {
    /// Construct the service. Does **not** start anything; call [`start`](Self::start).
    pub fn new(config: AppConfig, sink: S) -> Self {
        Self {
            ctx: AppContext {
                config,
                running: StopHandle::new(),
                iterations: 0,
            },
            sink,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.ctx.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.ctx.stop_handle()
    }

    pub fn is_running(&self) -> bool {
        self.ctx.is_running()
    }

    /// Clear the running flag.
    pub fn stop(&self) {
        if self.ctx.is_running() {
            info!("{}: stop requested", self.ctx.name());
        }
        self.ctx.stop();
    }

    /// Number of `run` calls completed by the last [`start`](Self::start).
    pub fn iterations(&self) -> u64 {
        self.ctx.iterations
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run `app` to completion: `setup` once, `run` until stopped, then `teardown`.
    ///
    /// Returns the first hook error after the loop has been shut down.
    pub fn start(&mut self, app: &mut impl App) -> anyhow::Result<()> {
        if !self.ctx.running.arm() {
            info!("{}: stop requested before start", self.ctx.name());
        }
        let result = self.lifecycle(app);
        self.ctx.running.reset();
        result
    }

    fn lifecycle(&mut self, app: &mut impl App) -> anyhow::Result<()> {
        let name = self.ctx.name().to_owned();
        self.ctx.iterations = 0;

        info!("{}: starting", name);
        self.sink.emit(&AppEvent::Started { app: name.clone() });

        if let Err(e) = app.setup(&mut self.ctx) {
            return Err(self.fault(app, Stage::Setup, e));
        }
        info!("{}: setup complete", name);

        let pause = Duration::from_millis(u64::from(self.ctx.config.loop_interval_ms));
        while self.ctx.is_running() {
            if let Err(e) = app.run(&mut self.ctx) {
                return Err(self.fault(app, Stage::Run, e));
            }
            self.ctx.iterations += 1;

            if !pause.is_zero() && self.ctx.is_running() {
                std::thread::sleep(pause);
            }
        }

        if let Err(e) = app.teardown(&mut self.ctx) {
            error!("{}: teardown failed: {:#}", name, e);
            self.sink.emit(&AppEvent::Fault {
                app: name,
                stage: Stage::Teardown,
                reason: format!("{e:#}"),
            });
            return Err(e);
        }

        info!("{}: stopped after {} iterations", name, self.ctx.iterations);
        self.sink.emit(&AppEvent::Stopped {
            app: name,
            iterations: self.ctx.iterations,
        });
        Ok(())
    }

    fn fault(&mut self, app: &mut impl App, stage: Stage, err: anyhow::Error) -> anyhow::Error {
        let name = self.ctx.name().to_owned();
        error!("{}: unhandled fault in {:?}: {:#}", name, stage, err);
        self.ctx.stop();
        self.sink.emit(&AppEvent::Fault {
            app: name.clone(),
            stage,
            reason: format!("{err:#}"),
        });

        if let Err(e) = app.teardown(&mut self.ctx) {
            warn!("{}: teardown after fault failed: {:#}", name, e);
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Vec<AppEvent>);

    impl EventSink for Recorder {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(event.clone());
        }
    }

    #[derive(Default)]
    struct Counter {
        setups: u32,
        runs: u32,
        teardowns: u32,
        stop_after: u32,
    }

    impl App for Counter {
        fn setup(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
            self.setups += 1;
            Ok(())
        }

        fn run(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
            self.runs += 1;
            if self.runs >= self.stop_after {
                ctx.stop();
            }
            Ok(())
        }

        fn teardown(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
            self.teardowns += 1;
            Ok(())
        }
    }

    #[test]
    fn setup_once_then_run_until_stopped() {
        let mut svc = AppService::new(AppConfig::named("Counter"), Recorder(Vec::new()));
        let mut app = Counter {
            stop_after: 5,
            ..Counter::default()
        };

        svc.start(&mut app).unwrap();

        assert_eq!(app.setups, 1);
        assert_eq!(app.runs, 5);
        assert_eq!(app.teardowns, 1);
        assert_eq!(svc.iterations(), 5);
        assert!(!svc.is_running());
        assert_eq!(
            svc.sink().0.last(),
            Some(&AppEvent::Stopped {
                app: "Counter".into(),
                iterations: 5
            })
        );
    }

    #[test]
    fn stop_is_idempotent() {
        let svc = AppService::new(AppConfig::default(), Recorder(Vec::new()));
        svc.stop();
        svc.stop();
        assert!(!svc.is_running());
    }

    #[test]
    fn stop_before_start_is_not_lost() {
        let mut svc = AppService::new(AppConfig::named("Early"), Recorder(Vec::new()));
        svc.stop_handle().stop();

        let mut app = Counter {
            stop_after: 5,
            ..Counter::default()
        };
        svc.start(&mut app).unwrap();

        assert_eq!(app.setups, 1);
        assert_eq!(app.runs, 0);
        assert_eq!(app.teardowns, 1);
        assert_eq!(
            svc.sink().0.last(),
            Some(&AppEvent::Stopped {
                app: "Early".into(),
                iterations: 0
            })
        );

        // The request is consumed; the next start runs normally.
        svc.start(&mut app).unwrap();
        assert_eq!(app.runs, 5);
    }

    #[test]
    fn context_reports_name_and_iterations() {
        struct Check;
        impl App for Check {
            fn setup(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
                assert_eq!(ctx.name(), "Ctx");
                assert!(ctx.is_running());
                assert_eq!(ctx.iterations(), 0);
                Ok(())
            }
            fn run(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
                if ctx.iterations() == 2 {
                    ctx.stop();
                }
                Ok(())
            }
        }

        let mut svc = AppService::new(AppConfig::named("Ctx"), Recorder(Vec::new()));
        svc.start(&mut Check).unwrap();
        assert_eq!(svc.iterations(), 3);
    }
}
