//! Process signals to a graceful stop.
//!
//! SIGINT (Ctrl-C) and SIGTERM clear the running flag through a
//! [`StopHandle`], so the lifecycle leaves its loop and `teardown`
//! releases the hardware. The handler lives on its own thread with a
//! single-threaded tokio runtime, the same way the web server does.

use std::sync::mpsc;
use std::thread;

use log::{error, info};

use crate::app::service::StopHandle;
use crate::error::{Error, Result};

/// Install the handler. Returns once the signals are registered.
pub fn stop_on_signal(handle: StopHandle) -> Result<()> {
    let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

    thread::Builder::new()
        .name("signals".into())
        .spawn(move || watch(handle, ready_tx))
        .map_err(|e| {
            error!("Signals: thread spawn failed: {}", e);
            Error::Init("signal handler thread")
        })?;

    ready_rx
        .recv()
        .unwrap_or(Err(Error::Init("signal handler")))
}

fn watch(handle: StopHandle, ready: mpsc::Sender<Result<()>>) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Signals: runtime init failed: {}", e);
            let _ = ready.send(Err(Error::Init("signal handler runtime")));
            return;
        }
    };
    rt.block_on(relay(handle, ready));
}

#[cfg(unix)]
async fn relay(handle: StopHandle, ready: mpsc::Sender<Result<()>>) {
    use tokio::signal::unix::{SignalKind, signal};

    let streams = signal(SignalKind::interrupt()).and_then(|int| {
        let term = signal(SignalKind::terminate())?;
        Ok((int, term))
    });
    let (mut int, mut term) = match streams {
        Ok(s) => s,
        Err(e) => {
            error!("Signals: registration failed: {}", e);
            let _ = ready.send(Err(Error::Init("signal handler")));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    loop {
        let name = tokio::select! {
            _ = int.recv() => "SIGINT",
            _ = term.recv() => "SIGTERM",
        };
        info!("Signals: {} received, stopping", name);
        handle.stop();
    }
}

#[cfg(not(unix))]
async fn relay(handle: StopHandle, ready: mpsc::Sender<Result<()>>) {
    let _ = ready.send(Ok(()));
    while tokio::signal::ctrl_c().await.is_ok() {
        info!("Signals: Ctrl-C received, stopping");
        handle.stop();
    }
}
