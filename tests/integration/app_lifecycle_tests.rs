//! Lifecycle: setup once, run until stopped, teardown, events in order.

use std::thread;
use std::time::Duration;

use anyhow::bail;
use rpi_app_framework::app::events::{AppEvent, Stage};
use rpi_app_framework::app::service::{App, AppContext, AppService};
use rpi_app_framework::config::AppConfig;

use crate::mock_hw::RecordingSink;

#[derive(Default)]
struct Scripted {
    fail_setup: bool,
    fail_run_at: Option<u32>,
    fail_teardown: bool,
    runs: u32,
    teardowns: u32,
}

impl App for Scripted {
    fn setup(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        ctx.log("setup");
        if self.fail_setup {
            bail!("sensor missing");
        }
        Ok(())
    }

    fn run(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
        self.runs += 1;
        if Some(self.runs) == self.fail_run_at {
            bail!("bus error");
        }
        thread::sleep(Duration::from_millis(1));
        Ok(())
    }

    fn teardown(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
        self.teardowns += 1;
        if self.fail_teardown {
            bail!("pin stuck");
        }
        Ok(())
    }
}

fn service(name: &str) -> AppService<RecordingSink> {
    AppService::new(AppConfig::named(name), RecordingSink::new())
}

#[test]
fn setup_fault_skips_run_and_still_tears_down() {
    let mut svc = service("Broken");
    let mut app = Scripted {
        fail_setup: true,
        ..Scripted::default()
    };

    let err = svc.start(&mut app).unwrap_err();

    assert!(err.to_string().contains("sensor missing"));
    assert_eq!(app.runs, 0);
    assert_eq!(app.teardowns, 1);
    assert!(!svc.is_running());
    assert_eq!(
        svc.sink().events,
        vec![
            AppEvent::Started {
                app: "Broken".into()
            },
            AppEvent::Fault {
                app: "Broken".into(),
                stage: Stage::Setup,
                reason: "sensor missing".into()
            },
        ]
    );
}

#[test]
fn run_fault_stops_the_loop() {
    let mut svc = service("Flaky");
    let mut app = Scripted {
        fail_run_at: Some(3),
        ..Scripted::default()
    };

    assert!(svc.start(&mut app).is_err());

    assert_eq!(app.runs, 3);
    assert_eq!(svc.iterations(), 2);
    assert_eq!(app.teardowns, 1);
    assert!(matches!(
        svc.sink().events.last(),
        Some(AppEvent::Fault {
            stage: Stage::Run,
            ..
        })
    ));
}

#[test]
fn stop_handle_ends_the_loop_from_another_thread() {
    let mut svc = service("Remote");
    let handle = svc.stop_handle();
    let mut app = Scripted::default();

    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        handle.stop();
    });
    svc.start(&mut app).unwrap();
    stopper.join().unwrap();

    assert!(app.runs > 0);
    assert_eq!(app.teardowns, 1);
    assert_eq!(
        svc.sink().events.last(),
        Some(&AppEvent::Stopped {
            app: "Remote".into(),
            iterations: u64::from(app.runs)
        })
    );
}

#[test]
fn teardown_failure_is_reported() {
    let mut svc = service("Sticky");
    let handle = svc.stop_handle();
    let mut app = Scripted {
        fail_teardown: true,
        ..Scripted::default()
    };

    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        handle.stop();
    });
    let err = svc.start(&mut app).unwrap_err();
    stopper.join().unwrap();

    assert!(err.to_string().contains("pin stuck"));
    assert!(matches!(
        svc.sink().events.last(),
        Some(AppEvent::Fault {
            stage: Stage::Teardown,
            ..
        })
    ));
}

#[test]
fn loop_interval_paces_iterations() {
    struct Three;
    impl App for Three {
        fn setup(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
            Ok(())
        }
        fn run(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
            if ctx.iterations() == 2 {
                ctx.stop();
            }
            Ok(())
        }
    }

    let cfg = AppConfig {
        loop_interval_ms: 20,
        ..AppConfig::named("Paced")
    };
    let mut svc = AppService::new(cfg, RecordingSink::new());
    let started = std::time::Instant::now();
    svc.start(&mut Three).unwrap();

    assert_eq!(svc.iterations(), 3);
    // Two pauses; none after the iteration that stopped the loop.
    assert!(started.elapsed() >= Duration::from_millis(40));
}
