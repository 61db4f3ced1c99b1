//! Rotating file logger behind the `log` facade.
//!
//! Every process start opens a fresh file `<app>_<YYYYmmdd_HHMMSS>.log`
//! in the log directory and deletes the oldest files of the same
//! application so that at most `max_files` remain. Records are appended
//! as
//!
//! ```text
//! 2025-01-31 14:02:07 [INFO] rpi_app_framework::app::service: MyApp: starting
//! ```
//!
//! and flushed immediately, so the file survives an abrupt power cut up
//! to the last complete line.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record, error, info, warn};

use crate::config::LogConfig;
use crate::error::{Error, Result};

pub struct RotatingFileLogger {
    level: LevelFilter,
    echo_stderr: bool,
    path: PathBuf,
    file: Mutex<File>,
}

impl RotatingFileLogger {
    /// Create the directory, open a new file and prune old ones.
    pub fn open(dir: &Path, app_name: &str, max_files: usize, level: LevelFilter) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|_| Error::Log("cannot create log directory"))?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let (path, file) = create_unique(dir, app_name, &stamp)?;
        prune(dir, app_name, max_files.max(1), &path);

        Ok(Self {
            level,
            echo_stderr: false,
            path,
            file: Mutex::new(file),
        })
    }

    pub fn with_stderr_echo(mut self, echo: bool) -> Self {
        self.echo_stderr = echo;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }
}

impl Log for RotatingFileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "{} [{}] {}: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        );

        {
            let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
            // A full disk must not take the application down with it.
            let _ = file.write_all(line.as_bytes()).and_then(|()| file.flush());
        }
        if self.echo_stderr {
            eprint!("{line}");
        }
    }

    fn flush(&self) {
        let _ = self
            .file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush();
    }
}

fn create_unique(dir: &Path, app_name: &str, stamp: &str) -> Result<(PathBuf, File)> {
    for n in 0..100u32 {
        let name = if n == 0 {
            format!("{app_name}_{stamp}.log")
        } else {
            format!("{app_name}_{stamp}_{n}.log")
        };
        let path = dir.join(name);
        match OpenOptions::new().append(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(_) => return Err(Error::Log("cannot open log file")),
        }
    }
    Err(Error::Log("no free log file name"))
}

/// Sort key of `<app>_<YYYYmmdd>_<HHMMSS>[_<n>].log`: timestamp, then suffix.
fn rotation_key(file_name: &str, app_name: &str) -> Option<(u64, u32)> {
    let stem = file_name
        .strip_prefix(app_name)?
        .strip_prefix('_')?
        .strip_suffix(".log")?;
    let b = stem.as_bytes();
    if b.len() < 15 || b[8] != b'_' {
        return None;
    }
    let digits = |s: &[u8]| !s.is_empty() && s.iter().all(u8::is_ascii_digit);
    if !digits(&b[..8]) || !digits(&b[9..15]) {
        return None;
    }
    let stamp = format!("{}{}", &stem[..8], &stem[9..15]).parse().ok()?;
    let suffix = match &stem[15..] {
        "" => 0,
        rest => {
            let n = rest.strip_prefix('_')?;
            if !digits(n.as_bytes()) {
                return None;
            }
            n.parse().ok()?
        }
    };
    Some((stamp, suffix))
}

/// Delete the oldest files of `app_name` until `keep` remain, counting
/// `current`. `current` itself is never deleted, even when an unsynced
/// clock makes older runs look newer.
fn prune(dir: &Path, app_name: &str, keep: usize, current: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut files: Vec<((u64, u32), PathBuf)> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p != current)
        .filter_map(|p| {
            let key = rotation_key(p.file_name()?.to_str()?, app_name)?;
            Some((key, p))
        })
        .collect();
    let others = keep.saturating_sub(1);
    if files.len() <= others {
        return;
    }
    files.sort();
    let excess = files.len() - others;
    for (_, old) in &files[..excess] {
        if let Err(e) = fs::remove_file(old) {
            eprintln!("logging: cannot remove {}: {}", old.display(), e);
        }
    }
}

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the rotating logger as the global `log` sink.
///
/// Returns the path of the new log file. Disabled logging returns
/// `Ok(None)`. If another logger already owns the facade it is kept,
/// a warning goes through it and `Ok(None)` is returned.
pub fn init(cfg: &LogConfig, app_name: &str) -> Result<Option<PathBuf>> {
    if !cfg.enabled {
        return Ok(None);
    }
    if INSTALLED.load(Ordering::Acquire) {
        warn!("Logging: a logger is already installed, keeping it");
        return Ok(None);
    }
    let parsed = cfg.level.parse::<LevelFilter>();
    let level = parsed.as_ref().map_or(LevelFilter::Info, |l| *l);
    let logger = RotatingFileLogger::open(&cfg.dir, app_name, cfg.max_files, level)?
        .with_stderr_echo(cfg.echo_stderr);
    let path = logger.path().to_owned();

    match log::set_boxed_logger(Box::new(logger)) {
        Ok(()) => {
            INSTALLED.store(true, Ordering::Release);
            log::set_max_level(level);
            if parsed.is_err() {
                warn!("Logging: unknown level '{}', using info", cfg.level);
            }
            info!("Logging to {}", path.display());
            Ok(Some(path))
        }
        Err(_) => {
            warn!("Logging: a logger is already installed, keeping it");
            let _ = fs::remove_file(&path);
            Ok(None)
        }
    }
}

/// Route panics through the logger before the default hook runs.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        match info.location() {
            Some(loc) => error!("PANIC: {} at {}:{}", reason, loc.file(), loc.line()),
            None => error!("PANIC: {}", reason),
        }
        log::logger().flush();
        default_hook(info);
    }));
}
