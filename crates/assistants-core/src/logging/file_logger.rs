//! Debug log file
//!
//! A process-wide sink that appends to `assistants-debug.log` in the temp
//! directory. Useful when the host swallows stdout/stderr. Off unless
//! `ASSISTANTS_DEBUG` is `1` or `true`; `ASSISTANTS_LOG_LEVEL` sets the
//! minimum level (default `debug`).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::SystemTime;

use parking_lot::Mutex;

use super::traits::Logger;

pub const DEBUG_ENV: &str = "ASSISTANTS_DEBUG";
pub const LEVEL_ENV: &str = "ASSISTANTS_LOG_LEVEL";
const LOG_FILE_NAME: &str = "assistants-debug.log";

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO "),
            LogLevel::Warn => write!(f, "WARN "),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("Unknown log level: {}", other)),
        }
    }
}

struct Sink {
    file: Option<File>,
    min_level: LogLevel,
    enabled: bool,
}

impl Sink {
    fn from_env() -> Self {
        let enabled = std::env::var(DEBUG_ENV)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let min_level = std::env::var(LEVEL_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LogLevel::Debug);

        Self {
            file: None,
            min_level,
            enabled,
        }
    }

    fn open() -> Option<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path())
            .ok()
    }

    fn write(&mut self, level: LogLevel, module: &str, message: &str) {
        if !self.enabled || level < self.min_level {
            return;
        }
        if self.file.is_none() {
            self.file = Self::open();
        }
        if let Some(file) = self.file.as_mut() {
            // Write failures are dropped; there is nowhere else to report them
            let _ = writeln!(file, "[{}] [{}] [{}] {}", timestamp(), level, module, message);
            let _ = file.flush();
        }
    }
}

/// Wall-clock time of day in UTC, `HH:MM:SS.mmm`
fn timestamp() -> String {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs();
            format!(
                "{:02}:{:02}:{:02}.{:03}",
                (secs % 86400) / 3600,
                (secs % 3600) / 60,
                secs % 60,
                d.subsec_millis()
            )
        })
        .unwrap_or_else(|_| "??:??:??.???".to_string())
}

static SINK: OnceLock<Mutex<Sink>> = OnceLock::new();

fn sink() -> &'static Mutex<Sink> {
    SINK.get_or_init(|| Mutex::new(Sink::from_env()))
}

/// Log a message at the specified level
pub fn log(level: LogLevel, module: &str, message: &str) {
    sink().lock().write(level, module, message);
}

pub fn trace(module: &str, message: &str) {
    log(LogLevel::Trace, module, message);
}

pub fn debug(module: &str, message: &str) {
    log(LogLevel::Debug, module, message);
}

pub fn info(module: &str, message: &str) {
    log(LogLevel::Info, module, message);
}

pub fn warn(module: &str, message: &str) {
    log(LogLevel::Warn, module, message);
}

pub fn error(module: &str, message: &str) {
    log(LogLevel::Error, module, message);
}

/// Turn the file log on or off at runtime, overriding the environment
pub fn set_enabled(enabled: bool) {
    sink().lock().enabled = enabled;
}

pub fn set_min_level(level: LogLevel) {
    sink().lock().min_level = level;
}

pub fn is_enabled() -> bool {
    sink().lock().enabled
}

/// Get the path to the log file
pub fn log_file_path() -> PathBuf {
    std::env::temp_dir().join(LOG_FILE_NAME)
}

/// Truncate the log file
pub fn clear_log() {
    let mut sink = sink().lock();
    sink.file = None;
    if File::create(log_file_path()).is_ok() {
        sink.file = Sink::open();
    }
}

/// [`Logger`] adapter over the debug log file, tagged with a component name
#[derive(Debug, Clone)]
pub struct FileLogger {
    component: String,
}

impl FileLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }
}

impl Logger for FileLogger {
    fn debug(&self, message: &str) {
        debug(&self.component, message);
    }

    fn info(&self, message: &str) {
        info(&self.component, message);
    }

    fn warn(&self, message: &str) {
        warn(&self.component, message);
    }

    fn error(&self, message: &str) {
        error(&self.component, message);
    }
}
