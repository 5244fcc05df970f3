//! Logger trait definition

use std::fmt;
use std::sync::Arc;

use super::file_logger::LogLevel;

/// Sink for the crate's diagnostic messages
///
/// Components hold a [`SharedLogger`] and prefix messages with their name,
/// e.g. `[ToolRelay] Bound handler for get_weather`. Hosts plug in their own
/// implementation to route messages wherever they already log.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    /// Dispatch on a runtime level. `Trace` goes to `debug`.
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace | LogLevel::Debug => self.debug(message),
            LogLevel::Info => self.info(message),
            LogLevel::Warn => self.warn(message),
            LogLevel::Error => self.error(message),
        }
    }
}

pub type SharedLogger = Arc<dyn Logger>;

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn debug(&self, message: &str) {
        (**self).debug(message)
    }

    fn info(&self, message: &str) {
        (**self).info(message)
    }

    fn warn(&self, message: &str) {
        (**self).warn(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }
}

/// Formatting helpers so call sites can skip building a `String` by hand
pub trait LoggerExt: Logger {
    fn log_fmt(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        match args.as_str() {
            Some(message) => self.log(level, message),
            None => self.log(level, &args.to_string()),
        }
    }

    fn debug_fmt(&self, args: fmt::Arguments<'_>) {
        self.log_fmt(LogLevel::Debug, args);
    }

    fn info_fmt(&self, args: fmt::Arguments<'_>) {
        self.log_fmt(LogLevel::Info, args);
    }

    fn warn_fmt(&self, args: fmt::Arguments<'_>) {
        self.log_fmt(LogLevel::Warn, args);
    }

    fn error_fmt(&self, args: fmt::Arguments<'_>) {
        self.log_fmt(LogLevel::Error, args);
    }
}

impl<T: Logger + ?Sized> LoggerExt for T {}

/// `log_info!(logger, "[Component] {}", value)`
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $crate::logging::LoggerExt::debug_fmt(&$logger, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $crate::logging::LoggerExt::info_fmt(&$logger, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $crate::logging::LoggerExt::warn_fmt(&$logger, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $crate::logging::LoggerExt::error_fmt(&$logger, format_args!($($arg)*))
    };
}
