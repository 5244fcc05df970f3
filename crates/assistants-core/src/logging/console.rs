//! Console logger implementation

use super::traits::Logger;

/// A logger that outputs to the console (stdout/stderr)
///
/// Debug output is suppressed unless the logger is verbose.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    verbose: bool,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    /// Create a new console logger with default prefix
    pub fn new() -> Self {
        Self::with_prefix("[Assistants]")
    }

    /// Create a console logger with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        if self.verbose {
            eprintln!("{} DEBUG: {}", self.prefix, message);
        }
    }

    fn info(&self, message: &str) {
        println!("{} INFO: {}", self.prefix, message);
    }

    fn warn(&self, message: &str) {
        eprintln!("{} WARN: {}", self.prefix, message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} ERROR: {}", self.prefix, message);
    }
}
