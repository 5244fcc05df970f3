//! Silent logger

use super::traits::Logger;

/// Discards every message. The default for sessions, relays and transports
/// built without an explicit logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl NoOpLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for NoOpLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::logging::{LogLevel, SharedLogger};

    #[test]
    fn test_noop_logger_as_shared() {
        let logger: SharedLogger = Arc::new(NoOpLogger::new());
        logger.log(LogLevel::Trace, "trace");
        crate::log_info!(logger, "[Test] {} {}", "formatted", 1);
        crate::log_error!(NoOpLogger, "[Test] plain");
    }
}
