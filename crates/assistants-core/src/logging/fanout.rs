//! Logger that forwards to several sinks

use super::traits::{Logger, SharedLogger};

/// Sends every message to each wrapped logger, in order
///
/// The demo uses it to mirror console output into the debug log file.
#[derive(Clone, Default)]
pub struct FanoutLogger {
    sinks: Vec<SharedLogger>,
}

impl FanoutLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: SharedLogger) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Logger for FanoutLogger {
    fn debug(&self, message: &str) {
        self.sinks.iter().for_each(|sink| sink.debug(message));
    }

    fn info(&self, message: &str) {
        self.sinks.iter().for_each(|sink| sink.info(message));
    }

    fn warn(&self, message: &str) {
        self.sinks.iter().for_each(|sink| sink.warn(message));
    }

    fn error(&self, message: &str) {
        self.sinks.iter().for_each(|sink| sink.error(message));
    }
}

impl std::fmt::Debug for FanoutLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutLogger")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl Logger for Recorder {
        fn debug(&self, message: &str) {
            self.lines.lock().push(format!("debug {}", message));
        }

        fn info(&self, message: &str) {
            self.lines.lock().push(format!("info {}", message));
        }

        fn warn(&self, message: &str) {
            self.lines.lock().push(format!("warn {}", message));
        }

        fn error(&self, message: &str) {
            self.lines.lock().push(format!("error {}", message));
        }
    }

    #[test]
    fn test_every_sink_receives_every_message() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let logger = FanoutLogger::new().with(first.clone()).with(second.clone());
        assert_eq!(logger.len(), 2);

        logger.info("[Session] Agent agent is present");
        crate::log_warn!(logger, "[Session] Teardown: {}", "boom");

        let expected = vec![
            "info [Session] Agent agent is present".to_string(),
            "warn [Session] Teardown: boom".to_string(),
        ];
        assert_eq!(*first.lines.lock(), expected);
        assert_eq!(*second.lines.lock(), expected);
    }

    #[test]
    fn test_empty_fanout_is_silent() {
        let logger = FanoutLogger::new();
        assert!(logger.is_empty());
        logger.error("dropped");
    }
}
