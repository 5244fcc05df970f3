//! Logging abstractions
//!
//! Components take an `Arc<dyn Logger>` and prefix messages with their name,
//! e.g. `[Session] Agent agent-1 is present`.

mod traits;
mod noop;
mod console;
mod fanout;
pub mod file_logger;

pub use traits::{Logger, LoggerExt, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use fanout::FanoutLogger;

pub use file_logger::{log_file_path, clear_log, FileLogger, LogLevel};
