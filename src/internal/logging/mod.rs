// src/internal/logging/mod.rs

pub mod formatter;
pub mod handler;
pub mod level;
pub mod logger;
pub mod provider;
pub mod record;
pub mod registry;

pub use formatter::{FormatError, Formatter, DEFAULT_DATEFMT, DEFAULT_FMT};
#[cfg(any(test, feature = "test-utils"))]
pub use handler::CaptureHandler;
pub use handler::{Handler, HandlerError, HandlerKind, StreamHandler};
pub use level::{Level, LevelParseError};
pub use logger::{Logger, ROOT_NAME};
pub use provider::{get_logger, LoggerOptions, LoggerProvider, DEFAULT_LEVEL};
pub use record::Record;
pub use registry::LoggerRegistry;
