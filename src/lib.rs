pub mod cli;
pub mod internal;

// Re-export commonly used types
pub use internal::config::config;
pub use internal::logging::{
    get_logger, FormatError, Formatter, Handler, HandlerError, HandlerKind, Level, Logger,
    LoggerOptions, LoggerProvider, LoggerRegistry, Record, StreamHandler, DEFAULT_FMT,
    DEFAULT_LEVEL,
};
