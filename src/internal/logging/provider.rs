use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::formatter::{FormatError, Formatter, DEFAULT_FMT};
use super::handler::{Handler, StreamHandler};
use super::level::Level;
use super::logger::Logger;
use super::registry::LoggerRegistry;

/// Threshold applied to every named logger handed out by the provider.
pub const DEFAULT_LEVEL: Level = Level::Info;

/// Per-call settings for `LoggerProvider::get_logger`.
#[derive(Clone)]
pub struct LoggerOptions {
    /// Template for the console handler; only used when the name is new.
    pub fmt: String,
    pub datefmt: Option<String>,
    /// Extra handler appended on every call that supplies one.
    pub handler: Option<Arc<dyn Handler>>,
}

impl LoggerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fmt(mut self, fmt: impl Into<String>) -> Self {
        self.fmt = fmt.into();
        self
    }

    pub fn with_datefmt(mut self, datefmt: impl Into<String>) -> Self {
        self.datefmt = Some(datefmt.into());
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = Some(handler);
        self
    }
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            fmt: DEFAULT_FMT.to_string(),
            datefmt: None,
            handler: None,
        }
    }
}

impl fmt::Debug for LoggerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerOptions")
            .field("fmt", &self.fmt)
            .field("datefmt", &self.datefmt)
            .field("handler", &self.handler.as_ref().map(|h| h.kind()))
            .finish()
    }
}

/// Hands out configured loggers from a registry.
#[derive(Clone, Copy)]
pub struct LoggerProvider<'r> {
    registry: &'r LoggerRegistry,
}

impl<'r> LoggerProvider<'r> {
    pub fn new(registry: &'r LoggerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r LoggerRegistry {
        self.registry
    }

    /// Get the logger for `name`, or the root logger when `name` is `None`.
    ///
    /// A named logger is reset to `DEFAULT_LEVEL` with propagation off on
    /// every call. The first call that sees a name attaches a stdout handler
    /// built from `options.fmt` and `options.datefmt`; later calls never add
    /// another. The root logger is returned as-is. In both cases
    /// `options.handler` is appended when present.
    ///
    /// The console handler is attached before the new logger is published
    /// in the registry, so concurrent first calls see exactly one console
    /// handler and always at the front of the list.
    ///
    /// Only `None` selects the root logger. The names `"root"` and `""` are
    /// ordinary loggers here and get their own console handler.
    ///
    /// Fails only when the console formatter cannot be built. The logger is
    /// registered by then, so a later call for the same name will not retry
    /// the console handler.
    pub fn get_logger(
        &self,
        name: Option<&str>,
        options: LoggerOptions,
    ) -> Result<Arc<Logger>, FormatError> {
        let logger = match name {
            None => self.registry.root(),
            Some(name) => {
                let (logger, _) = self.registry.get_or_create_with(name, |logger| {
                    logger.set_propagate(false);
                    logger.set_level(DEFAULT_LEVEL);
                    let formatter = Formatter::new(&options.fmt, options.datefmt.as_deref())?;
                    logger.add_handler(Arc::new(StreamHandler::stdout(formatter)));
                    debug!(logger = name, fmt = %options.fmt, "Attached console handler");
                    Ok(())
                })?;
                logger.set_propagate(false);
                logger.set_level(DEFAULT_LEVEL);
                logger
            }
        };

        if let Some(handler) = options.handler {
            debug!(logger = logger.name(), kind = ?handler.kind(), "Attached extra handler");
            logger.add_handler(handler);
        }

        Ok(logger)
    }
}

impl LoggerProvider<'static> {
    pub fn global() -> Self {
        Self::new(LoggerRegistry::global())
    }
}

/// `LoggerProvider::get_logger` against the process-wide registry.
pub fn get_logger(name: Option<&str>, options: LoggerOptions) -> Result<Arc<Logger>, FormatError> {
    LoggerProvider::global().get_logger(name, options)
}
