use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use super::handler::Handler;
use super::level::Level;
use super::record::Record;

pub const ROOT_NAME: &str = "root";

/// A named logger: a level threshold, a propagation flag and an ordered
/// list of handlers. Instances are created and owned by a `LoggerRegistry`.
pub struct Logger {
    name: String,
    level: AtomicU8,
    propagate: AtomicBool,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
    parent: RwLock<Option<Arc<Logger>>>,
}

impl Logger {
    pub(crate) fn new(name: &str, parent: Arc<Logger>) -> Self {
        Self {
            name: name.to_string(),
            level: AtomicU8::new(Level::NotSet.as_u8()),
            propagate: AtomicBool::new(true),
            handlers: RwLock::new(Vec::new()),
            parent: RwLock::new(Some(parent)),
        }
    }

    pub(crate) fn root() -> Self {
        Self {
            name: ROOT_NAME.to_string(),
            level: AtomicU8::new(Level::Warning.as_u8()),
            propagate: AtomicBool::new(true),
            handlers: RwLock::new(Vec::new()),
            parent: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    /// First level that is not `NotSet` walking up from this logger.
    pub fn effective_level(&self) -> Level {
        let level = self.level();
        if level != Level::NotSet {
            return level;
        }
        let mut next = self.parent();
        while let Some(logger) = next {
            let level = logger.level();
            if level != Level::NotSet {
                return level;
            }
            next = logger.parent();
        }
        Level::NotSet
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        level >= self.effective_level()
    }

    pub fn propagate(&self) -> bool {
        self.propagate.load(Ordering::Relaxed)
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.propagate.store(propagate, Ordering::Relaxed);
    }

    pub fn parent(&self) -> Option<Arc<Logger>> {
        self.parent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_parent(&self, parent: Arc<Logger>) {
        *self.parent.write().unwrap_or_else(PoisonError::into_inner) = Some(parent);
    }

    /// Append a handler. Handlers run in insertion order; the same handler
    /// may be attached more than once.
    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    /// Remove every attachment of `handler`. Returns whether any was found.
    pub fn remove_handler(&self, handler: &Arc<dyn Handler>) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|h| !Arc::ptr_eq(h, handler));
        handlers.len() != before
    }

    /// Snapshot of the attached handlers, in invocation order.
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a record emitted here would reach any handler.
    pub fn has_handlers(&self) -> bool {
        if !self.handlers().is_empty() {
            return true;
        }
        let mut propagate = self.propagate();
        let mut next = self.parent();
        while propagate {
            let Some(logger) = next else { break };
            if !logger.handlers().is_empty() {
                return true;
            }
            propagate = logger.propagate();
            next = logger.parent();
        }
        false
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        if !self.is_enabled_for(level) {
            return;
        }
        let record = Record::new(self.name.as_str(), level, message);
        self.call_handlers(&record);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn critical(&self, message: impl Into<String>) {
        self.log(Level::Critical, message);
    }

    /// Flush every handler attached directly to this logger.
    pub fn flush(&self) {
        for handler in self.handlers() {
            if let Err(e) = handler.flush() {
                warn!(logger = %self.name, error = %e, "Failed to flush handler");
            }
        }
    }

    fn call_handlers(&self, record: &Record) {
        let mut found = self.dispatch(record);
        let mut propagate = self.propagate();
        let mut next = self.parent();
        while propagate {
            let Some(logger) = next else { break };
            found += logger.dispatch(record);
            propagate = logger.propagate();
            next = logger.parent();
        }

        // Nothing on the path: fall back to a bare stderr line for warnings and up.
        if found == 0 && record.level >= Level::Warning {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{}", record.message);
        }
    }

    fn dispatch(&self, record: &Record) -> usize {
        let handlers = self.handlers();
        for handler in &handlers {
            if record.level < handler.level() {
                continue;
            }
            if let Err(e) = handler.handle(record) {
                warn!(logger = %self.name, error = %e, "Handler failed to emit record");
            }
        }
        handlers.len()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("propagate", &self.propagate())
            .field("handlers", &self.handlers().len())
            .finish()
    }
}
