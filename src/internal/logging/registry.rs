use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::logger::Logger;

static GLOBAL: Lazy<LoggerRegistry> = Lazy::new(LoggerRegistry::new);

/// Name-to-logger map plus the root logger.
///
/// Entries are never removed. The process-wide instance lives behind
/// `LoggerRegistry::global()`; tests build their own with `new()`.
pub struct LoggerRegistry {
    root: Arc<Logger>,
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self {
            root: Arc::new(Logger::root()),
            loggers: Mutex::new(HashMap::new()),
        }
    }

    pub fn global() -> &'static LoggerRegistry {
        &GLOBAL
    }

    pub fn root(&self) -> Arc<Logger> {
        self.root.clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loggers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Look up `name`, creating it if absent. The flag is true only for the
    /// call that created the logger; lookup and insert happen under one lock.
    pub fn get_or_create(&self, name: &str) -> (Arc<Logger>, bool) {
        match self.get_or_create_with(name, |_| Ok::<(), Infallible>(())) {
            Ok(found) => found,
            Err(never) => match never {},
        }
    }

    /// Like `get_or_create`, but runs `init` on a new logger before any
    /// other caller can see it. The registry lock is held throughout, so
    /// whatever `init` attaches comes first for every caller.
    ///
    /// The logger is registered even when `init` fails; the error is
    /// returned after publishing.
    pub fn get_or_create_with<E, F>(&self, name: &str, init: F) -> Result<(Arc<Logger>, bool), E>
    where
        F: FnOnce(&Logger) -> Result<(), E>,
    {
        let mut loggers = self.loggers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(logger) = loggers.get(name) {
            return Ok((logger.clone(), false));
        }

        let parent = self.nearest_ancestor(&loggers, name);
        let logger = Arc::new(Logger::new(name, parent));
        let initialized = init(&logger);

        // Descendants created earlier skipped over this name; point them here.
        let prefix = format!("{}.", name);
        for (other_name, other) in loggers.iter() {
            if !other_name.starts_with(&prefix) {
                continue;
            }
            let skips_us = match other.parent() {
                Some(current) => {
                    Arc::ptr_eq(&current, &self.root) || !current.name().starts_with(&prefix)
                }
                None => true,
            };
            if skips_us {
                other.set_parent(logger.clone());
            }
        }

        loggers.insert(name.to_string(), logger.clone());
        debug!(logger = name, "Created logger");
        initialized.map(|()| (logger, true))
    }

    /// Same as `get_or_create` without the creation flag.
    pub fn logger(&self, name: &str) -> Arc<Logger> {
        self.get_or_create(name).0
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .loggers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn nearest_ancestor(&self, loggers: &HashMap<String, Arc<Logger>>, name: &str) -> Arc<Logger> {
        let mut prefix = name;
        while let Some(idx) = prefix.rfind('.') {
            prefix = &prefix[..idx];
            if let Some(logger) = loggers.get(prefix) {
                return logger.clone();
            }
        }
        self.root.clone()
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent_name(logger: &Logger) -> String {
        logger.parent().map(|p| p.name().to_string()).unwrap_or_default()
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = LoggerRegistry::new();
        assert!(registry.names().is_empty());
        assert_eq!(registry.root().name(), "root");
        assert!(registry.root().handlers().is_empty());
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let registry = LoggerRegistry::new();
        let (first, created_first) = registry.get_or_create("svc.a");
        let (second, created_second) = registry.get_or_create("svc.a");

        assert!(created_first);
        assert!(!created_second);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.contains("svc.a"));
        assert!(!registry.contains("svc"));
    }

    #[test]
    fn test_parent_is_nearest_existing_ancestor() {
        let registry = LoggerRegistry::new();
        registry.logger("a");
        let leaf = registry.logger("a.b.c");
        assert_eq!(parent_name(&leaf), "a");
    }

    #[test]
    fn test_intermediate_logger_adopts_existing_descendants() {
        let registry = LoggerRegistry::new();
        let leaf = registry.logger("a.b.c");
        let sibling = registry.logger("a.bc");
        assert_eq!(parent_name(&leaf), "root");

        registry.logger("a.b");
        assert_eq!(parent_name(&leaf), "a.b");
        assert_eq!(parent_name(&sibling), "root");

        registry.logger("a");
        assert_eq!(parent_name(&leaf), "a.b");
        assert_eq!(parent_name(&registry.logger("a.b")), "a");
        assert_eq!(parent_name(&sibling), "a");
    }

    #[test]
    fn test_init_runs_once_and_failed_init_still_registers() {
        let registry = LoggerRegistry::new();
        let mut calls = 0;

        let err = registry
            .get_or_create_with("svc.init", |_| {
                calls += 1;
                Err("boom")
            })
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(registry.contains("svc.init"));

        let (_, created) = registry
            .get_or_create_with("svc.init", |_| {
                calls += 1;
                Ok::<(), &str>(())
            })
            .unwrap();
        assert!(!created);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_global_registry_is_a_singleton() {
        assert!(std::ptr::eq(LoggerRegistry::global(), LoggerRegistry::global()));
    }
}
