use chrono::{DateTime, Local};
use std::thread;

use super::level::Level;

/// A single emitted message, built once per `Logger::log` call and handed
/// to every handler on the propagation path.
#[derive(Debug, Clone)]
pub struct Record {
    pub name: String,
    pub level: Level,
    pub message: String,
    pub created: DateTime<Local>,
    pub process: u32,
    pub thread: String,
    pub thread_name: String,
}

impl Record {
    pub fn new(name: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        let current = thread::current();
        Self {
            name: name.into(),
            level,
            message: message.into(),
            created: Local::now(),
            process: std::process::id(),
            thread: format!("{:?}", current.id()),
            thread_name: current.name().unwrap_or("<unnamed>").to_string(),
        }
    }

    /// Seconds since the epoch, with sub-second precision.
    pub fn created_secs(&self) -> f64 {
        self.created.timestamp_micros() as f64 / 1_000_000.0
    }

    /// Millisecond part of the creation time.
    pub fn msecs(&self) -> u32 {
        self.created.timestamp_subsec_millis()
    }
}
