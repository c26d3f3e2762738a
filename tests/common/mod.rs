//! Shared helpers for logger provider tests

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use named_logger::{Handler, HandlerError, HandlerKind, Record};

/// Handler that keeps "LEVEL:message" for every record it receives, in order
#[derive(Default)]
pub struct RecordingHandler {
    messages: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Handler for RecordingHandler {
    fn handle(&self, record: &Record) -> Result<(), HandlerError> {
        self.messages
            .lock()
            .unwrap()
            .push(format!("{}:{}", record.level, record.message));
        Ok(())
    }
}

/// Writer whose clones share one buffer
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Number of stdout handlers, i.e. provider-attached console handlers
pub fn console_handlers(handlers: &[Arc<dyn Handler>]) -> usize {
    handlers
        .iter()
        .filter(|h| h.kind() == HandlerKind::Stdout)
        .count()
}
