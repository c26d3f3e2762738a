use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};

use super::formatter::Formatter;
use super::level::Level;
use super::record::Record;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("handler rejected record: {0}")]
    Rejected(String),
}

/// What a handler writes to. Used to tell the provider's console handler
/// apart from caller-supplied ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Stdout,
    Stderr,
    Writer,
    Capture,
    Custom,
}

/// Output destination for records.
pub trait Handler: Send + Sync {
    /// Format and write one record.
    fn handle(&self, record: &Record) -> Result<(), HandlerError>;

    /// Records below this level are skipped for this handler only.
    fn level(&self) -> Level {
        Level::NotSet
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Custom
    }

    fn flush(&self) -> Result<(), HandlerError> {
        Ok(())
    }
}

enum StreamTarget {
    Stdout,
    Stderr,
    Writer(Mutex<Box<dyn Write + Send>>),
}

/// Writes one formatted line per record and flushes after each write.
pub struct StreamHandler {
    target: StreamTarget,
    formatter: Formatter,
    level: AtomicU8,
}

impl StreamHandler {
    pub fn stdout(formatter: Formatter) -> Self {
        Self::with_target(StreamTarget::Stdout, formatter)
    }

    pub fn stderr(formatter: Formatter) -> Self {
        Self::with_target(StreamTarget::Stderr, formatter)
    }

    pub fn with_writer<W>(writer: W, formatter: Formatter) -> Self
    where
        W: Write + Send + 'static,
    {
        Self::with_target(StreamTarget::Writer(Mutex::new(Box::new(writer))), formatter)
    }

    fn with_target(target: StreamTarget, formatter: Formatter) -> Self {
        Self {
            target,
            formatter,
            level: AtomicU8::new(Level::NotSet.as_u8()),
        }
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        match &self.target {
            StreamTarget::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{}", line)?;
                out.flush()
            }
            StreamTarget::Stderr => {
                let mut out = io::stderr().lock();
                writeln!(out, "{}", line)?;
                out.flush()
            }
            StreamTarget::Writer(writer) => {
                let mut out = writer.lock().unwrap_or_else(PoisonError::into_inner);
                writeln!(out, "{}", line)?;
                out.flush()
            }
        }
    }
}

impl Handler for StreamHandler {
    fn handle(&self, record: &Record) -> Result<(), HandlerError> {
        let line = self.formatter.format(record);
        self.write_line(&line)?;
        Ok(())
    }

    fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    fn kind(&self) -> HandlerKind {
        match self.target {
            StreamTarget::Stdout => HandlerKind::Stdout,
            StreamTarget::Stderr => HandlerKind::Stderr,
            StreamTarget::Writer(_) => HandlerKind::Writer,
        }
    }

    fn flush(&self) -> Result<(), HandlerError> {
        match &self.target {
            StreamTarget::Stdout => io::stdout().flush()?,
            StreamTarget::Stderr => io::stderr().flush()?,
            StreamTarget::Writer(writer) => writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .flush()?,
        }
        Ok(())
    }
}

/// Handler that keeps formatted lines in memory - for tests
#[cfg(any(test, feature = "test-utils"))]
pub struct CaptureHandler {
    formatter: Formatter,
    lines: Mutex<Vec<String>>,
    level: AtomicU8,
}

#[cfg(any(test, feature = "test-utils"))]
impl CaptureHandler {
    pub fn new() -> Self {
        Self::with_formatter(Formatter::default())
    }

    pub fn with_formatter(formatter: Formatter) -> Self {
        Self {
            formatter,
            lines: Mutex::new(Vec::new()),
            level: AtomicU8::new(Level::NotSet.as_u8()),
        }
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    /// Get all captured lines
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for CaptureHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Handler for CaptureHandler {
    fn handle(&self, record: &Record) -> Result<(), HandlerError> {
        let line = self.formatter.format(record);
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
        Ok(())
    }

    fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Capture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stream_handler_writes_one_line_per_record() {
        let buffer = SharedBuffer::default();
        let formatter = Formatter::new("%(levelname)s:%(message)s", None).unwrap();
        let handler = StreamHandler::with_writer(buffer.clone(), formatter);

        handler.handle(&Record::new("a", Level::Info, "one")).unwrap();
        handler.handle(&Record::new("a", Level::Error, "two")).unwrap();

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written, "INFO:one\nERROR:two\n");
        assert_eq!(handler.kind(), HandlerKind::Writer);
    }

    #[test]
    fn test_stdout_handler_reports_stdout_kind() {
        let handler = StreamHandler::stdout(Formatter::default());
        assert_eq!(handler.kind(), HandlerKind::Stdout);
        assert_eq!(handler.level(), Level::NotSet);
        handler.set_level(Level::Warning);
        assert_eq!(handler.level(), Level::Warning);
    }

    #[test]
    fn test_capture_handler_records_formatted_lines() {
        let handler = CaptureHandler::new();
        handler.handle(&Record::new("a", Level::Info, "kept")).unwrap();
        assert_eq!(handler.lines(), vec!["kept".to_string()]);
        assert_eq!(handler.kind(), HandlerKind::Capture);
    }
}
