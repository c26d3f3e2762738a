// src/internal/diagnostics/diagnostics.rs

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::internal::config::DiagnosticsConfig;

/// `RUST_LOG` wins over the configured level.
pub fn build_filter(cfg: &DiagnosticsConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.level.clone()))
}

/// Install the global tracing subscriber for the crate's own diagnostics.
///
/// Console output goes to stderr so it never interleaves with the stdout
/// handlers of the loggers being managed.
pub fn init_diagnostics(cfg: &DiagnosticsConfig) -> anyhow::Result<()> {
    let filter = build_filter(cfg);

    let console = (!cfg.disable_console).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(cfg.color)
            .with_level(true)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
    });

    let file = match &cfg.output_path {
        Some(output_path) => {
            let log_file = create_log_file(output_path, cfg.append_to_file)?;
            Some(
                fmt::layer()
                    .with_writer(SharedFileWriter::new(log_file))
                    .with_ansi(false)
                    .with_level(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()?;

    Ok(())
}

/// Create or open log file based on configuration
fn create_log_file(path: &str, append: bool) -> anyhow::Result<fs::File> {
    let path = Path::new(path);

    // Ensure directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(append)
        .write(true)
        .truncate(!append)
        .open(path)?;

    Ok(file)
}

/// File writer shared between the subscriber's per-event writers
#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<fs::File>>,
}

impl SharedFileWriter {
    fn new(file: fs::File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

impl io::Write for SharedFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

impl<'a> fmt::MakeWriter<'a> for SharedFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
