use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::internal::logging::{Formatter, LoggerOptions, DEFAULT_FMT};

// Version information from build script - using option_env! for safety
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logger name used when neither config nor CLI provide one.
pub const DEFAULT_LOGGER_NAME: &str = "named_logger";

/// Get version information
pub fn get_version_info() -> String {
    let build_timestamp = option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown");
    let build_date = option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown");
    let rustc_semver = option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown");
    let cargo_target_triple = option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown");

    format!(
        "named-logger version {}\n\
         Built: {} ({})\n\
         Rust: {}\n\
         Target: {}",
        VERSION, build_date, build_timestamp, rustc_semver, cargo_target_triple
    )
}

/// Settings for the logger the binary hands out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    #[serde(default = "default_logger_name")]
    pub name: String,
    #[serde(default = "default_fmt")]
    pub fmt: String,
    #[serde(default)]
    pub datefmt: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: default_logger_name(),
            fmt: default_fmt(),
            datefmt: None,
        }
    }
}

impl LoggerConfig {
    pub fn options(&self) -> LoggerOptions {
        let options = LoggerOptions::new().with_fmt(self.fmt.clone());
        match &self.datefmt {
            Some(datefmt) => options.with_datefmt(datefmt.clone()),
            None => options,
        }
    }
}

/// The crate's own tracing output, separate from the loggers it manages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_diagnostics_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub append_to_file: bool,
    #[serde(default)]
    pub disable_console: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            level: default_diagnostics_level(),
            color: true,
            output_path: None,
            append_to_file: false,
            disable_console: false,
        }
    }
}

fn default_logger_name() -> String {
    DEFAULT_LOGGER_NAME.to_string()
}
fn default_fmt() -> String {
    DEFAULT_FMT.to_string()
}
fn default_diagnostics_level() -> String {
    "warn".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl AppConfig {
    /// Load from the default file locations and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like `load`, with `path` layered on top of the default files.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Start with default values
            .set_default("logger.name", DEFAULT_LOGGER_NAME)?
            .set_default("logger.fmt", DEFAULT_FMT)?
            .set_default("diagnostics.level", "warn")?
            .set_default("diagnostics.color", true)?
            // Load config files in order of precedence
            .add_source(File::with_name("named-logger").required(false))
            .add_source(File::with_name("/etc/named-logger/config").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Environment variables, e.g. NAMED_LOGGER_LOGGER__DATEFMT
        builder = builder.add_source(
            Environment::with_prefix("NAMED_LOGGER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder.build()?.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject templates the console handler would fail to build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logger.name.is_empty() {
            return Err(ConfigError::Message("logger name must not be empty".to_string()));
        }
        Formatter::new(&self.logger.fmt, self.logger.datefmt.as_deref())
            .map_err(|e| ConfigError::Message(format!("logger format: {}", e)))?;
        Ok(())
    }
}
