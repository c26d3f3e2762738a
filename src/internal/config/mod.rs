pub mod config;

pub use self::config::{
    get_version_info, AppConfig, DiagnosticsConfig, LoggerConfig, DEFAULT_LOGGER_NAME, VERSION,
};
