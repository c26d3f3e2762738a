use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a record, ordered from least to most severe.
///
/// The numeric values follow the conventional 10-step ladder so they can be
/// rendered with `%(levelno)d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    NotSet = 0,
    Debug = 10,
    Info = 20,
    Warning = 30,
    Error = 40,
    Critical = 50,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::NotSet,
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Map a stored numeric value back to a level. Values between the steps
    /// round down to the nearest defined level.
    pub fn from_u8(value: u8) -> Level {
        match value {
            0..=9 => Level::NotSet,
            10..=19 => Level::Debug,
            20..=29 => Level::Info,
            30..=39 => Level::Warning,
            40..=49 => Level::Error,
            _ => Level::Critical,
        }
    }

    /// Upper-case name used by `%(levelname)s`.
    pub fn name(self) -> &'static str {
        match self {
            Level::NotSet => "NOTSET",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct LevelParseError(pub String);

impl FromStr for Level {
    type Err = LevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u8>() {
            return Ok(Level::from_u8(value));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "notset" => Ok(Level::NotSet),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "critical" | "fatal" => Ok(Level::Critical),
            _ => Err(LevelParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered_by_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warning);
        assert!(Level::Error < Level::Critical);
        assert_eq!(Level::Info.as_u8(), 20);
    }

    #[test]
    fn test_parse_accepts_names_aliases_and_numbers() {
        assert_eq!("INFO".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("fatal".parse::<Level>().unwrap(), Level::Critical);
        assert_eq!("40".parse::<Level>().unwrap(), Level::Error);
        assert_eq!("25".parse::<Level>().unwrap(), Level::Info);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_from_u8_round_trips_defined_levels() {
        for level in Level::ALL {
            assert_eq!(Level::from_u8(level.as_u8()), level);
        }
    }
}
