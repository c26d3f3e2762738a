use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use crate::internal::config::AppConfig;
use crate::internal::logging::Level;

/// Everything the binary needs after argument and config resolution.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub config: AppConfig,
    /// Use the root logger instead of `config.logger.name`.
    pub root: bool,
    pub level: Level,
    pub repeat: u32,
    pub message: String,
}

pub fn build_cli() -> Command {
    // Leak the version string to get a 'static lifetime
    let version: &'static str =
        Box::leak(crate::internal::config::get_version_info().into_boxed_str());

    Command::new("named-logger")
        .version(version)
        .about("Emit a message through a named logger with a deduplicated console handler")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to config file (default: ./named-logger.*, /etc/named-logger/config.*)"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .short('n')
                .conflicts_with("root")
                .help("Logger name (overrides config)"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .action(ArgAction::SetTrue)
                .help("Use the root logger; it is returned without a console handler"),
        )
        .arg(
            Arg::new("level")
                .long("level")
                .short('l')
                .default_value("info")
                .help("Level to emit at (debug|info|warning|error|critical or a number)"),
        )
        .arg(
            Arg::new("fmt")
                .long("fmt")
                .help("Console format template, e.g. '%(asctime)s - %(levelname)s - %(message)s'"),
        )
        .arg(
            Arg::new("datefmt")
                .long("datefmt")
                .help("strftime template for %(asctime)s"),
        )
        .arg(
            Arg::new("repeat")
                .long("repeat")
                .value_parser(clap::value_parser!(u32).range(1..))
                .default_value("1")
                .help("Fetch the logger this many times before emitting"),
        )
        .arg(
            Arg::new("message")
                .num_args(1..)
                .required(true)
                .help("Message to emit"),
        )
}

pub fn parse_invocation(matches: &ArgMatches) -> anyhow::Result<Invocation> {
    // The default file locations are optional, but whatever is found must load
    let mut config = match matches.get_one::<String>("config").map(PathBuf::from) {
        Some(path) => AppConfig::load_from(Some(&path))
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => AppConfig::load().context("Failed to load configuration")?,
    };

    if let Some(name) = matches.get_one::<String>("name") {
        config.logger.name = name.clone();
    }
    if let Some(fmt) = matches.get_one::<String>("fmt") {
        config.logger.fmt = fmt.clone();
    }
    if let Some(datefmt) = matches.get_one::<String>("datefmt") {
        config.logger.datefmt = Some(datefmt.clone());
    }
    config.validate()?;

    let level = matches
        .get_one::<String>("level")
        .map(|s| s.parse::<Level>())
        .transpose()?
        .unwrap_or(Level::Info);

    let message = matches
        .get_many::<String>("message")
        .map(|parts| parts.cloned().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    Ok(Invocation {
        config,
        root: matches.get_flag("root"),
        level,
        repeat: matches.get_one::<u32>("repeat").copied().unwrap_or(1),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Invocation> {
        let matches = build_cli().try_get_matches_from(args)?;
        parse_invocation(&matches)
    }

    #[test]
    fn test_flags_override_config() {
        let invocation = parse(&[
            "named-logger",
            "--name",
            "svc.cli",
            "--fmt",
            "%(levelname)s %(message)s",
            "--datefmt",
            "%H:%M",
            "--level",
            "error",
            "--repeat",
            "3",
            "hello",
            "world",
        ])
        .unwrap();

        assert_eq!(invocation.config.logger.name, "svc.cli");
        assert_eq!(invocation.config.logger.fmt, "%(levelname)s %(message)s");
        assert_eq!(invocation.config.logger.datefmt.as_deref(), Some("%H:%M"));
        assert_eq!(invocation.level, Level::Error);
        assert_eq!(invocation.repeat, 3);
        assert_eq!(invocation.message, "hello world");
        assert!(!invocation.root);
    }

    #[test]
    fn test_root_conflicts_with_name() {
        assert!(parse(&["named-logger", "--root", "--name", "x", "msg"]).is_err());
        assert!(parse(&["named-logger", "--root", "msg"]).unwrap().root);
    }

    #[test]
    fn test_invalid_level_and_template_are_rejected() {
        assert!(parse(&["named-logger", "--level", "loud", "msg"]).is_err());
        assert!(parse(&["named-logger", "--fmt", "no fields", "msg"]).is_err());
    }

    #[test]
    fn test_zero_repeat_is_rejected() {
        assert!(parse(&["named-logger", "--repeat", "0", "msg"]).is_err());
    }
}
