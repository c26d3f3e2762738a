use tracing::{debug, error, info};
use named_logger::cli::{build_cli, parse_invocation};
use named_logger::internal::diagnostics::init_diagnostics;
use named_logger::LoggerProvider;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments first
    let matches = build_cli().get_matches();
    let invocation = match parse_invocation(&matches) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize diagnostics
    if let Err(e) = init_diagnostics(&invocation.config.diagnostics) {
        eprintln!("Failed to initialize diagnostics: {}", e);
        std::process::exit(1);
    }

    debug!("Version: {}", named_logger::internal::config::get_version_info());

    let provider = LoggerProvider::global();
    let name = (!invocation.root).then_some(invocation.config.logger.name.as_str());

    let mut logger = None;
    for _ in 0..invocation.repeat {
        match provider.get_logger(name, invocation.config.logger.options()) {
            Ok(l) => logger = Some(l),
            Err(e) => {
                error!("Failed to configure logger: {}", e);
                std::process::exit(1);
            }
        }
    }

    let Some(logger) = logger else {
        return Ok(());
    };

    info!(
        logger = logger.name(),
        handlers = logger.handlers().len(),
        repeat = invocation.repeat,
        "Logger ready"
    );

    logger.log(invocation.level, invocation.message);
    logger.flush();
    Ok(())
}
