use std::sync::Arc;

use named_logger::internal::logging::CaptureHandler;
use named_logger::{Formatter, Level, LoggerOptions, LoggerProvider, LoggerRegistry};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_handler_sees_formatted_output() {
        let registry = LoggerRegistry::new();
        let provider = LoggerProvider::new(&registry);
        let capture = Arc::new(CaptureHandler::with_formatter(
            Formatter::new("%(name)s [%(levelname)-7s] %(message)s", None).unwrap(),
        ));

        let logger = provider
            .get_logger(Some("svc.capture"), LoggerOptions::new().with_handler(capture.clone()))
            .unwrap();
        logger.debug("hidden");
        logger.info("shown");
        logger.critical("boom");

        assert_eq!(
            capture.lines(),
            vec![
                "svc.capture [INFO   ] shown",
                "svc.capture [CRITICAL] boom",
            ]
        );
    }

    #[test]
    fn test_capture_level_filters_independently_of_logger() {
        let registry = LoggerRegistry::new();
        let provider = LoggerProvider::new(&registry);
        let capture = Arc::new(CaptureHandler::new());
        capture.set_level(Level::Error);

        let logger = provider
            .get_logger(Some("svc.filtered"), LoggerOptions::new().with_handler(capture.clone()))
            .unwrap();
        logger.warning("skipped");
        logger.error("kept");

        assert_eq!(capture.lines(), vec!["kept"]);
    }

    #[test]
    fn test_child_logger_propagates_into_provided_logger() {
        let registry = LoggerRegistry::new();
        let provider = LoggerProvider::new(&registry);
        let capture = Arc::new(CaptureHandler::new());
        provider
            .get_logger(Some("svc"), LoggerOptions::new().with_handler(capture.clone()))
            .unwrap();

        let child = registry.logger("svc.worker");
        assert_eq!(child.effective_level(), Level::Info);
        child.info("from child");
        child.debug("too low");

        assert_eq!(capture.lines(), vec!["from child"]);
    }
}
