use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt::{self},
    prelude::*,
};

/// Crates whose events follow the requested verbosity. Everything else (HTTP stack and
/// friends) is capped at WARN.
const OWN_TARGETS: [&str; 2] = ["stereoplane", "stereoplane_cli"];

pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn targets_for(level: LevelFilter) -> Targets {
    OWN_TARGETS
        .iter()
        .fold(Targets::new().with_default(level.min(LevelFilter::WARN)), |t, target| {
            t.with_target(*target, level)
        })
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let level = level_for(verbosity, quiet);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(targets_for(level))
        .with(stderr_layer);

    match log_file {
        Some(path) => {
            let file = File::create(path).map_err(CliError::Io)?;
            let file_layer = fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_target(true);
            subscriber.with(file_layer).init();
        }
        None => subscriber.init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;
    use std::sync::Once;
    use tracing::{debug, error, info, trace, warn};

    static INIT: Once = Once::new();

    fn ensure_global_logger_is_set() {
        INIT.call_once(|| {
            setup_logging(3, false, None).expect("Failed to set up global logger for tests");
        });
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0, false), LevelFilter::WARN);
        assert_eq!(level_for(1, false), LevelFilter::INFO);
        assert_eq!(level_for(2, false), LevelFilter::DEBUG);
        assert_eq!(level_for(7, false), LevelFilter::TRACE);
        assert_eq!(level_for(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn foreign_targets_are_capped_at_warn() {
        let targets = targets_for(LevelFilter::DEBUG);
        assert!(targets.would_enable("stereoplane::engine::controller", &tracing::Level::DEBUG));
        assert!(!targets.would_enable("hyper_util::client", &tracing::Level::DEBUG));
        assert!(targets.would_enable("hyper_util::client", &tracing::Level::WARN));

        let quiet = targets_for(LevelFilter::ERROR);
        assert!(!quiet.would_enable("reqwest", &tracing::Level::WARN));
    }

    #[test]
    #[serial]
    fn initialization_and_macros_work() {
        ensure_global_logger_is_set();

        error!("This is an error");
        warn!("This is a warning");
        info!("This is info");
        debug!("This is debug");
        trace!("This is trace");
    }

    #[test]
    #[serial]
    fn file_layer_writes_plain_text() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("stereoplane.log");

        let file = File::create(&log_path).unwrap();
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true);
        let subscriber = tracing_subscriber::registry()
            .with(targets_for(LevelFilter::DEBUG))
            .with(file_layer);

        tracing::subscriber::with_default(subscriber, || {
            debug!(target: "stereoplane::engine", "Plane fixed for the file-only test.");
            debug!(target: "hyper_util", "Connection noise.");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Plane fixed for the file-only test."));
        assert!(content.contains("DEBUG"));
        assert!(!content.contains("Connection noise."));
    }

    #[test]
    #[serial]
    fn invalid_log_file_path_propagates_error() {
        let invalid_path = PathBuf::from("/");

        if cfg!(unix) && invalid_path.is_dir() {
            let result = setup_logging(0, false, Some(&invalid_path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}
