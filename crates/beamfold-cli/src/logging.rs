use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, fmt::format::FmtSpan, prelude::*};

/// `-q` silences everything; otherwise each `-v` lowers the threshold by one level from WARN.
fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbosity) {
        (true, _) => LevelFilter::OFF,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber: compact records on stderr, and a full record of every
/// closed span in `log_file` when one is given. `RUST_LOG` refines the level picked by the
/// verbosity flags.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level_filter(verbosity, quiet).into())
        .from_env_lossy();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(CliError::Io)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing::{debug, info, info_span};

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(7, false), LevelFilter::TRACE);
        assert_eq!(level_filter(3, true), LevelFilter::OFF);
    }

    #[test]
    #[serial]
    fn file_layer_records_fields_and_closed_spans() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fold.log");
        let file = File::create(&path).unwrap();
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE),
        );

        tracing::subscriber::with_default(subscriber, || {
            let span = info_span!("fold_workflow", length = 9);
            let _guard = span.enter();
            debug!(energy = -1.2, "Fold complete.");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Fold complete."));
        assert!(content.contains("energy=-1.2"));
        assert!(content.contains("fold_workflow"));
        assert!(content.contains("close"));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_is_an_io_error() {
        let result = setup_logging(0, false, Some(Path::new("/")));
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[test]
    #[serial]
    fn second_installation_is_reported() {
        let _ = setup_logging(1, false, None);
        info!("Logger installed.");
        assert!(setup_logging(1, false, None).is_err());
    }
}
