//! Logging setup.
//!
//! Three outputs, each with its own level:
//! - console at `console_level`, overridable through `RUST_LOG`
//! - debug file (`dbg.log` by default) with everything at debug and above
//! - info file (`log.log` by default) with info and above
//!
//! Files are appended to across restarts. Either file can be switched off by
//! setting its path to an empty string.

use std::fs;
use std::io;
use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping it flushes and closes the file writers.
pub struct LoggingGuard {
    _file_guards: Vec<WorkerGuard>,
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a log file cannot be opened or a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, io::Error> {
    let mut guards = Vec::new();

    let debug_layer = match config.debug_path() {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            guards.push(guard);
            Some(file_layer(writer, LevelFilter::DEBUG))
        }
        None => None,
    };
    let info_layer = match config.info_path() {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            guards.push(guard);
            Some(file_layer(writer, LevelFilter::INFO))
        }
        None => None,
    };

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.console_level));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(debug_layer)
        .with(info_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guards: guards,
    })
}

fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard), io::Error> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path has no file name: {}", path.display()),
        )
    })?;
    fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

fn file_layer<S>(writer: NonBlocking, level: LevelFilter) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_writer_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dbg.log");

        let (_writer, _guard) = file_writer(&path).unwrap();

        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn file_writer_rejects_path_without_file_name() {
        let err = file_writer(Path::new("/")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
