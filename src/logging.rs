/*!
 * Diagnostic logging setup
 *
 * stdout belongs to command output (tables or JSON Lines), so diagnostics
 * go either to stderr in compact form or to the `--log` file as JSON.
 */

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::SyncConfig;
use crate::error::{MidsyncError, Result};

/// Install the global subscriber for `config`
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &SyncConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(log_filter(config)?);

    let installed = match config.log_file.as_deref() {
        Some(path) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(open_log_file(path)?)
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        None => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(io::stderr)
                    .without_time(),
            )
            .try_init(),
    };

    installed.map_err(|e| MidsyncError::Config(format!("Failed to install logger: {}", e)))
}

/// Level actually used: verbose forces DEBUG
pub fn effective_level(config: &SyncConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

/// Filter directive used when `RUST_LOG` is unset
fn default_directive(config: &SyncConfig) -> String {
    format!("midsync={}", effective_level(config).to_string().to_lowercase())
}

fn log_filter(config: &SyncConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive(config))
            .map_err(|e| MidsyncError::Config(format!("Invalid log filter: {}", e))),
    }
}

// Appends, so repeated runs against one midpoint share a log
fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            MidsyncError::Config(format!("Cannot open log file {}: {}", path.display(), e))
        })
}

/// Route test diagnostics through the libtest capture
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("midsync=debug"))
        .with(fmt::layer().with_test_writer().with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use tempfile::tempdir;

    #[test]
    fn test_verbose_overrides_log_level() {
        let config = SyncConfig {
            log_level: LogLevel::Error,
            verbose: true,
            ..Default::default()
        };
        assert_eq!(effective_level(&config), Level::DEBUG);
    }

    #[test]
    fn test_configured_level_used_when_not_verbose() {
        let config = SyncConfig {
            log_level: LogLevel::Info,
            ..Default::default()
        };
        assert_eq!(effective_level(&config), Level::INFO);
        assert_eq!(effective_level(&SyncConfig::default()), Level::WARN);
    }

    #[test]
    fn test_default_directive_scopes_to_crate() {
        let directive = default_directive(&SyncConfig::default());
        assert_eq!(directive, "midsync=warn");
        assert!(EnvFilter::try_new(&directive).is_ok());
    }

    #[test]
    fn test_log_file_is_appended() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("midsync.log");
        std::fs::write(&path, b"earlier run\n").unwrap();

        drop(open_log_file(&path).unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"earlier run\n");
    }

    #[test]
    fn test_unopenable_log_file_is_config_error() {
        let dir = tempdir().unwrap();
        let err = open_log_file(&dir.path().join("missing/midsync.log")).unwrap_err();
        assert!(matches!(err, MidsyncError::Config(_)));
    }
}
