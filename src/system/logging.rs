//! Logging system initialization

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::LoggingConfig;
use crate::errors::{GeoError, Result};

/// Initialize the global tracing subscriber.
///
/// The returned `WorkerGuard` must stay alive for the duration of the
/// program so buffered log lines are flushed.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let writer = build_writer(config)?;

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.clone()));

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(writes_to_console(config));

    let installed = if config.format == "json" {
        subscriber_builder.json().try_init()
    } else {
        subscriber_builder.try_init()
    };
    installed.map_err(|e| GeoError::config(format!("Failed to install logger: {}", e)))?;

    Ok(guard)
}

fn writes_to_console(config: &LoggingConfig) -> bool {
    config.file.as_ref().is_none_or(|f| f.is_empty())
}

fn build_writer(config: &LoggingConfig) -> Result<Box<dyn std::io::Write + Send + Sync>> {
    let log_file = match config.file.as_deref() {
        Some(file) if !file.is_empty() => file,
        _ => return Ok(Box::new(std::io::stdout())),
    };

    if !config.enable_rotation {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| GeoError::config(format!("Failed to open log file {}: {}", log_file, e)))?;
        return Ok(Box::new(file));
    }

    let path = Path::new(log_file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let prefix = rotation_prefix(path);

    let appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(config.max_backups.max(1) as usize)
        .build(dir)
        .map_err(|e| GeoError::config(format!("Failed to create rolling log appender: {}", e)))?;
    Ok(Box::new(appender))
}

fn rotation_prefix(path: &Path) -> String {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("geolocator.log")
        .trim_end_matches(".log")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_detection() {
        let mut config = LoggingConfig::default();
        assert!(writes_to_console(&config));
        config.file = Some(String::new());
        assert!(writes_to_console(&config));
        config.file = Some("logs/geo.log".to_string());
        assert!(!writes_to_console(&config));
    }

    #[test]
    fn test_rotation_prefix() {
        assert_eq!(rotation_prefix(Path::new("logs/geo.log")), "geo");
        assert_eq!(rotation_prefix(Path::new("service")), "service");
    }

    #[test]
    fn test_plain_file_writer_is_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plain.log");
        let config = LoggingConfig {
            file: Some(path.to_string_lossy().to_string()),
            enable_rotation: false,
            ..LoggingConfig::default()
        };
        assert!(build_writer(&config).is_ok());
        assert!(path.exists());
    }
}
