// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup for sbd
//!
//! `RUST_LOG` takes precedence over the levels in the config file.

use sb_core::SwitchboardConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("log file path has no file name: {0}")]
    InvalidPath(PathBuf),
    #[error("failed to create log directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("tracing already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Filter from `RUST_LOG`, falling back to the configured levels
pub fn build_filter(config: &SwitchboardConfig) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(config.filter_directives())?),
    }
}

/// Install the global subscriber. Logs go to `log_file` when given, else stderr.
///
/// The returned guard must be held until exit so buffered lines are flushed.
pub fn setup_logging(
    config: &SwitchboardConfig,
    log_file: Option<&Path>,
) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = build_filter(config)?;

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?;
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;
    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_levels_form_a_valid_filter() {
        let config = SwitchboardConfig::from_toml_str(
            r#"
            default_log_level = "warning"
            [component_levels]
            sb_service = "debug"
            "#,
        )
        .unwrap();
        assert!(build_filter(&config).is_ok());
    }

    #[test]
    fn log_file_receives_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("sbd.log");

        let guard = setup_logging(&SwitchboardConfig::default(), Some(&path)).unwrap();
        tracing::error!("written to file");
        drop(guard);

        assert!(path.exists());
    }
}
