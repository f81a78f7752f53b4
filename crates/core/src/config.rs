// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Construction-time configuration
//!
//! Loaded from TOML. Every key is optional:
//!
//! ```toml
//! default_log_level = "info"
//! max_queue_size = 1024
//! flush_interval_seconds = 30.0
//! stop_grace_seconds = 5.0
//!
//! [component_levels]
//! sb_service = "debug"
//!
//! [performance_thresholds]
//! audio_processing = 100.0
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwitchboardConfig {
    /// Level for every target without an entry in `component_levels`
    pub default_log_level: String,
    /// Per-target levels, keyed by tracing target (e.g. `sb_service::host`)
    pub component_levels: BTreeMap<String, String>,
    /// Bound on retained status history per service
    pub max_queue_size: usize,
    /// Period of the metrics summary flush
    pub flush_interval_seconds: f64,
    /// Metric name to maximum acceptable milliseconds
    pub performance_thresholds: BTreeMap<String, f64>,
    /// Time owned tasks get to finish after cancellation on stop
    pub stop_grace_seconds: f64,
}

const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

impl Default for SwitchboardConfig {
    fn default() -> Self {
        Self {
            default_log_level: "info".to_string(),
            component_levels: BTreeMap::new(),
            max_queue_size: 1024,
            flush_interval_seconds: DEFAULT_FLUSH_INTERVAL.as_secs_f64(),
            performance_thresholds: BTreeMap::new(),
            stop_grace_seconds: DEFAULT_STOP_GRACE.as_secs_f64(),
        }
    }
}

impl SwitchboardConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_level("default", &self.default_log_level)?;
        for (component, level) in &self.component_levels {
            if component.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "component_levels".to_string(),
                    reason: "component name must not be empty".to_string(),
                });
            }
            parse_level(component, level)?;
        }

        if self.max_queue_size == 0 {
            return Err(invalid("max_queue_size", "must be at least 1"));
        }
        positive_seconds("flush_interval_seconds", self.flush_interval_seconds)?;
        positive_seconds("stop_grace_seconds", self.stop_grace_seconds)?;

        for (metric, max_ms) in &self.performance_thresholds {
            if !max_ms.is_finite() || *max_ms < 0.0 {
                return Err(invalid(
                    &format!("performance_thresholds.{}", metric),
                    "must be a finite, non-negative number of milliseconds",
                ));
            }
        }
        Ok(())
    }

    /// Flush period; falls back to the default when the field was set
    /// to something `validate` would reject
    pub fn flush_interval(&self) -> Duration {
        seconds(self.flush_interval_seconds).unwrap_or(DEFAULT_FLUSH_INTERVAL)
    }

    pub fn stop_grace(&self) -> Duration {
        seconds(self.stop_grace_seconds).unwrap_or(DEFAULT_STOP_GRACE)
    }

    pub fn threshold_ms(&self, metric_name: &str) -> Option<f64> {
        self.performance_thresholds.get(metric_name).copied()
    }

    /// Render the levels as an `EnvFilter` directive string, e.g.
    /// `info,sb_service=debug`
    pub fn filter_directives(&self) -> String {
        let mut directives = vec![normalize_level(&self.default_log_level)];
        for (component, level) in &self.component_levels {
            directives.push(format!("{}={}", component, normalize_level(level)));
        }
        directives.join(",")
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// A non-zero duration, or `None` when the value is negative, non-finite,
/// too large for `Duration`, or rounds down to zero nanoseconds
fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok().filter(|d| !d.is_zero())
}

fn positive_seconds(field: &str, value: f64) -> Result<(), ConfigError> {
    match seconds(value) {
        Some(_) => Ok(()),
        None => Err(invalid(
            field,
            "must be a positive number of seconds that fits a duration",
        )),
    }
}

/// Lower-case level name, accepting the common `warning`/`critical` aliases
fn normalize_level(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    }
}

fn parse_level(component: &str, level: &str) -> Result<LevelFilter, ConfigError> {
    let normalized = normalize_level(level);
    if normalized.is_empty() {
        return Err(ConfigError::InvalidLevel {
            component: component.to_string(),
            level: level.to_string(),
        });
    }
    LevelFilter::from_str(&normalized).map_err(|_| ConfigError::InvalidLevel {
        component: component.to_string(),
        level: level.to_string(),
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
