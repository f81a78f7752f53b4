// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status and performance reporting on the reserved topics
//!
//! Reporting never fails the caller: when the bus refuses an event the
//! report falls back to the log.

use sb_core::{current_dispatch_topic, EventBus, Payload, ServiceStatus, SwitchboardConfig, Topic};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct StatusReporter {
    bus: EventBus,
    thresholds: Arc<BTreeMap<String, f64>>,
}

impl StatusReporter {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            thresholds: Arc::new(BTreeMap::new()),
        }
    }

    pub fn from_config(bus: EventBus, config: &SwitchboardConfig) -> Self {
        Self {
            bus,
            thresholds: Arc::new(config.performance_thresholds.clone()),
        }
    }

    pub fn with_threshold(mut self, metric_name: impl Into<String>, limit_ms: f64) -> Self {
        Arc::make_mut(&mut self.thresholds).insert(metric_name.into(), limit_ms);
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn threshold_ms(&self, metric_name: &str) -> Option<f64> {
        self.thresholds.get(metric_name).copied()
    }

    /// Publish a status change. Returns whether it reached the bus.
    ///
    /// A status emitted while a status handler is running is only logged,
    /// so status observers cannot trigger themselves.
    pub fn emit_status(
        &self,
        service_name: &str,
        status: ServiceStatus,
        message: impl Into<String>,
    ) -> bool {
        let message = message.into();
        match status {
            ServiceStatus::Error => {
                tracing::error!(service = service_name, %status, message = %message, "service status");
            }
            ServiceStatus::Warning => {
                tracing::warn!(service = service_name, %status, message = %message, "service status");
            }
            _ => tracing::info!(service = service_name, %status, message = %message, "service status"),
        }

        if dispatching(&Topic::status_changed()) {
            tracing::debug!(service = service_name, %status, "status suppressed inside status handler");
            return false;
        }

        let payload = Payload::status(service_name, status, message);
        match self.bus.emit(Topic::status_changed(), payload) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(service = service_name, %status, error = %e, "status not published");
                false
            }
        }
    }

    /// Publish a timing measurement.
    ///
    /// When the metric has a configured threshold and `value_ms` exceeds it,
    /// a WARNING status is emitted as well. Returns whether the threshold was
    /// breached.
    pub fn emit_performance_metric(&self, service_name: &str, metric_name: &str, value_ms: f64) -> bool {
        tracing::debug!(service = service_name, metric = metric_name, value_ms, "performance metric");

        if dispatching(&Topic::performance()) {
            tracing::debug!(service = service_name, metric = metric_name, "metric suppressed inside metrics handler");
        } else {
            let payload = Payload::metric(service_name, metric_name, value_ms);
            if let Err(e) = self.bus.emit(Topic::performance(), payload) {
                tracing::warn!(service = service_name, metric = metric_name, error = %e, "metric not published");
            }
        }

        match self.threshold_ms(metric_name) {
            Some(limit) if value_ms > limit => {
                self.emit_status(
                    service_name,
                    ServiceStatus::Warning,
                    format!("{metric_name} took {value_ms:.1}ms (threshold {limit:.1}ms)"),
                );
                true
            }
            _ => false,
        }
    }
}

fn dispatching(topic: &Topic) -> bool {
    current_dispatch_topic().is_some_and(|current| &current == topic)
}

#[cfg(test)]
#[path = "reporting_tests.rs"]
mod tests;
