// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event payloads
//!
//! Reserved topics carry typed variants whose shape is fixed at construction.
//! Application topics carry a JSON object checked against the topic's field
//! schema when it is emitted.

use crate::topic::Topic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status values carried on `service.status.changed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Running,
    Stopping,
    Stopped,
    Error,
    /// Not a lifecycle state; flags a threshold breach or degraded operation
    Warning,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Running => "RUNNING",
            ServiceStatus::Stopping => "STOPPING",
            ServiceStatus::Stopped => "STOPPED",
            ServiceStatus::Error => "ERROR",
            ServiceStatus::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub service_name: String,
    pub status: ServiceStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub service_name: String,
    pub origin_topic: Topic,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPayload {
    pub service_name: String,
    pub metric_name: String,
    pub value_ms: f64,
}

/// Discriminant of a [`Payload`], used by schemas and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Status,
    Error,
    Metric,
    Data,
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PayloadKind::Status => "status",
            PayloadKind::Error => "error",
            PayloadKind::Metric => "metric",
            PayloadKind::Data => "data",
        };
        f.write_str(name)
    }
}

/// Data attached to an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Payload {
    Status(StatusPayload),
    Error(ErrorPayload),
    Metric(MetricPayload),
    /// Free-form object for application topics
    Data(Map<String, Value>),
}

impl Payload {
    pub fn status(
        service_name: impl Into<String>,
        status: ServiceStatus,
        message: impl Into<String>,
    ) -> Self {
        Payload::Status(StatusPayload {
            service_name: service_name.into(),
            status,
            message: message.into(),
        })
    }

    pub fn error(
        service_name: impl Into<String>,
        origin_topic: impl Into<Topic>,
        message: impl Into<String>,
    ) -> Self {
        Payload::Error(ErrorPayload {
            service_name: service_name.into(),
            origin_topic: origin_topic.into(),
            message: message.into(),
        })
    }

    pub fn metric(
        service_name: impl Into<String>,
        metric_name: impl Into<String>,
        value_ms: f64,
    ) -> Self {
        Payload::Metric(MetricPayload {
            service_name: service_name.into(),
            metric_name: metric_name.into(),
            value_ms,
        })
    }

    /// An empty data payload
    pub fn empty() -> Self {
        Payload::Data(Map::new())
    }

    /// Build a data payload from a JSON value.
    ///
    /// Returns `None` unless the value is an object.
    pub fn data(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Payload::Data(map)),
            _ => None,
        }
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Status(_) => PayloadKind::Status,
            Payload::Error(_) => PayloadKind::Error,
            Payload::Metric(_) => PayloadKind::Metric,
            Payload::Data(_) => PayloadKind::Data,
        }
    }

    /// Originating service for reserved payloads
    pub fn service_name(&self) -> Option<&str> {
        match self {
            Payload::Status(p) => Some(&p.service_name),
            Payload::Error(p) => Some(&p.service_name),
            Payload::Metric(p) => Some(&p.service_name),
            Payload::Data(_) => None,
        }
    }

    pub fn as_status(&self) -> Option<&StatusPayload> {
        match self {
            Payload::Status(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorPayload> {
        match self {
            Payload::Error(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_metric(&self) -> Option<&MetricPayload> {
        match self {
            Payload::Metric(p) => Some(p),
            _ => None,
        }
    }

    /// Field lookup on data payloads
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Payload::Data(map) => map.get(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_requires_an_object() {
        assert!(Payload::data(json!({"text": "hi"})).is_some());
        assert!(Payload::data(json!([1, 2])).is_none());
        assert!(Payload::data(json!("hi")).is_none());
    }

    #[test]
    fn reserved_payloads_expose_service_name() {
        let status = Payload::status("tts", ServiceStatus::Running, "");
        assert_eq!(status.kind(), PayloadKind::Status);
        assert_eq!(status.service_name(), Some("tts"));
        assert!(Payload::empty().service_name().is_none());
    }

    #[test]
    fn status_serializes_in_upper_case() {
        let payload = Payload::status("ear", ServiceStatus::Warning, "slow");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["kind"], "status");
        assert_eq!(value["body"]["status"], "WARNING");
    }
}
