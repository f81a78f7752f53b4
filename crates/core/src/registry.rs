// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic/payload registry
//!
//! Maps every topic to the schema of its payload. Built once at process start
//! through [`RegistryBuilder`] and shared read-only afterwards.

use crate::error::{RegistryError, SchemaValidationError};
use crate::payload::{Payload, PayloadKind};
use crate::topic::{self, Topic};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// JSON type accepted by a data field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

impl FieldKind {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
            FieldKind::Any => true,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::String => "a string",
            FieldKind::Integer => "an integer",
            FieldKind::Number => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Array => "an array",
            FieldKind::Object => "an object",
            FieldKind::Any => "any value",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// Shape of the payload expected on a topic
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// One of the typed reporting payloads
    Reserved(PayloadKind),
    /// A data object with the listed fields. Unlisted fields pass unchecked.
    Fields(Vec<FieldSpec>),
}

impl Schema {
    /// Data payload with no declared fields
    pub fn any() -> Self {
        Schema::Fields(Vec::new())
    }

    pub fn fields(fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        Schema::Fields(fields.into_iter().collect())
    }

    fn expected_kind(&self) -> PayloadKind {
        match self {
            Schema::Reserved(kind) => *kind,
            Schema::Fields(_) => PayloadKind::Data,
        }
    }

    /// Check `payload` against this schema
    pub fn check(&self, topic: &Topic, payload: &Payload) -> Result<(), SchemaValidationError> {
        let expected = self.expected_kind();
        if payload.kind() != expected {
            return Err(SchemaValidationError::KindMismatch {
                topic: topic.clone(),
                expected,
                found: payload.kind(),
            });
        }

        match (self, payload) {
            (Schema::Fields(specs), Payload::Data(map)) => {
                for spec in specs {
                    match map.get(&spec.name) {
                        None | Some(Value::Null) if spec.required => {
                            return Err(SchemaValidationError::MissingField {
                                topic: topic.clone(),
                                field: spec.name.clone(),
                            });
                        }
                        None | Some(Value::Null) => {}
                        Some(value) if !spec.kind.accepts(value) => {
                            return Err(SchemaValidationError::WrongType {
                                topic: topic.clone(),
                                field: spec.name.clone(),
                                expected: spec.kind,
                            });
                        }
                        Some(_) => {}
                    }
                }
                Ok(())
            }
            (_, reserved) => check_reserved(topic, reserved),
        }
    }
}

fn check_reserved(topic: &Topic, payload: &Payload) -> Result<(), SchemaValidationError> {
    let non_empty = |value: &str, field: &'static str| {
        if value.trim().is_empty() {
            Err(SchemaValidationError::EmptyField {
                topic: topic.clone(),
                field,
            })
        } else {
            Ok(())
        }
    };

    match payload {
        Payload::Status(p) => non_empty(&p.service_name, "service_name"),
        Payload::Error(p) => {
            non_empty(&p.service_name, "service_name")?;
            non_empty(p.origin_topic.as_str(), "origin_topic")
        }
        Payload::Metric(p) => {
            non_empty(&p.service_name, "service_name")?;
            non_empty(&p.metric_name, "metric_name")?;
            if !p.value_ms.is_finite() || p.value_ms < 0.0 {
                return Err(SchemaValidationError::InvalidNumber {
                    topic: topic.clone(),
                    field: "value_ms",
                });
            }
            Ok(())
        }
        Payload::Data(_) => Ok(()),
    }
}

/// Read-only mapping from topic to payload schema
#[derive(Debug, Clone)]
pub struct TopicRegistry {
    schemas: HashMap<Topic, Schema>,
}

impl TopicRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry holding only the reserved topics
    pub fn reserved_only() -> Arc<Self> {
        RegistryBuilder::new().build()
    }

    pub fn contains(&self, topic: &Topic) -> bool {
        self.schemas.contains_key(topic)
    }

    pub fn schema(&self, topic: &Topic) -> Option<&Schema> {
        self.schemas.get(topic)
    }

    /// Registered topics in name order
    pub fn topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.schemas.keys().cloned().collect();
        topics.sort();
        topics
    }

    pub fn validate(&self, topic: &Topic, payload: &Payload) -> Result<(), SchemaValidationError> {
        let schema = self
            .schemas
            .get(topic)
            .ok_or_else(|| SchemaValidationError::UnknownTopic(topic.clone()))?;
        schema.check(topic, payload)
    }
}

/// Collects topic schemas before the registry is frozen
#[derive(Debug)]
pub struct RegistryBuilder {
    schemas: HashMap<Topic, Schema>,
}

impl RegistryBuilder {
    fn new() -> Self {
        let mut schemas = HashMap::new();
        schemas.insert(
            Topic::new(topic::STATUS_CHANGED),
            Schema::Reserved(PayloadKind::Status),
        );
        schemas.insert(
            Topic::new(topic::SERVICE_ERROR),
            Schema::Reserved(PayloadKind::Error),
        );
        schemas.insert(
            Topic::new(topic::PERFORMANCE),
            Schema::Reserved(PayloadKind::Metric),
        );
        Self { schemas }
    }

    /// Register an application topic
    pub fn register(
        mut self,
        topic: impl Into<Topic>,
        schema: Schema,
    ) -> Result<Self, RegistryError> {
        let topic = topic.into();
        if !topic.is_well_formed() {
            return Err(RegistryError::Malformed(topic));
        }
        if topic.is_reserved() {
            return Err(RegistryError::Reserved(topic));
        }
        if self.schemas.contains_key(&topic) {
            return Err(RegistryError::Duplicate(topic));
        }
        self.schemas.insert(topic, schema);
        Ok(self)
    }

    pub fn build(self) -> Arc<TopicRegistry> {
        Arc::new(TopicRegistry {
            schemas: self.schemas,
        })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
