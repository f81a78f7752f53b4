// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the bus core

use crate::events::SubscriptionId;
use crate::payload::PayloadKind;
use crate::registry::FieldKind;
use crate::topic::Topic;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A payload did not match its topic's schema. Nothing was dispatched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaValidationError {
    #[error("unknown topic: {0}")]
    UnknownTopic(Topic),
    #[error("topic {topic} expects a {expected} payload, got {found}")]
    KindMismatch {
        topic: Topic,
        expected: PayloadKind,
        found: PayloadKind,
    },
    #[error("topic {topic}: missing required field '{field}'")]
    MissingField { topic: Topic, field: String },
    #[error("topic {topic}: field '{field}' must be {expected}")]
    WrongType {
        topic: Topic,
        field: String,
        expected: FieldKind,
    },
    #[error("topic {topic}: {field} must not be empty")]
    EmptyField { topic: Topic, field: &'static str },
    #[error("topic {topic}: {field} must be a finite, non-negative number")]
    InvalidNumber { topic: Topic, field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("topic already registered: {0}")]
    Duplicate(Topic),
    #[error("topic is reserved: {0}")]
    Reserved(Topic),
    #[error("malformed topic name: '{0}'")]
    Malformed(Topic),
}

/// A subscriber's handler failed while processing an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("handler {subscription} on {topic} failed: {message}")]
pub struct HandlerError {
    pub subscription: SubscriptionId,
    pub owner: Option<String>,
    pub topic: Topic,
    pub message: String,
    /// The handler panicked rather than returning an error
    pub panicked: bool,
}

impl HandlerError {
    /// Name reported as `service_name` in `service.error` events
    pub fn reporter(&self) -> &str {
        self.owner.as_deref().unwrap_or(&self.subscription.0)
    }
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
    #[error("emit called outside of a tokio runtime")]
    NoRuntime,
    #[error("event bus is closed")]
    Closed,
    #[error(transparent)]
    Handler(HandlerError),
}

/// A synchronizer wait exceeded its bound
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("timed out after {waited:?}: {message}")]
pub struct WaitTimeout {
    pub message: String,
    pub waited: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid log level '{level}' for {component}")]
    InvalidLevel { component: String, level: String },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
