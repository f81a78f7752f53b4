// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the service layer

use crate::lifecycle::ServiceState;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The record is left unchanged
    #[error("service {service}: illegal transition {from} -> {to}")]
    InvalidTransition {
        service: String,
        from: ServiceState,
        to: ServiceState,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    /// The setup hook failed; the service is in ERROR
    #[error("service {service} failed to start: {message}")]
    Setup { service: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockingError {
    #[error("blocking operation timed out after {0:?}")]
    TimedOut(Duration),
    #[error("blocking operation cancelled")]
    Cancelled,
    #[error("blocking operation panicked: {0}")]
    Panicked(String),
}
