// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sb-service: services hosted on the switchboard event bus
//!
//! This crate provides:
//! - The service lifecycle state machine and its `ServiceRecord`
//! - `ServiceHost`, which drives a `Service` through start and stop
//! - `ServiceContext`, the capabilities a service is handed
//! - `StatusReporter` and `StatusBoard` for the reserved reporting topics

pub mod blocking;
pub mod board;
pub mod context;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod reporting;
mod tasks;

pub use blocking::{BlockingProxy, DEFAULT_BLOCKING_TIMEOUT};
pub use board::{MetricKey, MetricSummary, StatusBoard, StatusEntry};
pub use context::ServiceContext;
pub use error::{BlockingError, LifecycleError, ServiceError};
pub use host::{Service, ServiceHost};
pub use lifecycle::{ServiceRecord, ServiceState};
pub use reporting::StatusReporter;
