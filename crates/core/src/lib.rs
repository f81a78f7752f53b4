// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sb-core: in-process event bus for switchboard
//!
//! This crate provides:
//! - A read-only topic registry pairing every topic with its payload schema
//! - Typed payloads for the reserved status, error and metrics topics
//! - `EventBus` with validated publish and isolated concurrent fan-out
//! - `EventSynchronizer` for asserting on asynchronous event chains
//! - TOML configuration shared by the bus and the service layer

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod id;
pub mod payload;
pub mod registry;
pub mod sync;
pub mod topic;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::SwitchboardConfig;
pub use error::{
    BusError, ConfigError, HandlerError, RegistryError, SchemaValidationError, WaitTimeout,
};
pub use events::{
    current_dispatch_topic, handler_fn, panic_message, Event, EventBus, EventReceiver,
    EventRecord, EventRecorder, Handler, HandlerOutcome, Subscription, SubscriptionId,
    TopicPattern,
};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use payload::{ErrorPayload, MetricPayload, Payload, PayloadKind, ServiceStatus, StatusPayload};
pub use registry::{FieldKind, FieldSpec, RegistryBuilder, Schema, TopicRegistry};
pub use sync::EventSynchronizer;
pub use topic::Topic;
