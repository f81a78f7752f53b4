// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events system
//!
//! This module provides:
//! - `EventBus` - Validate events and fan them out to topic subscribers
//! - `Handler` - The callback a subscriber registers
//! - `EventRecorder` - In-memory trail of every event the bus accepted
//! - `TopicPattern` - Segment matching used to query recorded events

mod bus;
mod event;
mod handler;
mod recorder;
mod subscription;

pub use bus::{current_dispatch_topic, panic_message, EventBus, EventReceiver, HandlerOutcome};
pub use event::Event;
pub use handler::{handler_fn, Handler, HandlerFn};
pub use recorder::{EventRecord, EventRecorder};
pub use subscription::{Subscription, SubscriptionId, TopicPattern};
