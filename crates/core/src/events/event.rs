// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated event as seen by handlers

use crate::payload::Payload;
use crate::topic::Topic;
use serde::Serialize;
use std::time::Instant;

/// An event accepted by the bus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Bus-wide emission order, starting at 1
    pub sequence: u64,
    pub topic: Topic,
    pub payload: Payload,
    /// When the bus accepted the event
    #[serde(skip)]
    pub emitted_at: Instant,
}

impl Event {
    pub fn name(&self) -> &str {
        self.topic.as_str()
    }
}
