// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service lifecycle state machine
//!
//! ```text
//! CREATED -> INITIALIZING -> RUNNING -> STOPPING -> STOPPED
//!                 |             |          ^           |
//!                 +--> ERROR <--+          |           +--> INITIALIZING
//!                        +-----------------+
//! ```

use crate::error::LifecycleError;
use sb_core::{Clock, ServiceStatus};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    Created,
    Initializing,
    Running,
    Stopping,
    Stopped,
    Error,
}

impl ServiceState {
    pub const ALL: [ServiceState; 6] = [
        ServiceState::Created,
        ServiceState::Initializing,
        ServiceState::Running,
        ServiceState::Stopping,
        ServiceState::Stopped,
        ServiceState::Error,
    ];

    pub fn can_transition_to(self, next: ServiceState) -> bool {
        use ServiceState::*;
        matches!(
            (self, next),
            (Created, Initializing)
                | (Stopped, Initializing)
                | (Initializing, Running)
                | (Initializing, Error)
                | (Running, Stopping)
                | (Running, Error)
                | (Error, Stopping)
                | (Stopping, Stopped)
        )
    }

    /// Status announced on the bus when this state is entered.
    ///
    /// CREATED and INITIALIZING are internal and never published.
    pub fn status(self) -> Option<ServiceStatus> {
        match self {
            ServiceState::Created | ServiceState::Initializing => None,
            ServiceState::Running => Some(ServiceStatus::Running),
            ServiceState::Stopping => Some(ServiceStatus::Stopping),
            ServiceState::Stopped => Some(ServiceStatus::Stopped),
            ServiceState::Error => Some(ServiceStatus::Error),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Created => "CREATED",
            ServiceState::Initializing => "INITIALIZING",
            ServiceState::Running => "RUNNING",
            ServiceState::Stopping => "STOPPING",
            ServiceState::Stopped => "STOPPED",
            ServiceState::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle bookkeeping for one service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecord {
    pub name: String,
    pub state: ServiceState,
    pub message: String,
    pub last_transition: Instant,
}

impl ServiceRecord {
    pub fn new(name: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            name: name.into(),
            state: ServiceState::Created,
            message: String::new(),
            last_transition: clock.now(),
        }
    }

    /// Compute the record after moving to `next`.
    ///
    /// Pure: `self` is never modified, so a rejected transition leaves the
    /// caller's record exactly as it was.
    pub fn transition(
        &self,
        next: ServiceState,
        message: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<ServiceRecord, LifecycleError> {
        if !self.state.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition {
                service: self.name.clone(),
                from: self.state,
                to: next,
            });
        }
        Ok(ServiceRecord {
            name: self.name.clone(),
            state: next,
            message: message.into(),
            last_transition: clock.now(),
        })
    }

    /// Time spent in the current state
    pub fn age(&self, clock: &impl Clock) -> Duration {
        clock.since(self.last_transition)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
