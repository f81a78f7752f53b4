// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling waits for asynchronous effects
//!
//! Event chains complete on other tasks at an unknown time. Instead of
//! sleeping a fixed amount, tests poll for the effect they expect and fail
//! with a descriptive [`WaitTimeout`] when it never shows up.

use crate::error::WaitTimeout;
use std::fmt::Debug;
use std::time::Duration;
use tokio::time::Instant;

/// Default interval between predicate checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy)]
pub struct EventSynchronizer {
    poll_interval: Duration,
}

impl EventSynchronizer {
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `predicate` until it returns true or `timeout` elapses.
    ///
    /// The predicate is checked once more at the deadline, so a zero timeout
    /// still evaluates it once.
    pub async fn wait_for_condition<F>(
        &self,
        mut predicate: F,
        timeout: Duration,
        message: impl Into<String>,
    ) -> Result<(), WaitTimeout>
    where
        F: FnMut() -> bool,
    {
        let start = Instant::now();
        let deadline = start + timeout;
        loop {
            if predicate() {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                let message = message.into();
                tracing::debug!(%message, waited_ms = (now - start).as_millis() as u64, "wait timed out");
                return Err(WaitTimeout {
                    message,
                    waited: now - start,
                });
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Wait until `getter()` returns `expected`
    pub async fn wait_for_value<T, G>(
        &self,
        mut getter: G,
        expected: T,
        timeout: Duration,
        message: impl Into<String>,
    ) -> Result<(), WaitTimeout>
    where
        T: PartialEq + Debug,
        G: FnMut() -> T,
    {
        self.wait_for_condition(|| getter() == expected, timeout, message)
            .await
    }

    /// Wait until every condition holds in the same poll
    pub async fn wait_multiple(
        &self,
        conditions: &mut [&mut dyn FnMut() -> bool],
        timeout: Duration,
        message: impl Into<String>,
    ) -> Result<(), WaitTimeout> {
        self.wait_for_condition(
            || conditions.iter_mut().all(|condition| condition()),
            timeout,
            message,
        )
        .await
    }
}

impl Default for EventSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
