// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background tasks owned by a service
//!
//! Every task gets the group's cancellation token. Stopping a service cancels
//! the token, waits out the grace period, then aborts whatever is left.

use futures::FutureExt;
use sb_core::panic_message;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Receives failures of owned tasks
pub(crate) trait FailureSink: Send + Sync {
    fn task_failed(&self, task: &str, message: &str);
}

pub struct TaskGroup {
    token: Mutex<CancellationToken>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskGroup {
    pub(crate) fn new() -> Self {
        Self {
            token: Mutex::new(CancellationToken::new()),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Token cancelled when the owning service stops
    pub fn token(&self) -> CancellationToken {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Arm a fresh token for a restart
    pub(crate) fn reset(&self) {
        let mut token = self.token.lock().unwrap_or_else(|e| e.into_inner());
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
    }

    /// Number of tasks that have not finished yet
    pub fn active(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub(crate) fn spawn<Fut>(
        &self,
        name: String,
        fut: Fut,
        span: tracing::Span,
        sink: Arc<dyn FailureSink>,
    ) where
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let token = self.token();
        let task = async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => tracing::debug!(task = %name, "task finished"),
                Ok(Err(e)) if token.is_cancelled() => {
                    tracing::debug!(task = %name, error = %format!("{e:#}"), "task ended during shutdown");
                }
                Ok(Err(e)) => {
                    let message = format!("{e:#}");
                    tracing::error!(task = %name, error = %message, "task failed");
                    sink.task_failed(&name, &message);
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::error!(task = %name, error = %message, panicked = true, "task failed");
                    sink.task_failed(&name, &message);
                }
            }
        }
        .instrument(span);

        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.retain(|h| !h.is_finished());
        handles.push(tokio::spawn(task));
    }

    /// Cancel every task and wait up to `grace` for them to exit.
    ///
    /// Returns the number of tasks aborted after the grace period.
    pub(crate) async fn shutdown(&self, grace: Duration) -> usize {
        self.token().cancel();
        let handles: Vec<JoinHandle<()>> =
            std::mem::take(&mut *self.handles.lock().unwrap_or_else(|e| e.into_inner()));

        let deadline = tokio::time::Instant::now() + grace;
        let mut aborted = 0;
        for mut handle in handles {
            if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                handle.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            tracing::warn!(aborted, grace_ms = grace.as_millis() as u64, "aborted tasks after grace period");
        }
        aborted
    }
}

impl Drop for TaskGroup {
    fn drop(&mut self) {
        let handles = self.handles.get_mut().unwrap_or_else(|e| e.into_inner());
        for h in handles.iter() {
            h.abort();
        }
    }
}
