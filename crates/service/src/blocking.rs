// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxy for synchronous work
//!
//! Runs a blocking closure on tokio's blocking pool so the event loop keeps
//! dispatching. The caller stops waiting on timeout or cancellation; the
//! closure itself cannot be interrupted and finishes in the background.

use crate::error::BlockingError;
use sb_core::panic_message;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_BLOCKING_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct BlockingProxy {
    timeout: Duration,
}

impl Default for BlockingProxy {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKING_TIMEOUT)
    }
}

impl BlockingProxy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn run<T, F>(&self, op: F) -> Result<T, BlockingError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.run_until(&CancellationToken::new(), op).await
    }

    /// Like [`run`](Self::run), but gives up as soon as `cancel` fires
    pub async fn run_until<T, F>(
        &self,
        cancel: &CancellationToken,
        op: F,
    ) -> Result<T, BlockingError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(op);
        tokio::select! {
            _ = cancel.cancelled() => Err(BlockingError::Cancelled),
            joined = tokio::time::timeout(self.timeout, handle) => match joined {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) if e.is_panic() => {
                    Err(BlockingError::Panicked(panic_message(e.into_panic().as_ref())))
                }
                Ok(Err(_)) => Err(BlockingError::Cancelled),
                Err(_) => Err(BlockingError::TimedOut(self.timeout)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_the_closure_result() {
        let proxy = BlockingProxy::default();
        assert_eq!(proxy.run(|| 6 * 7).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn slow_work_times_out() {
        let proxy = BlockingProxy::new(Duration::from_millis(20));
        let err = proxy
            .run(|| std::thread::sleep(Duration::from_millis(300)))
            .await
            .unwrap_err();
        assert_eq!(err, BlockingError::TimedOut(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn panics_are_captured() {
        let proxy = BlockingProxy::default();
        let err = proxy.run(|| -> u32 { panic!("disk on fire") }).await.unwrap_err();
        assert_eq!(err, BlockingError::Panicked("disk on fire".to_string()));
    }

    #[tokio::test]
    async fn cancellation_stops_the_wait() {
        let proxy = BlockingProxy::default();
        let token = CancellationToken::new();
        token.cancel();
        let err = proxy
            .run_until(&token, || std::thread::sleep(Duration::from_millis(200)))
            .await
            .unwrap_err();
        assert_eq!(err, BlockingError::Cancelled);
    }
}
