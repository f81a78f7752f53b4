// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service host: runs one service through its lifecycle
//!
//! `start` and `stop` are serialized per host, and every transition is
//! validated against the lifecycle table before it is applied. Entering
//! RUNNING, STOPPING, STOPPED or ERROR publishes a status event.

use crate::blocking::BlockingProxy;
use crate::context::ServiceContext;
use crate::error::{LifecycleError, ServiceError};
use crate::lifecycle::{ServiceRecord, ServiceState};
use crate::reporting::StatusReporter;
use crate::tasks::FailureSink;
use async_trait::async_trait;
use futures::FutureExt;
use sb_core::{panic_message, Clock, SwitchboardConfig, SystemClock};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A long-lived component hosted on the bus
#[async_trait]
pub trait Service: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Subscribe to topics and spawn background work.
    ///
    /// An error moves the service to ERROR.
    async fn setup(&self, ctx: &ServiceContext) -> anyhow::Result<()>;

    /// Release service-held resources. Subscriptions and tasks are already gone.
    async fn teardown(&self, _ctx: &ServiceContext) -> anyhow::Result<()> {
        Ok(())
    }
}

struct Lifecycle<C: Clock> {
    record: Mutex<ServiceRecord>,
    clock: C,
    reporter: StatusReporter,
}

impl<C: Clock> Lifecycle<C> {
    fn snapshot(&self) -> ServiceRecord {
        self.record.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Apply a validated transition and announce it
    fn enter(
        &self,
        next: ServiceState,
        message: impl Into<String>,
    ) -> Result<ServiceRecord, LifecycleError> {
        let record = {
            let mut current = self.record.lock().unwrap_or_else(|e| e.into_inner());
            let updated = current.transition(next, message, &self.clock)?;
            *current = updated.clone();
            updated
        };

        tracing::debug!(service = %record.name, state = %record.state, "lifecycle transition");
        if let Some(status) = next.status() {
            self.reporter
                .emit_status(&record.name, status, record.message.clone());
        }
        Ok(record)
    }
}

impl<C: Clock> FailureSink for Lifecycle<C> {
    fn task_failed(&self, task: &str, message: &str) {
        let state = self.snapshot().state;
        if !matches!(state, ServiceState::Initializing | ServiceState::Running) {
            tracing::debug!(task, %state, "ignoring task failure outside running states");
            return;
        }
        if let Err(e) = self.enter(ServiceState::Error, format!("task {task} failed: {message}")) {
            tracing::debug!(task, error = %e, "task failure raced a lifecycle change");
        }
    }
}

pub struct ServiceHost<S: Service, C: Clock = SystemClock> {
    service: Arc<S>,
    lifecycle: Arc<Lifecycle<C>>,
    ctx: ServiceContext,
    stop_grace: Duration,
    op_lock: tokio::sync::Mutex<()>,
}

impl<S: Service> ServiceHost<S, SystemClock> {
    pub fn new(service: S, reporter: StatusReporter) -> Self {
        Self::with_clock(service, reporter, SystemClock)
    }

    /// Host configured with the stop grace period from `config`
    pub fn from_config(service: S, reporter: StatusReporter, config: &SwitchboardConfig) -> Self {
        Self::new(service, reporter).with_stop_grace(config.stop_grace())
    }
}

impl<S: Service, C: Clock> ServiceHost<S, C> {
    pub fn with_clock(service: S, reporter: StatusReporter, clock: C) -> Self {
        let name = service.name().to_string();
        let lifecycle = Arc::new(Lifecycle {
            record: Mutex::new(ServiceRecord::new(&name, &clock)),
            clock,
            reporter: reporter.clone(),
        });
        let sink: Arc<dyn FailureSink> = lifecycle.clone();
        let ctx = ServiceContext::new(&name, reporter, BlockingProxy::default(), sink);
        Self {
            service: Arc::new(service),
            lifecycle,
            ctx,
            stop_grace: SwitchboardConfig::default().stop_grace(),
            op_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn name(&self) -> &str {
        self.ctx.name()
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    pub fn record(&self) -> ServiceRecord {
        self.lifecycle.snapshot()
    }

    pub fn state(&self) -> ServiceState {
        self.record().state
    }

    /// CREATED/STOPPED -> INITIALIZING -> RUNNING, or ERROR if setup fails
    pub async fn start(&self) -> Result<(), ServiceError> {
        let _op = self.op_lock.lock().await;
        self.lifecycle.enter(ServiceState::Initializing, "starting")?;
        self.ctx.tasks().reset();

        let setup = AssertUnwindSafe(self.service.setup(&self.ctx))
            .catch_unwind()
            .await;
        let failure = match setup {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("{e:#}")),
            Err(panic) => Some(format!("setup panicked: {}", panic_message(panic.as_ref()))),
        };

        match failure {
            None => match self.lifecycle.enter(ServiceState::Running, "started") {
                Ok(_) => Ok(()),
                // a task spawned during setup already failed the service
                Err(_) => Err(self.setup_error(self.record().message)),
            },
            Some(message) => {
                if let Err(e) = self.lifecycle.enter(ServiceState::Error, message.clone()) {
                    tracing::debug!(error = %e, "service already failed during setup");
                }
                Err(self.setup_error(message))
            }
        }
    }

    fn setup_error(&self, message: String) -> ServiceError {
        ServiceError::Setup {
            service: self.name().to_string(),
            message,
        }
    }

    /// RUNNING/ERROR -> STOPPING -> STOPPED. A no-op once STOPPED.
    ///
    /// Owned tasks are cancelled and given the grace period to finish before
    /// they are aborted. Subscriptions are released before teardown runs.
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let _op = self.op_lock.lock().await;
        if self.state() == ServiceState::Stopped {
            tracing::debug!(service = %self.name(), "already stopped");
            return Ok(());
        }
        self.lifecycle.enter(ServiceState::Stopping, "stopping")?;

        let aborted = self.ctx.tasks().shutdown(self.stop_grace).await;
        let released = self.ctx.release_subscriptions();
        tracing::debug!(service = %self.name(), aborted, released, "service detached");

        let teardown = AssertUnwindSafe(self.service.teardown(&self.ctx))
            .catch_unwind()
            .await;
        let message = match teardown {
            Ok(Ok(())) => "stopped".to_string(),
            Ok(Err(e)) => {
                tracing::warn!(service = %self.name(), error = %format!("{e:#}"), "teardown failed");
                format!("stopped; teardown failed: {e:#}")
            }
            Err(panic) => {
                let text = panic_message(panic.as_ref());
                tracing::warn!(service = %self.name(), error = %text, "teardown panicked");
                format!("stopped; teardown panicked: {text}")
            }
        };

        self.lifecycle.enter(ServiceState::Stopped, message)?;
        Ok(())
    }
}

impl<S: Service, C: Clock> std::fmt::Debug for ServiceHost<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHost")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
