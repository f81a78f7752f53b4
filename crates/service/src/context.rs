// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capabilities handed to a service
//!
//! A `ServiceContext` is the only way a service touches the bus. It tags
//! subscriptions with the service name, tracks them for release on stop,
//! and owns the service's background tasks.

use crate::blocking::BlockingProxy;
use crate::error::BlockingError;
use crate::reporting::StatusReporter;
use crate::tasks::{FailureSink, TaskGroup};
use sb_core::{
    BusError, EventBus, Handler, HandlerOutcome, Payload, ServiceStatus, SubscriptionId, Topic,
};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

#[derive(Clone)]
pub struct ServiceContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    name: String,
    reporter: StatusReporter,
    span: tracing::Span,
    tasks: TaskGroup,
    subscriptions: Mutex<Vec<SubscriptionId>>,
    blocking: BlockingProxy,
    failures: Arc<dyn FailureSink>,
}

impl ServiceContext {
    pub(crate) fn new(
        name: &str,
        reporter: StatusReporter,
        blocking: BlockingProxy,
        failures: Arc<dyn FailureSink>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name: name.to_string(),
                reporter,
                span: tracing::info_span!("service", service = %name),
                tasks: TaskGroup::new(),
                subscriptions: Mutex::new(Vec::new()),
                blocking,
                failures,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn bus(&self) -> &EventBus {
        self.inner.reporter.bus()
    }

    pub fn reporter(&self) -> &StatusReporter {
        &self.inner.reporter
    }

    /// Span carrying the service name
    pub fn span(&self) -> &tracing::Span {
        &self.inner.span
    }

    /// Subscribe on behalf of this service. Released automatically on stop.
    pub fn subscribe(&self, topic: impl Into<Topic>, handler: Arc<dyn Handler>) -> SubscriptionId {
        let id = self.bus().subscribe_as(topic, self.name(), handler);
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(id.clone());
        id
    }

    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|held| held != id);
        self.bus().unsubscribe(id)
    }

    /// Subscriptions currently held by this service
    pub fn subscriptions(&self) -> Vec<SubscriptionId> {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn release_subscriptions(&self) -> usize {
        let held = std::mem::take(
            &mut *self
                .inner
                .subscriptions
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );
        held.iter().filter(|id| self.bus().unsubscribe(id)).count()
    }

    pub fn emit(&self, topic: impl Into<Topic>, payload: Payload) -> Result<usize, BusError> {
        self.bus().emit(topic, payload)
    }

    pub async fn emit_and_wait(
        &self,
        topic: impl Into<Topic>,
        payload: Payload,
    ) -> Result<Vec<HandlerOutcome>, BusError> {
        self.bus().emit_and_wait(topic, payload).await
    }

    /// Publish a WARNING status for this service
    pub fn warn(&self, message: impl Into<String>) -> bool {
        self.inner
            .reporter
            .emit_status(self.name(), ServiceStatus::Warning, message)
    }

    /// Report a timing measurement. Returns whether its threshold was breached.
    pub fn report_metric(&self, metric_name: &str, value_ms: f64) -> bool {
        self.inner
            .reporter
            .emit_performance_metric(self.name(), metric_name, value_ms)
    }

    /// Await `fut` and report how long it took under `metric_name`
    pub async fn time<F: Future>(&self, metric_name: &str, fut: F) -> F::Output {
        let started = Instant::now();
        let output = fut.await;
        self.report_metric(metric_name, started.elapsed().as_secs_f64() * 1000.0);
        output
    }

    /// Token cancelled when this service stops
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.tasks.token()
    }

    /// Spawn a background task owned by this service.
    ///
    /// The task receives the service's cancellation token and should return
    /// promptly once it fires. An error or panic while the service is running
    /// moves it to ERROR.
    pub fn spawn<F, Fut>(&self, task_name: &str, f: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let fut = f(self.cancellation());
        let span = tracing::debug_span!(parent: &self.inner.span, "task", task = %task_name);
        self.inner.tasks.spawn(
            task_name.to_string(),
            fut,
            span,
            Arc::clone(&self.inner.failures),
        );
    }

    /// Number of owned tasks still running
    pub fn active_tasks(&self) -> usize {
        self.inner.tasks.active()
    }

    /// Run synchronous work off the event loop, abandoning it if the service stops
    pub async fn run_blocking<T, F>(&self, op: F) -> Result<T, BlockingError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let token = self.cancellation();
        self.inner
            .blocking
            .run_until(&token, op)
            .instrument(self.inner.span.clone())
            .await
    }

    pub(crate) fn tasks(&self) -> &TaskGroup {
        &self.inner.tasks
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("name", &self.inner.name)
            .field("subscriptions", &self.subscriptions().len())
            .field("tasks", &self.active_tasks())
            .finish()
    }
}
