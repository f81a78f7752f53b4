// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus for routing validated events to topic subscribers
//!
//! `emit` validates the payload against the registry, snapshots the
//! subscribers of the topic and spawns one task per handler. Handlers never
//! see each other's failures: an error or panic is logged, converted into a
//! `service.error` event, and reported in the outcome of `emit_and_wait`.

use super::event::Event;
use super::handler::Handler;
use super::subscription::{Subscription, SubscriptionId};
use crate::error::{BusError, HandlerError};
use crate::id::{IdGen, UuidIdGen};
use crate::payload::Payload;
use crate::registry::TopicRegistry;
use crate::topic::Topic;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Receiver for every event accepted by the bus
pub type EventReceiver = mpsc::UnboundedReceiver<Arc<Event>>;

tokio::task_local! {
    static DISPATCHING: Topic;
}

/// Topic whose handler is running on the current task, if any
pub fn current_dispatch_topic() -> Option<Topic> {
    DISPATCHING.try_with(|topic| topic.clone()).ok()
}

/// Result of one handler execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Succeeded { subscription: SubscriptionId },
    Failed(HandlerError),
}

impl HandlerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, HandlerOutcome::Succeeded { .. })
    }

    pub fn subscription(&self) -> &SubscriptionId {
        match self {
            HandlerOutcome::Succeeded { subscription } => subscription,
            HandlerOutcome::Failed(err) => &err.subscription,
        }
    }

    pub fn error(&self) -> Option<&HandlerError> {
        match self {
            HandlerOutcome::Failed(err) => Some(err),
            HandlerOutcome::Succeeded { .. } => None,
        }
    }
}

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    owner: Option<String>,
    handler: Arc<dyn Handler>,
}

struct Scheduled {
    id: SubscriptionId,
    owner: Option<String>,
    topic: Topic,
    handle: JoinHandle<HandlerOutcome>,
}

/// The event bus routes validated events to the subscribers of their topic
pub struct EventBus {
    registry: Arc<TopicRegistry>,
    subscribers: Arc<RwLock<HashMap<Topic, Vec<Subscriber>>>>,
    /// Receivers of every accepted event (recorders, monitors)
    taps: Arc<RwLock<Vec<mpsc::UnboundedSender<Arc<Event>>>>>,
    ids: Arc<dyn IdGen>,
    sequence: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl EventBus {
    pub fn new(registry: Arc<TopicRegistry>) -> Self {
        Self::with_id_gen(registry, Arc::new(UuidIdGen))
    }

    /// Create a bus whose subscription tokens come from `ids`
    pub fn with_id_gen(registry: Arc<TopicRegistry>, ids: Arc<dyn IdGen>) -> Self {
        Self {
            registry,
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            taps: Arc::new(RwLock::new(Vec::new())),
            ids,
            sequence: Arc::new(AtomicU64::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    /// Subscribe a handler to a topic
    pub fn subscribe(&self, topic: impl Into<Topic>, handler: Arc<dyn Handler>) -> SubscriptionId {
        self.insert(topic.into(), None, handler)
    }

    /// Subscribe a handler on behalf of a named service.
    ///
    /// Failures of this handler are reported under the owner's name.
    pub fn subscribe_as(
        &self,
        topic: impl Into<Topic>,
        owner: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> SubscriptionId {
        self.insert(topic.into(), Some(owner.into()), handler)
    }

    fn insert(&self, topic: Topic, owner: Option<String>, handler: Arc<dyn Handler>) -> SubscriptionId {
        let id = SubscriptionId(self.ids.next());
        tracing::debug!(%topic, subscription = %id, owner = owner.as_deref(), "subscribe");

        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subs.entry(topic).or_default().push(Subscriber {
            id: id.clone(),
            owner,
            handler,
        });
        id
    }

    /// Remove a subscription.
    ///
    /// Handlers already scheduled for an in-flight event still run.
    /// Returns false if the token was unknown.
    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        let mut removed = false;
        subs.retain(|_, list| {
            let before = list.len();
            list.retain(|s| &s.id != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        if removed {
            tracing::debug!(subscription = %id, "unsubscribe");
        }
        removed
    }

    /// Receive every event the bus accepts, regardless of topic
    pub fn tap(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut taps = self.taps.write().unwrap_or_else(|e| e.into_inner());
        taps.push(tx);
        rx
    }

    /// Validate and dispatch without waiting for handlers.
    ///
    /// Returns the number of handler executions scheduled.
    pub fn emit(&self, topic: impl Into<Topic>, payload: Payload) -> Result<usize, BusError> {
        let scheduled = self.schedule(topic.into(), payload)?;
        Ok(scheduled.len())
    }

    /// Validate, dispatch, and wait for every handler.
    ///
    /// Outcomes are returned in subscription order. Handler failures are
    /// reported in the outcomes, never as an `Err`.
    pub async fn emit_and_wait(
        &self,
        topic: impl Into<Topic>,
        payload: Payload,
    ) -> Result<Vec<HandlerOutcome>, BusError> {
        let scheduled = self.schedule(topic.into(), payload)?;
        let mut outcomes = Vec::with_capacity(scheduled.len());
        for s in scheduled {
            let outcome = match s.handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => HandlerOutcome::Failed(HandlerError {
                    subscription: s.id,
                    owner: s.owner,
                    topic: s.topic,
                    message: format!("handler task did not complete: {}", join_err),
                    panicked: join_err.is_panic(),
                }),
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Like [`emit_and_wait`](Self::emit_and_wait), but the first handler
    /// failure becomes the error.
    pub async fn emit_and_wait_strict(
        &self,
        topic: impl Into<Topic>,
        payload: Payload,
    ) -> Result<Vec<HandlerOutcome>, BusError> {
        let outcomes = self.emit_and_wait(topic, payload).await?;
        if let Some(err) = outcomes.iter().find_map(HandlerOutcome::error) {
            return Err(BusError::Handler(err.clone()));
        }
        Ok(outcomes)
    }

    fn schedule(&self, topic: Topic, payload: Payload) -> Result<Vec<Scheduled>, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        self.registry.validate(&topic, &payload)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BusError::NoRuntime)?;

        let event = Arc::new(Event {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            topic,
            payload,
            emitted_at: Instant::now(),
        });

        self.send_to_taps(&event);

        let snapshot: Vec<Subscriber> = {
            let subs = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
            subs.get(&event.topic).cloned().unwrap_or_default()
        };

        tracing::trace!(
            topic = %event.topic,
            sequence = event.sequence,
            handlers = snapshot.len(),
            "dispatch"
        );

        Ok(snapshot
            .into_iter()
            .map(|sub| {
                let id = sub.id.clone();
                let owner = sub.owner.clone();
                let handle = runtime.spawn(run_handler(self.clone(), sub, Arc::clone(&event)));
                Scheduled {
                    id,
                    owner,
                    topic: event.topic.clone(),
                    handle,
                }
            })
            .collect())
    }

    fn send_to_taps(&self, event: &Arc<Event>) {
        let mut taps = self.taps.write().unwrap_or_else(|e| e.into_inner());
        taps.retain(|tx| tx.send(Arc::clone(event)).is_ok());
    }

    /// Log a contained handler failure and publish it on `service.error`.
    ///
    /// Failures while dispatching a reserved topic are only logged, so error
    /// reporting can never feed itself.
    fn report_failure(&self, err: &HandlerError) {
        tracing::error!(
            topic = %err.topic,
            subscription = %err.subscription,
            owner = err.owner.as_deref(),
            panicked = err.panicked,
            error = %err.message,
            "handler failed"
        );

        if err.topic.is_reserved() {
            return;
        }

        let payload = Payload::error(err.reporter(), err.topic.clone(), err.message.clone());
        if let Err(e) = self.emit(Topic::service_error(), payload) {
            tracing::warn!(error = %e, "could not publish handler failure");
        }
    }

    /// Reject every later emit
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of events accepted so far
    pub fn emitted(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Get count of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn subscriber_count_for(&self, topic: &Topic) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(topic)
            .map_or(0, Vec::len)
    }

    /// List all live subscriptions
    pub fn list_subscriptions(&self) -> Vec<Subscription> {
        let subs = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
        let mut list: Vec<Subscription> = subs
            .iter()
            .flat_map(|(topic, entries)| {
                entries.iter().map(move |s| Subscription {
                    id: s.id.clone(),
                    topic: topic.clone(),
                    owner: s.owner.clone(),
                })
            })
            .collect();
        list.sort_by(|a, b| a.topic.cmp(&b.topic));
        list
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            subscribers: Arc::clone(&self.subscribers),
            taps: Arc::clone(&self.taps),
            ids: Arc::clone(&self.ids),
            sequence: Arc::clone(&self.sequence),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("emitted", &self.emitted())
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn run_handler(bus: EventBus, sub: Subscriber, event: Arc<Event>) -> HandlerOutcome {
    let result = DISPATCHING
        .scope(
            event.topic.clone(),
            AssertUnwindSafe(sub.handler.handle(&event)).catch_unwind(),
        )
        .await;

    let (message, panicked) = match result {
        Ok(Ok(())) => return HandlerOutcome::Succeeded { subscription: sub.id },
        Ok(Err(err)) => (format!("{:#}", err), false),
        Err(panic) => (panic_message(panic.as_ref()), true),
    };

    let err = HandlerError {
        subscription: sub.id,
        owner: sub.owner,
        topic: event.topic.clone(),
        message,
        panicked,
    };
    bus.report_failure(&err);
    HandlerOutcome::Failed(err)
}

/// Text carried by a caught panic
pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
