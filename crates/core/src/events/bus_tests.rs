// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::events::handler_fn;
use crate::id::SequentialIdGen;
use crate::payload::ServiceStatus;
use crate::registry::{FieldKind, FieldSpec, Schema};
use crate::sync::EventSynchronizer;
use serde_json::json;
use std::sync::atomic::AtomicUsize;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

fn test_bus() -> EventBus {
    let registry = TopicRegistry::builder()
        .register("ping", Schema::any())
        .unwrap()
        .register(
            "speech.transcript",
            Schema::fields([FieldSpec::required("text", FieldKind::String)]),
        )
        .unwrap()
        .build();
    EventBus::with_id_gen(registry, Arc::new(SequentialIdGen::default()))
}

fn counting_handler(counter: &Arc<AtomicUsize>) -> Arc<dyn Handler> {
    let counter = Arc::clone(counter);
    handler_fn(move |_| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

struct Panicker(&'static str);

#[async_trait::async_trait]
impl Handler for Panicker {
    async fn handle(&self, _event: &Event) -> anyhow::Result<()> {
        panic!("{}", self.0)
    }
}

fn failing_handler(message: &'static str) -> Arc<dyn Handler> {
    handler_fn(move |_| async move { Err(anyhow::anyhow!(message)) })
}

#[tokio::test]
async fn emit_schedules_one_execution_per_subscriber() {
    let bus = test_bus();
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        bus.subscribe("ping", counting_handler(&counter));
    }

    let scheduled = bus.emit("ping", Payload::empty()).unwrap();
    assert_eq!(scheduled, 3);

    EventSynchronizer::new()
        .wait_for_condition(
            || counter.load(Ordering::SeqCst) == 3,
            Duration::from_secs(1),
            "all three handlers should run",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn emit_returns_before_handlers_finish() {
    let bus = test_bus();
    let release = Arc::new(Notify::new());
    let finished = Arc::new(AtomicBool::new(false));

    let (r, f) = (Arc::clone(&release), Arc::clone(&finished));
    bus.subscribe(
        "ping",
        handler_fn(move |_| {
            let (r, f) = (Arc::clone(&r), Arc::clone(&f));
            async move {
                r.notified().await;
                f.store(true, Ordering::SeqCst);
                Ok(())
            }
        }),
    );

    assert_eq!(bus.emit("ping", Payload::empty()).unwrap(), 1);
    assert!(!finished.load(Ordering::SeqCst));

    release.notify_one();
    EventSynchronizer::new()
        .wait_for_condition(
            || finished.load(Ordering::SeqCst),
            Duration::from_secs(1),
            "handler should finish once released",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn emit_with_no_subscribers_schedules_nothing() {
    let bus = test_bus();
    assert_eq!(bus.emit("ping", Payload::empty()).unwrap(), 0);
    assert_eq!(bus.emitted(), 1);
}

#[tokio::test]
async fn invalid_payload_invokes_no_handlers() {
    let bus = test_bus();
    let counter = Arc::new(AtomicUsize::new(0));
    bus.subscribe("speech.transcript", counting_handler(&counter));
    let mut tap = bus.tap();

    let err = bus
        .emit_and_wait("speech.transcript", Payload::data(json!({"lang": "en"})).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BusError::Schema(crate::SchemaValidationError::MissingField { ref field, .. }) if field == "text"
    ));
    tokio::task::yield_now().await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert!(tap.try_recv().is_err());
    assert_eq!(bus.emitted(), 0);
}

#[tokio::test]
async fn failed_handler_does_not_affect_siblings() {
    let bus = test_bus();
    let counter = Arc::new(AtomicUsize::new(0));
    bus.subscribe("ping", failing_handler("first"));
    bus.subscribe("ping", Arc::new(Panicker("second")));
    bus.subscribe("ping", counting_handler(&counter));

    let outcomes = bus.emit_and_wait("ping", Payload::empty()).await.unwrap();

    assert_eq!(outcomes.len(), 3);
    let first = outcomes[0].error().unwrap();
    assert_eq!(first.message, "first");
    assert!(!first.panicked);
    let second = outcomes[1].error().unwrap();
    assert_eq!(second.message, "second");
    assert!(second.panicked);
    assert!(outcomes[2].is_success());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(bus.subscriber_count_for(&Topic::new("ping")), 3);
}

#[tokio::test]
async fn handler_failure_is_published_with_owner_name() {
    let bus = test_bus();
    let mut tap = bus.tap();
    bus.subscribe_as("ping", "dialogue", failing_handler("no model"));

    bus.emit_and_wait("ping", Payload::empty()).await.unwrap();

    let ping = tap.try_recv().unwrap();
    assert_eq!(ping.topic, "ping");
    let error = tap.try_recv().unwrap();
    assert_eq!(error.topic, Topic::service_error());
    let payload = error.payload.as_error().unwrap();
    assert_eq!(payload.service_name, "dialogue");
    assert_eq!(payload.origin_topic, "ping");
    assert_eq!(payload.message, "no model");
}

#[tokio::test]
async fn failures_on_reserved_topics_are_not_republished() {
    let bus = test_bus();
    let mut tap = bus.tap();
    bus.subscribe(Topic::service_error(), failing_handler("monitor down"));

    let outcomes = bus
        .emit_and_wait(Topic::service_error(), Payload::error("ear", "ping", "boom"))
        .await
        .unwrap();

    assert!(!outcomes[0].is_success());
    assert!(tap.try_recv().is_ok());
    assert!(tap.try_recv().is_err());
}

#[tokio::test]
async fn strict_mode_surfaces_first_failure() {
    let bus = test_bus();
    bus.subscribe("ping", failing_handler("bad"));

    let err = bus
        .emit_and_wait_strict("ping", Payload::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, BusError::Handler(HandlerError { ref message, .. }) if message == "bad"));

    let bus = test_bus();
    let counter = Arc::new(AtomicUsize::new(0));
    bus.subscribe("ping", counting_handler(&counter));
    let outcomes = bus.emit_and_wait_strict("ping", Payload::empty()).await.unwrap();
    assert_eq!(outcomes.len(), 1);
}

#[tokio::test]
async fn unsubscribe_during_dispatch_affects_only_later_events() {
    let bus = test_bus();
    let counter = Arc::new(AtomicUsize::new(0));
    let victim: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

    let (b, v) = (bus.clone(), Arc::clone(&victim));
    bus.subscribe(
        "ping",
        handler_fn(move |_| {
            let id = v.lock().unwrap().clone();
            if let Some(id) = id {
                b.unsubscribe(&id);
            }
            async { Ok(()) }
        }),
    );
    let id = bus.subscribe("ping", counting_handler(&counter));
    *victim.lock().unwrap() = Some(id);

    let first = bus.emit_and_wait("ping", Payload::empty()).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    let second = bus.emit_and_wait("ping", Payload::empty()).await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn unsubscribe_removes_subscriber() {
    let bus = test_bus();
    let id = bus.subscribe("ping", failing_handler("unused"));
    assert_eq!(bus.subscriber_count(), 1);
    assert_eq!(id, SubscriptionId("sub-1".to_string()));

    assert!(bus.unsubscribe(&id));
    assert!(!bus.unsubscribe(&id));
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn emit_outside_runtime_is_rejected() {
    let bus = test_bus();
    let err = bus.emit("ping", Payload::empty()).unwrap_err();
    assert!(matches!(err, BusError::NoRuntime));
}

#[tokio::test]
async fn closed_bus_rejects_emits() {
    let bus = test_bus();
    bus.clone().close();
    assert!(matches!(
        bus.emit("ping", Payload::empty()),
        Err(BusError::Closed)
    ));
}

#[tokio::test]
async fn handlers_see_their_dispatch_topic() {
    let bus = test_bus();
    let seen: Arc<Mutex<Option<Topic>>> = Arc::new(Mutex::new(None));
    let s = Arc::clone(&seen);
    bus.subscribe(
        "ping",
        handler_fn(move |_| {
            let s = Arc::clone(&s);
            async move {
                *s.lock().unwrap() = current_dispatch_topic();
                Ok(())
            }
        }),
    );

    assert!(current_dispatch_topic().is_none());
    bus.emit_and_wait("ping", Payload::empty()).await.unwrap();
    assert_eq!(seen.lock().unwrap().clone(), Some(Topic::new("ping")));
}

#[tokio::test]
async fn sequential_emits_get_increasing_sequence() {
    let bus = test_bus();
    let mut tap = bus.tap();
    for _ in 0..5 {
        bus.emit("ping", Payload::empty()).unwrap();
    }
    bus.emit(Topic::status_changed(), Payload::status("ear", ServiceStatus::Running, ""))
        .unwrap();

    let mut sequences = Vec::new();
    while let Ok(event) = tap.try_recv() {
        sequences.push(event.sequence);
    }
    assert_eq!(sequences, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn clone_shares_state() {
    let bus1 = test_bus();
    let bus2 = bus1.clone();
    bus1.subscribe("ping", failing_handler("unused"));

    assert_eq!(bus1.subscriber_count(), 1);
    assert_eq!(bus2.subscriber_count(), 1);
    assert_eq!(bus2.list_subscriptions()[0].topic, "ping");
}
