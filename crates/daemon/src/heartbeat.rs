// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Demo services: a heartbeat publisher and a monitor that listens for it

use anyhow::Context;
use async_trait::async_trait;
use sb_core::{
    handler_fn, FieldKind, FieldSpec, Payload, RegistryBuilder, RegistryError, Schema,
};
use sb_service::{Service, ServiceContext};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const TICK: &str = "heartbeat.tick";

/// Register the topics the demo services use
pub fn register_topics(builder: RegistryBuilder) -> Result<RegistryBuilder, RegistryError> {
    builder.register(
        TICK,
        Schema::fields([
            FieldSpec::required("count", FieldKind::Integer),
            FieldSpec::required("source", FieldKind::String),
        ]),
    )
}

/// Publishes a numbered tick every `interval`
pub struct HeartbeatService {
    interval: Duration,
}

impl HeartbeatService {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Service for HeartbeatService {
    fn name(&self) -> &str {
        "heartbeat"
    }

    async fn setup(&self, ctx: &ServiceContext) -> anyhow::Result<()> {
        let interval = self.interval;
        let publisher = ctx.clone();
        ctx.spawn("tick", move |cancel| async move {
            let mut ticker = tokio::time::interval(interval);
            let mut count: u64 = 0;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    _ = ticker.tick() => {
                        count += 1;
                        let payload = Payload::data(json!({
                            "count": count,
                            "source": publisher.name(),
                        }))
                        .context("tick payload is not an object")?;
                        publisher.emit(TICK, payload)?;
                    }
                }
            }
        });
        Ok(())
    }
}

/// Counts heartbeat ticks and reports the gap between them
pub struct HeartbeatMonitor {
    seen: Arc<AtomicU64>,
}

impl HeartbeatMonitor {
    pub fn new() -> Self {
        Self {
            seen: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared count of ticks observed
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.seen)
    }
}

impl Default for HeartbeatMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Service for HeartbeatMonitor {
    fn name(&self) -> &str {
        "monitor"
    }

    async fn setup(&self, ctx: &ServiceContext) -> anyhow::Result<()> {
        let seen = Arc::clone(&self.seen);
        let last: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));
        let reporter = ctx.clone();
        ctx.subscribe(
            TICK,
            handler_fn(move |event| {
                seen.fetch_add(1, Ordering::SeqCst);
                let now = Instant::now();
                let previous = last
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .replace(now);
                if let Some(previous) = previous {
                    let gap_ms = now.duration_since(previous).as_secs_f64() * 1000.0;
                    reporter.report_metric("tick_interval", gap_ms);
                }
                tracing::trace!(count = ?event.payload.field("count"), "tick");
                async { Ok(()) }
            }),
        );
        Ok(())
    }
}
