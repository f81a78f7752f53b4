// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status board: a live view of every service's reported health
//!
//! Subscribes to the reserved status and metrics topics and keeps the latest
//! status per service, a bounded history, and running metric aggregates that
//! are logged and reset on every flush.

use sb_core::{
    handler_fn, EventBus, ServiceStatus, SubscriptionId, SwitchboardConfig, Topic,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const BOARD_OWNER: &str = "status-board";

#[derive(Debug, Clone, PartialEq)]
pub struct StatusEntry {
    pub sequence: u64,
    pub status: ServiceStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MetricKey {
    pub service: String,
    pub metric: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSummary {
    pub count: u64,
    pub total_ms: f64,
    pub max_ms: f64,
    /// Samples above the configured threshold
    pub breaches: u64,
}

impl MetricSummary {
    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }

    fn record(&mut self, value_ms: f64, threshold: Option<f64>) {
        self.count += 1;
        self.total_ms += value_ms;
        self.max_ms = self.max_ms.max(value_ms);
        if threshold.is_some_and(|limit| value_ms > limit) {
            self.breaches += 1;
        }
    }
}

struct BoardState {
    latest: BTreeMap<String, StatusEntry>,
    history: BTreeMap<String, VecDeque<StatusEntry>>,
    metrics: BTreeMap<MetricKey, MetricSummary>,
    history_limit: usize,
    thresholds: BTreeMap<String, f64>,
}

#[derive(Clone)]
pub struct StatusBoard {
    state: Arc<Mutex<BoardState>>,
    bus: EventBus,
    subscriptions: Vec<SubscriptionId>,
}

impl StatusBoard {
    /// Subscribe a new board to `bus`
    pub fn attach(bus: &EventBus, config: &SwitchboardConfig) -> Self {
        let state = Arc::new(Mutex::new(BoardState {
            latest: BTreeMap::new(),
            history: BTreeMap::new(),
            metrics: BTreeMap::new(),
            history_limit: config.max_queue_size.max(1),
            thresholds: config.performance_thresholds.clone(),
        }));

        let s = Arc::clone(&state);
        let status_sub = bus.subscribe_as(
            Topic::status_changed(),
            BOARD_OWNER,
            handler_fn(move |event| {
                if let Some(status) = event.payload.as_status() {
                    let entry = StatusEntry {
                        sequence: event.sequence,
                        status: status.status,
                        message: status.message.clone(),
                    };
                    let mut state = s.lock().unwrap_or_else(|e| e.into_inner());
                    let limit = state.history_limit;
                    let history = state.history.entry(status.service_name.clone()).or_default();
                    history.push_back(entry.clone());
                    while history.len() > limit {
                        history.pop_front();
                    }
                    state.latest.insert(status.service_name.clone(), entry);
                }
                async { Ok(()) }
            }),
        );

        let s = Arc::clone(&state);
        let metric_sub = bus.subscribe_as(
            Topic::performance(),
            BOARD_OWNER,
            handler_fn(move |event| {
                if let Some(metric) = event.payload.as_metric() {
                    let mut state = s.lock().unwrap_or_else(|e| e.into_inner());
                    let threshold = state.thresholds.get(&metric.metric_name).copied();
                    let key = MetricKey {
                        service: metric.service_name.clone(),
                        metric: metric.metric_name.clone(),
                    };
                    state.metrics.entry(key).or_default().record(metric.value_ms, threshold);
                }
                async { Ok(()) }
            }),
        );

        Self {
            state,
            bus: bus.clone(),
            subscriptions: vec![status_sub, metric_sub],
        }
    }

    pub fn detach(&self) {
        for id in &self.subscriptions {
            self.bus.unsubscribe(id);
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&BoardState) -> T) -> T {
        f(&self.state.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn latest(&self, service: &str) -> Option<StatusEntry> {
        self.with_state(|s| s.latest.get(service).cloned())
    }

    /// Latest status of every service that has reported, by name
    pub fn snapshot(&self) -> BTreeMap<String, StatusEntry> {
        self.with_state(|s| s.latest.clone())
    }

    /// Recent statuses of `service`, oldest first
    pub fn history(&self, service: &str) -> Vec<StatusEntry> {
        self.with_state(|s| {
            s.history
                .get(service)
                .map(|h| h.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    /// WARNING entries still in any service's history
    pub fn warnings(&self) -> Vec<(String, StatusEntry)> {
        self.with_state(|s| {
            let mut warnings: Vec<(String, StatusEntry)> = s
                .history
                .iter()
                .flat_map(|(name, h)| {
                    h.iter()
                        .filter(|e| e.status == ServiceStatus::Warning)
                        .map(move |e| (name.clone(), e.clone()))
                })
                .collect();
            warnings.sort_by_key(|(_, e)| e.sequence);
            warnings
        })
    }

    pub fn metrics(&self) -> BTreeMap<MetricKey, MetricSummary> {
        self.with_state(|s| s.metrics.clone())
    }

    /// Log the metric aggregates collected since the last flush and reset them
    pub fn flush(&self) -> BTreeMap<MetricKey, MetricSummary> {
        let drained = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut state.metrics)
        };
        for (key, summary) in &drained {
            tracing::info!(
                service = %key.service,
                metric = %key.metric,
                count = summary.count,
                mean_ms = summary.mean_ms(),
                max_ms = summary.max_ms,
                breaches = summary.breaches,
                "metric summary"
            );
        }
        drained
    }

    /// Flush every `interval` until `cancel` fires, then flush once more
    pub fn spawn_flush(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let board = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        board.flush();
                    }
                }
            }
            board.flush();
        })
    }
}

impl std::fmt::Debug for StatusBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusBoard")
            .field("services", &self.with_state(|s| s.latest.len()))
            .finish()
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod tests;
