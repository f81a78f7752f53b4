// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level assembly: one bus, one status board, many hosted services
//!
//! Services start in registration order and stop in reverse order. The bus
//! is closed only after every service has stopped.

use crate::heartbeat::{self, HeartbeatMonitor, HeartbeatService};
use async_trait::async_trait;
use sb_core::{Clock, EventBus, RegistryError, SwitchboardConfig, TopicRegistry};
use sb_service::{
    LifecycleError, Service, ServiceError, ServiceHost, ServiceState, StatusBoard, StatusReporter,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Object-safe view of a [`ServiceHost`]
#[async_trait]
pub trait Hosted: Send + Sync {
    fn name(&self) -> &str;
    fn state(&self) -> ServiceState;
    async fn start(&self) -> Result<(), ServiceError>;
    async fn stop(&self) -> Result<(), LifecycleError>;
}

#[async_trait]
impl<S: Service, C: Clock> Hosted for ServiceHost<S, C> {
    fn name(&self) -> &str {
        ServiceHost::name(self)
    }

    fn state(&self) -> ServiceState {
        ServiceHost::state(self)
    }

    async fn start(&self) -> Result<(), ServiceError> {
        ServiceHost::start(self).await
    }

    async fn stop(&self) -> Result<(), LifecycleError> {
        ServiceHost::stop(self).await
    }
}

pub struct Switchboard {
    config: SwitchboardConfig,
    bus: EventBus,
    board: StatusBoard,
    hosts: Vec<Box<dyn Hosted>>,
    flush_cancel: CancellationToken,
    flush: Option<JoinHandle<()>>,
}

impl Switchboard {
    pub fn new(config: SwitchboardConfig, registry: Arc<TopicRegistry>) -> Self {
        let bus = EventBus::new(registry);
        let board = StatusBoard::attach(&bus, &config);
        Self {
            config,
            bus,
            board,
            hosts: Vec::new(),
            flush_cancel: CancellationToken::new(),
            flush: None,
        }
    }

    /// The heartbeat demo: a publisher ticking every `tick` and a monitor
    pub fn demo(config: SwitchboardConfig, tick: Duration) -> Result<Self, RegistryError> {
        let registry = heartbeat::register_topics(TopicRegistry::builder())?.build();
        let mut switchboard = Self::new(config, registry);
        switchboard.host(HeartbeatService::new(tick));
        switchboard.host(HeartbeatMonitor::new());
        Ok(switchboard)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    pub fn reporter(&self) -> StatusReporter {
        StatusReporter::from_config(self.bus.clone(), &self.config)
    }

    /// Add a service. It is started by the next [`start`](Self::start).
    pub fn host<S: Service>(&mut self, service: S) -> &mut Self {
        let host = ServiceHost::from_config(service, self.reporter(), &self.config);
        self.hosts.push(Box::new(host));
        self
    }

    pub fn states(&self) -> Vec<(String, ServiceState)> {
        self.hosts
            .iter()
            .map(|h| (h.name().to_string(), h.state()))
            .collect()
    }

    /// Start every hosted service. Returns how many failed to start.
    pub async fn start(&mut self) -> usize {
        if self.flush.is_none() {
            self.flush = Some(
                self.board
                    .spawn_flush(self.config.flush_interval(), self.flush_cancel.clone()),
            );
        }

        let mut failed = 0;
        for host in &self.hosts {
            match host.start().await {
                Ok(()) => tracing::info!(service = host.name(), "service started"),
                Err(e) => {
                    failed += 1;
                    tracing::error!(service = host.name(), error = %e, "service failed to start");
                }
            }
        }
        failed
    }

    /// Stop every service, flush metrics and close the bus.
    ///
    /// Returns the final state of each service in registration order.
    pub async fn shutdown(mut self) -> Vec<(String, ServiceState)> {
        for host in self.hosts.iter().rev() {
            if let Err(e) = host.stop().await {
                tracing::warn!(service = host.name(), error = %e, "service did not stop cleanly");
            }
        }

        self.flush_cancel.cancel();
        if let Some(flush) = self.flush.take() {
            if let Err(e) = flush.await {
                tracing::warn!(error = %e, "metrics flush task failed");
            }
        }
        self.board.detach();
        self.bus.close();
        tracing::info!(events = self.bus.emitted(), "switchboard stopped");
        self.states()
    }
}

#[cfg(test)]
#[path = "switchboard_tests.rs"]
mod tests;
