//! Per-node startup lifecycle.

use std::future::Future;

use eyre::Result;
use strum::Display;
use tracing::{debug, info, warn};

use crate::availability::RetryPolicy;

/// Where a node is in its startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NodeState {
    /// Nothing has been requested from the platform yet.
    Created,
    /// The service is being created.
    Starting,
    /// The service runs and its readiness probe is being polled.
    AwaitingHealth,
    /// The readiness probe succeeded.
    Healthy,
    /// Startup failed. Terminal.
    Failed,
}

impl NodeState {
    /// Whether no further transition can happen.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Healthy | Self::Failed)
    }
}

/// Drives one service through `Created → Starting → AwaitingHealth → Healthy | Failed`.
///
/// Service creation runs exactly once. Only the health phase is retried, under the
/// [`RetryPolicy`] of the client kind.
#[derive(Debug, Clone)]
pub struct NodeStartup {
    service: String,
    history: Vec<NodeState>,
}

impl NodeStartup {
    /// Starts tracking the named service in [`NodeState::Created`].
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into(), history: vec![NodeState::Created] }
    }

    /// The service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Current state.
    pub fn state(&self) -> NodeState {
        self.history.last().copied().unwrap_or(NodeState::Created)
    }

    /// Every state visited so far, oldest first.
    pub fn history(&self) -> &[NodeState] {
        &self.history
    }

    fn transition(&mut self, next: NodeState) {
        let from = self.state();
        if from.is_terminal() {
            return;
        }
        if next == NodeState::Failed {
            warn!(service = %self.service, %from, "node startup failed");
        } else {
            info!(service = %self.service, state = %next, "node state changed");
        }
        self.history.push(next);
    }

    /// Awaits service creation. Creation failures are not retried.
    pub async fn start<H, F>(&mut self, create: F) -> Result<H>
    where
        F: Future<Output = Result<H>>,
    {
        self.transition(NodeState::Starting);
        let handle = self.record(create.await)?;
        self.transition(NodeState::AwaitingHealth);
        Ok(handle)
    }

    /// Polls `probe` under `policy` until it succeeds or the budget is spent.
    pub async fn await_health<T, P, Fut>(&mut self, policy: RetryPolicy, probe: P) -> Result<T>
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        debug!(
            service = %self.service,
            max_retries = policy.max_retries,
            interval = ?policy.interval,
            "waiting for node to become healthy"
        );
        let value = self.record(policy.wait(probe).await)?;
        self.transition(NodeState::Healthy);
        Ok(value)
    }

    /// Marks the node failed if `result` is an error and passes it through.
    pub fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.transition(NodeState::Failed);
        }
        result
    }
}
