//! Persisted and transient domain types.

use serde::{Deserialize, Serialize};

/// Identifier of the single counter row.
pub const COUNTER_ID: i32 = 1;

/// The one persisted entity: a durable hit total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    pub id: i32,
    pub total: u64,
}

impl CounterRecord {
    /// Seed row written by bootstrap and by the counter's self-heal step.
    pub const fn seed() -> Self {
        Self {
            id: COUNTER_ID,
            total: 0,
        }
    }
}

/// Startup gating state of the store connection.
///
/// Only the readiness probe drives this machine. Once `Ready`, later query
/// failures are reported per call and never move it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreConnectionState {
    #[default]
    Disconnected,
    Probing,
    Ready,
    /// Terminal: the retry budget was exhausted.
    Unreachable,
}

impl StoreConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreConnectionState::Disconnected => "disconnected",
            StoreConnectionState::Probing => "probing",
            StoreConnectionState::Ready => "ready",
            StoreConnectionState::Unreachable => "unreachable",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StoreConnectionState::Ready | StoreConnectionState::Unreachable
        )
    }
}

/// Result of an on-demand health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}
