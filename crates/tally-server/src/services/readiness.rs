//! Startup readiness gate.
//!
//! Polls the store with a liveness query until it answers or the retry
//! budget runs out. This is the only place where an unreachable store is
//! fatal; everything after `Ready` reports store failures per call.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use tally_core::error::{Result, TallyError};
use tally_core::StoreConnectionState;

use crate::store::Store;

pub struct ReadinessProbe {
    store: Arc<dyn Store>,
    state: watch::Sender<StoreConnectionState>,
}

impl ReadinessProbe {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let (state, _) = watch::channel(StoreConnectionState::Disconnected);
        Self { store, state }
    }

    pub fn state(&self) -> StoreConnectionState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<StoreConnectionState> {
        self.state.subscribe()
    }

    fn transition(&self, next: StoreConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            tracing::debug!(from = prev.as_str(), to = next.as_str(), "store state");
        }
    }

    /// Block until the store answers a liveness query.
    ///
    /// Sleeps `interval` between failed attempts, never after the last one.
    /// Exhausting `max_attempts` moves the state to `Unreachable` and returns
    /// `StoreUnreachable`; the caller must not start serving.
    pub async fn await_ready(&self, max_attempts: u32, interval: Duration) -> Result<()> {
        match self.state() {
            StoreConnectionState::Ready => return Ok(()),
            StoreConnectionState::Unreachable => {
                return Err(TallyError::StoreUnreachable {
                    attempts: max_attempts,
                })
            }
            _ => {}
        }

        for attempt in 1..=max_attempts {
            self.transition(StoreConnectionState::Probing);

            match self.store.ping().await {
                Ok(()) => {
                    self.transition(StoreConnectionState::Ready);
                    tracing::info!(
                        backend = self.store.backend(),
                        attempt,
                        "store ready"
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(attempt, max_attempts, error = %e, "store not ready");
                    if attempt < max_attempts {
                        tokio::time::sleep(interval).await;
                    }
                }
            }
        }

        self.transition(StoreConnectionState::Unreachable);
        tracing::error!(attempts = max_attempts, "store unreachable, giving up");
        Err(TallyError::StoreUnreachable {
            attempts: max_attempts,
        })
    }
}
