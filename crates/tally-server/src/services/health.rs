//! Delayed health probe.
//!
//! Every check waits a fixed delay before issuing a liveness query. The
//! delay models a slow dependency chain and is part of the observable
//! contract of `/health`; the default is 5000 ms.

use std::sync::Arc;
use std::time::Duration;

use tally_core::HealthStatus;

use crate::store::Store;

pub struct HealthProber {
    store: Arc<dyn Store>,
    delay: Duration,
}

impl HealthProber {
    pub fn new(store: Arc<dyn Store>, delay: Duration) -> Self {
        Self { store, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Read-only: never mutates the store or the readiness state.
    pub async fn check_health(&self) -> HealthStatus {
        tokio::time::sleep(self.delay).await;

        match self.store.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                tracing::warn!(error = %e, "health probe failed");
                HealthStatus::Unhealthy(e.detail())
            }
        }
    }
}
