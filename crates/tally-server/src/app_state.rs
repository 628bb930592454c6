//! Shared application state for the tally server.
//!
//! One composed root owns the config, the store handle, the store-facing
//! services, and the in-process metrics. Handlers receive it by clone
//! (cheap: everything sits behind `Arc`).

use std::sync::Arc;
use std::time::Duration;

use crate::config::TallyConfig;
use crate::obs::ServiceMetrics;
use crate::services::{CounterStore, HealthProber, ReadinessProbe, SchemaInitializer};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    metrics: Arc<ServiceMetrics>,
}

struct AppStateInner {
    cfg: TallyConfig,
    store: Arc<dyn Store>,
    readiness: ReadinessProbe,
    counter: CounterStore,
    health: HealthProber,
}

impl AppState {
    pub fn new(cfg: TallyConfig, store: Arc<dyn Store>) -> Self {
        let readiness = ReadinessProbe::new(Arc::clone(&store));
        let counter = CounterStore::new(Arc::clone(&store));
        let health = HealthProber::new(
            Arc::clone(&store),
            Duration::from_millis(cfg.server.health_delay_ms),
        );

        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                store,
                readiness,
                counter,
                health,
            }),
            metrics: Arc::new(ServiceMetrics::new()),
        }
    }

    pub fn cfg(&self) -> &TallyConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.inner.store)
    }

    pub fn readiness(&self) -> &ReadinessProbe {
        &self.inner.readiness
    }

    /// Fresh initializer over the shared store; bootstrap runs once per start.
    pub fn schema(&self) -> SchemaInitializer {
        SchemaInitializer::new(self.store())
    }

    pub fn counter(&self) -> &CounterStore {
        &self.inner.counter
    }

    pub fn health(&self) -> &HealthProber {
        &self.inner.health
    }

    pub fn metrics(&self) -> Arc<ServiceMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }
}
