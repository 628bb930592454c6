//! Idempotent bootstrap of the counter table and its single row.

use std::sync::Arc;

use tally_core::error::{Result, TallyError};
use tally_core::CounterRecord;

use crate::store::Store;

pub struct SchemaInitializer {
    store: Arc<dyn Store>,
}

impl SchemaInitializer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Ensure the table and seed row exist. Safe to run any number of times,
    /// and from several processes at once: the seed relies on the store's
    /// conflict-tolerant insert, not a read-then-write check.
    pub async fn initialize(&self) -> Result<()> {
        self.store
            .create_counter_table()
            .await
            .map_err(|e| TallyError::SchemaInitFailed(format!("create table: {}", e.detail())))?;

        let seed = CounterRecord::seed();
        let seeded = self
            .store
            .insert_counter_if_absent(seed.id, seed.total)
            .await
            .map_err(|e| TallyError::SchemaInitFailed(format!("seed row: {}", e.detail())))?;

        tracing::info!(seeded, "counter schema ready");
        Ok(())
    }
}
