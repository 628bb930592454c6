//! Durable hit counter.

use std::sync::Arc;

use tally_core::error::{Result, TallyError};
use tally_core::COUNTER_ID;

use crate::store::Store;

pub struct CounterStore {
    store: Arc<dyn Store>,
}

impl CounterStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Increment the persisted total by one and return the total read back.
    ///
    /// The increment is a single store-side `total = total + 1`, so N
    /// concurrent calls always add exactly N. The read is a separate
    /// statement: the returned value may already include other callers'
    /// increments. Errors are not retried.
    pub async fn increment_and_get(&self) -> Result<u64> {
        // Self-heal a missing row without clobbering an existing one.
        self.store.insert_counter_if_absent(COUNTER_ID, 0).await?;

        let updated = self.store.increment_counter(COUNTER_ID).await?;
        if updated == 0 {
            return Err(TallyError::Store(
                "counter row disappeared before increment".into(),
            ));
        }

        self.store
            .read_counter(COUNTER_ID)
            .await?
            .ok_or_else(|| TallyError::Store("counter row disappeared before read".into()))
    }

    /// Current total without incrementing.
    pub async fn current(&self) -> Result<Option<u64>> {
        self.store.read_counter(COUNTER_ID).await
    }
}
