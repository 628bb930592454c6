//! Store handle: the only channel to persisted state.
//!
//! The trait exposes the handful of primitives the counter needs, each one a
//! single statement evaluated by the store itself. Conflict handling and
//! arithmetic never happen in the caller.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use tally_core::error::Result;

use crate::config::{StoreBackend, StoreSection};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Name of the durable counter table.
pub const COUNTER_TABLE: &str = "hit_counter";

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend label for logs.
    fn backend(&self) -> &'static str;

    /// Trivial round-trip used to confirm reachability.
    async fn ping(&self) -> Result<()>;

    /// Create the counter table. No-op if it already exists.
    async fn create_counter_table(&self) -> Result<()>;

    /// Insert `(id, total)` unless a row with `id` exists.
    /// Returns `true` if a row was written.
    async fn insert_counter_if_absent(&self, id: i32, total: u64) -> Result<bool>;

    /// `total = total + 1` for `id`, evaluated by the store.
    /// Returns the number of rows affected.
    async fn increment_counter(&self, id: i32) -> Result<u64>;

    async fn read_counter(&self, id: i32) -> Result<Option<u64>>;

    /// Release all connections. Safe to call more than once.
    async fn close(&self);
}

/// Build the store handle selected by config. Does not connect; the
/// readiness probe is the first thing to touch the store.
pub fn open(cfg: &StoreSection) -> Arc<dyn Store> {
    match cfg.backend {
        StoreBackend::Postgres => Arc::new(PgStore::connect_lazy(cfg)),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    }
}
