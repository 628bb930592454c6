//! In-process store with the same statement semantics as the Postgres
//! handle. Used for local runs without a database and by the test suite,
//! which drives its reachability switches.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use tally_core::error::{Result, TallyError};

use super::Store;

#[derive(Default)]
struct MemoryState {
    /// `None` until the table is created.
    table: Option<BTreeMap<i32, u64>>,
    reachable: bool,
    failing_pings: u32,
    closed: bool,
}

pub struct MemoryStore {
    state: Mutex<MemoryState>,
    latency: Duration,
    pings: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                reachable: true,
                ..MemoryState::default()
            }),
            latency: Duration::ZERO,
            pings: AtomicU64::new(0),
        }
    }

    /// Suspend for `latency` before every statement so concurrent callers
    /// interleave.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Make the next `n` pings fail even while reachable.
    pub fn fail_next_pings(&self, n: u32) {
        self.lock().failing_pings = n;
    }

    /// Number of pings issued so far, failed ones included.
    pub fn ping_count(&self) -> u64 {
        self.pings.load(Ordering::Relaxed)
    }

    /// Number of rows in the counter table, `None` if it does not exist.
    pub fn row_count(&self) -> Option<usize> {
        self.lock().table.as_ref().map(BTreeMap::len)
    }

    /// Remove a row out-of-band.
    pub fn delete_counter(&self, id: i32) {
        if let Some(table) = self.lock().table.as_mut() {
            table.remove(&id);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // Poisoning is ignored: every update is a single assignment.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn round_trip(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let guard = self.lock();
        if guard.closed {
            return Err(TallyError::Store("pool closed".into()));
        }
        if !guard.reachable {
            return Err(TallyError::Store("connection refused".into()));
        }
        Ok(guard)
    }
}

fn missing_table() -> TallyError {
    TallyError::Store(format!("relation \"{}\" does not exist", super::COUNTER_TABLE))
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        self.pings.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.round_trip().await?;
        if guard.failing_pings > 0 {
            guard.failing_pings -= 1;
            return Err(TallyError::Store("the database system is starting up".into()));
        }
        Ok(())
    }

    async fn create_counter_table(&self) -> Result<()> {
        let mut guard = self.round_trip().await?;
        guard.table.get_or_insert_with(BTreeMap::new);
        Ok(())
    }

    async fn insert_counter_if_absent(&self, id: i32, total: u64) -> Result<bool> {
        let mut guard = self.round_trip().await?;
        let table = guard.table.as_mut().ok_or_else(missing_table)?;
        if table.contains_key(&id) {
            return Ok(false);
        }
        table.insert(id, total);
        Ok(true)
    }

    async fn increment_counter(&self, id: i32) -> Result<u64> {
        let mut guard = self.round_trip().await?;
        let table = guard.table.as_mut().ok_or_else(missing_table)?;
        match table.get_mut(&id) {
            Some(total) => {
                *total = total
                    .checked_add(1)
                    .ok_or_else(|| TallyError::Store("bigint out of range".into()))?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn read_counter(&self, id: i32) -> Result<Option<u64>> {
        let guard = self.round_trip().await?;
        let table = guard.table.as_ref().ok_or_else(missing_table)?;
        Ok(table.get(&id).copied())
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}
