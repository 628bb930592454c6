//! Startup readiness gate and the delayed health probe.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use tally_core::{HealthStatus, StoreConnectionState, TallyError};
use tally_server::services::{HealthProber, ReadinessProbe};
use tally_server::store::MemoryStore;

const INTERVAL: Duration = Duration::from_millis(500);

#[tokio::test(start_paused = true)]
async fn ready_on_first_attempt_does_not_sleep() {
    let store = Arc::new(MemoryStore::new());
    let probe = ReadinessProbe::new(store.clone());
    assert_eq!(probe.state(), StoreConnectionState::Disconnected);

    let started = Instant::now();
    probe.await_ready(30, INTERVAL).await.unwrap();

    assert_eq!(probe.state(), StoreConnectionState::Ready);
    assert_eq!(store.ping_count(), 1);
    assert!(started.elapsed() < INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn ready_after_transient_failures() {
    let store = Arc::new(MemoryStore::new());
    store.fail_next_pings(2);
    let probe = ReadinessProbe::new(store.clone());

    let started = Instant::now();
    probe.await_ready(5, INTERVAL).await.unwrap();

    assert_eq!(probe.state(), StoreConnectionState::Ready);
    assert_eq!(store.ping_count(), 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= INTERVAL * 2);
    assert!(elapsed < INTERVAL * 3);
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_is_fatal() {
    let store = Arc::new(MemoryStore::new());
    store.set_reachable(false);
    let probe = ReadinessProbe::new(store.clone());

    let started = Instant::now();
    let err = probe.await_ready(4, INTERVAL).await.expect_err("must fail");

    assert!(matches!(err, TallyError::StoreUnreachable { attempts: 4 }));
    assert!(err.is_fatal());
    assert_eq!(probe.state(), StoreConnectionState::Unreachable);
    assert_eq!(store.ping_count(), 4);
    // No sleep after the final attempt.
    let elapsed = started.elapsed();
    assert!(elapsed >= INTERVAL * 3);
    assert!(elapsed < INTERVAL * 4);
}

#[tokio::test(start_paused = true)]
async fn ready_state_survives_later_store_failures() {
    let store = Arc::new(MemoryStore::new());
    let probe = ReadinessProbe::new(store.clone());
    probe.await_ready(3, INTERVAL).await.unwrap();

    store.set_reachable(false);
    let health = HealthProber::new(store.clone(), Duration::from_millis(10));
    assert!(!health.check_health().await.is_healthy());

    assert_eq!(probe.state(), StoreConnectionState::Ready);
    probe.await_ready(3, INTERVAL).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn state_changes_are_observable() {
    let store = Arc::new(MemoryStore::new());
    store.fail_next_pings(1);
    let probe = ReadinessProbe::new(store);
    let mut rx = probe.subscribe();

    probe.await_ready(3, INTERVAL).await.unwrap();

    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), StoreConnectionState::Ready);
}

#[tokio::test(start_paused = true)]
async fn health_waits_full_delay_before_probing() {
    let store = Arc::new(MemoryStore::new());
    let prober = Arc::new(HealthProber::new(store.clone(), Duration::from_millis(5000)));

    let started = Instant::now();
    let task = {
        let prober = Arc::clone(&prober);
        tokio::spawn(async move { prober.check_health().await })
    };
    tokio::task::yield_now().await;

    tokio::time::advance(Duration::from_millis(4999)).await;
    assert!(!task.is_finished());
    assert_eq!(store.ping_count(), 0);

    let status = task.await.unwrap();
    assert_eq!(status, HealthStatus::Healthy);
    assert!(started.elapsed() >= Duration::from_millis(5000));
    assert_eq!(store.ping_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn health_reflects_reachability_at_probe_time() {
    let store = Arc::new(MemoryStore::new());
    let prober = HealthProber::new(store.clone(), Duration::from_millis(5000));

    assert_eq!(prober.check_health().await, HealthStatus::Healthy);

    store.set_reachable(false);
    match prober.check_health().await {
        HealthStatus::Unhealthy(reason) => assert!(reason.contains("refused")),
        other => panic!("expected unhealthy, got {other:?}"),
    }
}
