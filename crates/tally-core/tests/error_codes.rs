//! Error taxonomy and domain type tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tally_core::error::ClientCode;
use tally_core::{CounterRecord, HealthStatus, StoreConnectionState, TallyError, COUNTER_ID};

#[test]
fn store_failures_map_to_db_error() {
    let errs = [
        TallyError::Store("connection refused".into()),
        TallyError::StoreUnreachable { attempts: 30 },
        TallyError::SchemaInitFailed("permission denied".into()),
    ];
    for e in errs {
        assert_eq!(e.client_code(), ClientCode::DbError);
        assert_eq!(e.client_code().as_str(), "DB_ERROR");
    }
}

#[test]
fn only_startup_errors_are_fatal() {
    assert!(TallyError::StoreUnreachable { attempts: 1 }.is_fatal());
    assert!(TallyError::SchemaInitFailed("x".into()).is_fatal());
    assert!(TallyError::Config("x".into()).is_fatal());
    assert!(!TallyError::Store("x".into()).is_fatal());
    assert!(!TallyError::Internal("x".into()).is_fatal());
}

#[test]
fn detail_strips_variant_prefix() {
    let e = TallyError::Store("relation \"hit_counter\" does not exist".into());
    assert_eq!(
        e.to_string(),
        "store error: relation \"hit_counter\" does not exist"
    );
    assert_eq!(e.detail(), "relation \"hit_counter\" does not exist");

    let e = TallyError::StoreUnreachable { attempts: 3 };
    assert_eq!(e.detail(), "store unreachable after 3 attempts");
}

#[test]
fn seed_record_uses_fixed_id() {
    let seed = CounterRecord::seed();
    assert_eq!(seed.id, COUNTER_ID);
    assert_eq!(seed.total, 0);

    let json = serde_json::to_value(seed).unwrap();
    assert_eq!(json["id"], 1);
    assert_eq!(json["total"], 0);
}

#[test]
fn connection_state_terminals() {
    assert_eq!(
        StoreConnectionState::default(),
        StoreConnectionState::Disconnected
    );
    assert!(!StoreConnectionState::Probing.is_terminal());
    assert!(StoreConnectionState::Ready.is_terminal());
    assert!(StoreConnectionState::Unreachable.is_terminal());
    assert_eq!(StoreConnectionState::Unreachable.as_str(), "unreachable");
}

#[test]
fn health_status_flags() {
    assert!(HealthStatus::Healthy.is_healthy());
    assert!(!HealthStatus::Unhealthy("timeout".into()).is_healthy());
}
