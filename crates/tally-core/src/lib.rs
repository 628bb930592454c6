//! tally core: store-agnostic domain types and the shared error surface.
//!
//! This crate defines the persisted counter record, the startup readiness
//! state machine, and the error taxonomy shared by the server and its tests.
//! It carries no runtime or storage dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `TallyError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;

/// Shared result type.
pub use error::{Result, TallyError};
pub use model::{CounterRecord, HealthStatus, StoreConnectionState, COUNTER_ID};
