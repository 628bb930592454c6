//! tally server library entry.
//!
//! This crate wires the store handle, the readiness gate, schema bootstrap,
//! the durable counter, the delayed health probe, and in-process metrics into
//! an HTTP service. It is consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod server;
pub mod services;
pub mod store;
