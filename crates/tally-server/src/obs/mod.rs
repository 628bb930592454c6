//! Lightweight in-process metrics.
//!
//! Exposes Prometheus-compatible counters without a metrics crate. Values are
//! stored as atomics and rendered by the `/metrics` handler.

pub mod metrics;

pub use metrics::ServiceMetrics;
