//! Store-facing services: startup gating, bootstrap, the counter, and the
//! delayed health probe. Each one holds an `Arc<dyn Store>` and nothing else
//! shared.

pub mod counter;
pub mod health;
pub mod readiness;
pub mod schema;

pub use counter::CounterStore;
pub use health::HealthProber;
pub use readiness::ReadinessProbe;
pub use schema::SchemaInitializer;
