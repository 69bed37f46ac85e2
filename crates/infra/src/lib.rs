//! `finpuls-infra` — persistence infrastructure.
//!
//! Storage units with bounded pools and typed transaction scopes, the
//! router that assigns entity families to units, and the generic
//! persistence facade (Postgres and in-memory implementations).

pub mod config;
pub mod error;
pub mod memory;
pub mod probe;
pub mod router;
pub mod sql;
pub mod store;
pub mod unit;

pub use config::{ConfigError, StorageConfig, UnitConfig};
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use probe::Probe;
pub use router::{RoutesTo, StorageRouter};
pub use sql::SqlRepository;
pub use store::EntityStore;
pub use unit::{StorageUnit, UnitTransaction};
