//! Strata DB — the database layer over `strata-core`: a driver seam,
//! statement classification, an adaptive query cache with memory-pressure
//! eviction, schema introspection, and on-demand table provisioning.

pub mod cache;
pub mod classify;
pub mod config;
pub mod database;
pub mod driver;
pub mod error;
pub mod provision;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheDebugEntry, CacheEntry, InvalidatedEntry, MemoryBudget, QueryCache};
pub use classify::{classify, StatementClass};
pub use config::{parse_memory_limit, DatabaseConfig};
pub use database::{Database, QueryStats};
pub use driver::{Driver, StatementResult, Warning};
pub use error::{DbError, DriverError};
pub use provision::{SchemaRegistry, TableProvisioner};
