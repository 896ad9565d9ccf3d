//! Adaptive query cache: result entries, memory budget and eviction.

pub mod entry;
pub mod eviction;
pub mod memory;
pub mod store;

pub use entry::{CacheDebugEntry, CacheEntry, InvalidatedEntry};
pub use eviction::{eviction_order, score};
pub use memory::MemoryBudget;
pub use store::{EvictionReport, QueryCache, MEMORY_PRESSURE_CAUSE};
