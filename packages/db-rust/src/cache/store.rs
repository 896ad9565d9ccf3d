//! The query cache: live entries by query text plus the shadow set of
//! invalidated ones.

use std::time::Duration;

use ahash::AHashMap;
use strata_core::Row;

use super::entry::{CacheDebugEntry, CacheEntry, InvalidatedEntry};
use super::eviction::eviction_order;
use super::memory::MemoryBudget;

/// Cause recorded for entries dropped by an eviction pass.
pub const MEMORY_PRESSURE_CAUSE: &str = "Memory ratio limit reached";

/// What one eviction pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub evicted: usize,
    pub shadow_cleared: bool,
}

/// Result cache keyed by literal query text.
///
/// Usage is the estimated size of live entries plus the shadow records.
#[derive(Debug, Default)]
pub struct QueryCache {
    live: AHashMap<String, CacheEntry>,
    shadow: Vec<InvalidatedEntry>,
    next_seq: u64,
    live_bytes: u64,
    shadow_bytes: u64,
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    #[must_use]
    pub fn get(&self, query: &str) -> Option<&CacheEntry> {
        self.live.get(query)
    }

    #[must_use]
    pub fn shadow(&self) -> &[InvalidatedEntry] {
        &self.shadow
    }

    /// Estimated bytes held by the cache.
    #[must_use]
    pub fn usage(&self) -> u64 {
        self.live_bytes + self.shadow_bytes
    }

    /// Serves a hit, charging `elapsed` to the entry.
    pub fn hit(&mut self, query: &str, elapsed: Duration) -> Option<Vec<Row>> {
        let entry = self.live.get_mut(query)?;
        entry.on_hit(elapsed);
        Some(entry.rows().to_vec())
    }

    /// Stores a result. A live entry for the same text is replaced.
    pub fn insert(&mut self, query: &str, rows: Vec<Row>, time: Duration) {
        let entry = CacheEntry::new(query.to_string(), rows, time, self.next_seq);
        self.next_seq += 1;
        self.live_bytes += entry.size();
        if let Some(old) = self.live.insert(query.to_string(), entry) {
            self.live_bytes -= old.size();
        }
    }

    /// Moves a live entry to the shadow set. Returns `false` if it was not
    /// live.
    pub fn invalidate(&mut self, query: &str, cause: impl Into<String>) -> bool {
        let Some(entry) = self.live.remove(query) else {
            return false;
        };
        self.live_bytes -= entry.size();
        let record = entry.into_invalidated(cause.into());
        self.shadow_bytes += record.size();
        self.shadow.push(record);
        true
    }

    /// Invalidates every live entry for which `cause_of` returns a cause.
    /// Returns the number invalidated.
    pub fn invalidate_where<F>(&mut self, mut cause_of: F) -> usize
    where
        F: FnMut(&str) -> Option<String>,
    {
        let doomed: Vec<(String, String)> = self
            .live
            .keys()
            .filter_map(|query| cause_of(query).map(|cause| (query.clone(), cause)))
            .collect();
        for (query, cause) in &doomed {
            self.invalidate(query, cause.as_str());
        }
        doomed.len()
    }

    /// Drops the diagnostic records of invalidated entries.
    pub fn clear_shadow(&mut self) {
        self.shadow.clear();
        self.shadow_bytes = 0;
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.live.clear();
        self.live_bytes = 0;
        self.clear_shadow();
    }

    /// Sheds entries while usage is over the budget's threshold.
    ///
    /// Entries are invalidated in [`eviction_order`] until usage reaches the
    /// target; the rest count a survival. If usage is still above target
    /// afterwards the shadow set is cleared too.
    pub fn enforce(&mut self, budget: &MemoryBudget) -> EvictionReport {
        let mut report = EvictionReport::default();
        let (true, Some(target)) = (budget.exceeded(self.usage()), budget.target()) else {
            return report;
        };

        for query in eviction_order(self.live.values()) {
            if self.usage() <= target {
                break;
            }
            if self.invalidate(&query, MEMORY_PRESSURE_CAUSE) {
                report.evicted += 1;
            }
        }
        for entry in self.live.values_mut() {
            entry.on_survive();
        }

        if self.usage() > target {
            self.clear_shadow();
            report.shadow_cleared = true;
        }

        tracing::info!(
            evicted = report.evicted,
            shadow_cleared = report.shadow_cleared,
            entries = self.live.len(),
            usage = self.usage(),
            target,
            "Query cache eviction pass"
        );
        report
    }

    /// Live entries first, oldest first, then the shadow set in the order
    /// entries were invalidated.
    #[must_use]
    pub fn debug(&self) -> Vec<CacheDebugEntry> {
        let mut live: Vec<&CacheEntry> = self.live.values().collect();
        live.sort_by_key(|entry| entry.seq());
        live.into_iter()
            .map(CacheDebugEntry::from)
            .chain(self.shadow.iter().map(CacheDebugEntry::from))
            .collect()
    }
}
