//! Live and invalidated cache entries.

use std::time::Duration;

use serde::Serialize;
use strata_core::Row;

/// A cached result set, keyed by the literal query text.
///
/// Tracks what the eviction score needs: size, time spent producing and
/// serving the result, hits, and how many eviction passes it survived.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    query: String,
    rows: Vec<Row>,
    size: u64,
    time: Duration,
    hits: u32,
    survivals: u32,
    seq: u64,
}

impl CacheEntry {
    /// Creates an entry for a freshly executed query that took `time`.
    #[must_use]
    pub fn new(query: String, rows: Vec<Row>, time: Duration, seq: u64) -> Self {
        let size = query.len() as u64
            + rows
                .iter()
                .flat_map(|row| row.iter())
                .map(|(column, value)| column.len() as u64 + value.estimated_size())
                .sum::<u64>();
        Self {
            query,
            rows,
            size,
            time,
            hits: 0,
            survivals: 0,
            seq,
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Estimated bytes held by this entry.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Execution time plus the time spent on every hit.
    #[must_use]
    pub fn time(&self) -> Duration {
        self.time
    }

    #[must_use]
    pub fn hits(&self) -> u32 {
        self.hits
    }

    #[must_use]
    pub fn survivals(&self) -> u32 {
        self.survivals
    }

    /// Insertion order; lower is older.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn on_hit(&mut self, elapsed: Duration) {
        self.hits = self.hits.saturating_add(1);
        self.time += elapsed;
    }

    pub(crate) fn on_survive(&mut self) {
        self.survivals = self.survivals.saturating_add(1);
    }

    pub(crate) fn into_invalidated(self, cause: String) -> InvalidatedEntry {
        InvalidatedEntry {
            query: self.query,
            cause,
            time: self.time,
            hits: self.hits,
        }
    }
}

/// A query whose result was dropped, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidatedEntry {
    pub query: String,
    pub cause: String,
    pub time: Duration,
    pub hits: u32,
}

impl InvalidatedEntry {
    /// Estimated bytes held by the record.
    #[must_use]
    pub fn size(&self) -> u64 {
        (self.query.len() + self.cause.len()) as u64
    }
}

/// One line of [`Database::cache_debug`](crate::Database::cache_debug).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheDebugEntry {
    pub query: String,
    /// Cumulative seconds.
    pub time: f64,
    pub hits: u32,
    /// `None` for live entries.
    pub invalidated_by: Option<String>,
}

impl From<&CacheEntry> for CacheDebugEntry {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            query: entry.query.clone(),
            time: entry.time.as_secs_f64(),
            hits: entry.hits,
            invalidated_by: None,
        }
    }
}

impl From<&InvalidatedEntry> for CacheDebugEntry {
    fn from(entry: &InvalidatedEntry) -> Self {
        Self {
            query: entry.query.clone(),
            time: entry.time.as_secs_f64(),
            hits: entry.hits,
            invalidated_by: Some(entry.cause.clone()),
        }
    }
}
