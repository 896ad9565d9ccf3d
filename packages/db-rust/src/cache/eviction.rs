//! Eviction scoring.
//!
//! `score = size / (seconds * (hits / (survivals + 1)) + 1)`
//!
//! Entries are evicted lowest score first, oldest first among equal
//! scores. Cheap, unpopular results reduce to their size; results that were
//! slow to produce and are hit often shrink toward zero.

use ordered_float::OrderedFloat;

use super::entry::CacheEntry;

/// Weight of one live entry.
#[must_use]
pub fn score(entry: &CacheEntry) -> OrderedFloat<f64> {
    #[allow(clippy::cast_precision_loss)]
    let size = entry.size() as f64;
    let seconds = entry.time().as_secs_f64();
    let popularity = f64::from(entry.hits()) / (f64::from(entry.survivals()) + 1.0);
    OrderedFloat(size / (seconds * popularity + 1.0))
}

/// Queries in the order an eviction pass should drop them.
#[must_use]
pub fn eviction_order<'a, I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a CacheEntry>,
{
    let mut ranked: Vec<(OrderedFloat<f64>, u64, &str)> = entries
        .into_iter()
        .map(|entry| (score(entry), entry.seq(), entry.query()))
        .collect();
    ranked.sort_unstable();
    ranked
        .into_iter()
        .map(|(_, _, query)| query.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn entry(query: &str, time_ms: u64, hits: u32, seq: u64) -> CacheEntry {
        let mut entry =
            CacheEntry::new(query.to_string(), Vec::new(), Duration::from_millis(time_ms), seq);
        for _ in 0..hits {
            entry.on_hit(Duration::ZERO);
        }
        entry
    }

    #[test]
    fn unhit_entries_score_their_size() {
        let e = entry("SELECT 1", 2_000, 0, 0);
        assert!((score(&e).0 - 8.0).abs() < 1e-9);
    }

    #[test]
    fn hits_and_slowness_lower_the_score() {
        let cold = entry("SELECT 1", 2_000, 0, 0);
        let hot = entry("SELECT 1", 2_000, 4, 1);
        // 8 / (2 * 4 + 1)
        assert!((score(&hot).0 - 8.0 / 9.0).abs() < 1e-9);
        assert!(score(&hot) < score(&cold));
    }

    #[test]
    fn survivals_raise_the_score_again() {
        let mut e = entry("SELECT 1", 2_000, 4, 0);
        let before = score(&e);
        e.on_survive();
        assert!(score(&e) > before);
    }

    #[test]
    fn order_is_ascending_then_oldest_first() {
        let a = entry("SELECT a", 0, 0, 2);
        let b = entry("SELECT b", 0, 0, 1);
        let long = entry("SELECT long_query", 0, 0, 0);
        assert_eq!(
            eviction_order([&a, &b, &long]),
            vec!["SELECT b", "SELECT a", "SELECT long_query"]
        );
    }
}
