//! Memory budget for the query cache.

use crate::config::{parse_memory_limit, DatabaseConfig};

/// When the cache must shed entries, and how far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryBudget {
    limit: Option<u64>,
    ratio_limit: f64,
    target_factor: f64,
}

impl MemoryBudget {
    #[must_use]
    pub fn new(limit: Option<u64>, ratio_limit: f64, target_factor: f64) -> Self {
        Self {
            limit,
            ratio_limit,
            target_factor,
        }
    }

    /// Builds the budget from configuration. An unparsable limit leaves
    /// the cache unbounded.
    #[must_use]
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let limit = parse_memory_limit(&config.memory_limit);
        let trimmed = config.memory_limit.trim();
        if limit.is_none() && !trimmed.is_empty() && trimmed != "-1" {
            tracing::warn!(
                memory_limit = %config.memory_limit,
                "Unparsable memory limit; query cache eviction disabled"
            );
        }
        Self::new(limit, config.memory_ratio_limit, config.eviction_target_factor)
    }

    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(None, 0.5, 0.75)
    }

    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Whether `usage` is over `limit * ratio_limit`. Never true without a
    /// limit.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn exceeded(&self, usage: u64) -> bool {
        self.limit
            .is_some_and(|limit| usage as f64 / limit as f64 > self.ratio_limit)
    }

    /// The usage an eviction pass works down to.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn target(&self) -> Option<u64> {
        self.limit
            .map(|limit| (limit as f64 * self.ratio_limit * self.target_factor).max(0.0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_and_target() {
        let budget = MemoryBudget::new(Some(1000), 0.5, 0.75);
        assert!(!budget.exceeded(500));
        assert!(budget.exceeded(501));
        assert_eq!(budget.target(), Some(375));
    }

    #[test]
    fn unlimited_never_evicts() {
        let budget = MemoryBudget::unlimited();
        assert!(!budget.exceeded(u64::MAX));
        assert_eq!(budget.target(), None);
    }

    #[test]
    fn garbage_limit_means_unlimited() {
        let config = DatabaseConfig {
            memory_limit: "plenty".to_string(),
            ..DatabaseConfig::default()
        };
        assert_eq!(MemoryBudget::from_config(&config).limit(), None);
        assert_eq!(
            MemoryBudget::from_config(&DatabaseConfig::default()).limit(),
            Some(128 * 1024 * 1024)
        );
    }
}
