//! Database-layer configuration.

/// Configuration for a [`Database`](crate::Database).
///
/// Controls the table-name prefix and the query cache's memory budget.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Prepended to table names when definitions are serialized, stripped
    /// when they are parsed.
    pub table_prefix: String,
    /// Whether results are cached at all.
    pub cache_enabled: bool,
    /// Memory limit in bytes, or with a `K`/`M`/`G` suffix.
    /// `-1`, empty, or unparsable means unlimited.
    pub memory_limit: String,
    /// Fraction of the limit the cache may use before an eviction pass.
    pub memory_ratio_limit: f64,
    /// An eviction pass stops once usage falls to
    /// `limit * memory_ratio_limit * eviction_target_factor`.
    pub eviction_target_factor: f64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            table_prefix: String::new(),
            cache_enabled: true,
            memory_limit: "128M".to_string(),
            memory_ratio_limit: 0.5,
            eviction_target_factor: 0.75,
        }
    }
}

/// Parses a memory limit such as `128M` into bytes.
///
/// Returns `None` for "unlimited": `-1`, an empty string, zero, or anything
/// that does not parse.
#[must_use]
pub fn parse_memory_limit(text: &str) -> Option<u64> {
    let text = text.trim();
    let (digits, multiplier) = match text.chars().last()?.to_ascii_uppercase() {
        'G' => (&text[..text.len() - 1], 1024 * 1024 * 1024),
        'M' => (&text[..text.len() - 1], 1024 * 1024),
        'K' => (&text[..text.len() - 1], 1024),
        _ => (text, 1),
    };
    digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .filter(|&bytes| bytes > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = DatabaseConfig::default();
        assert_eq!(config.table_prefix, "");
        assert!(config.cache_enabled);
        assert_eq!(parse_memory_limit(&config.memory_limit), Some(128 * 1024 * 1024));
        assert!((config.memory_ratio_limit - 0.5).abs() < f64::EPSILON);
        assert!((config.eviction_target_factor - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn suffixes_scale() {
        assert_eq!(parse_memory_limit("512K"), Some(512 * 1024));
        assert_eq!(parse_memory_limit("64m"), Some(64 * 1024 * 1024));
        assert_eq!(parse_memory_limit("1G"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_memory_limit("4096"), Some(4096));
    }

    #[test]
    fn unlimited_and_garbage() {
        assert_eq!(parse_memory_limit("-1"), None);
        assert_eq!(parse_memory_limit(""), None);
        assert_eq!(parse_memory_limit("0"), None);
        assert_eq!(parse_memory_limit("lots"), None);
        assert_eq!(parse_memory_limit("12Q"), None);
    }
}
