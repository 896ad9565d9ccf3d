//! Statement classification: decides what an executed statement can have
//! changed, and which cached queries that makes stale.
//!
//! This is keyword matching, not SQL parsing. A table name that happens to
//! appear inside a string literal still counts as a mention.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

static SCHEMA_CHANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|\W)(?:CREATE|DROP|RENAME|ALTER)(?:\s+TEMPORARY)?\s+(?:TABLE|DATABASE)(?:\W|$)",
    )
    .expect("valid schema change regex")
});

static DATA_CHANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\W)(?:INSERT|UPDATE|DELETE|CALL|TRUNCATE)(?:\W|$)")
        .expect("valid data change regex")
});

/// Cached queries that describe the schema rather than table contents.
const INTROSPECTION_TERMS: [&str; 2] = [r"SHOW\s+TABLES", "DESCRIBE"];

/// What an executed statement may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementClass {
    /// Creates, drops, renames or alters a table or database.
    SchemaChange,
    /// Writes rows, or calls a procedure that might.
    DataChange,
    /// Everything else.
    Read,
}

impl StatementClass {
    /// Only reads may be served from, or stored in, the cache.
    #[must_use]
    pub fn is_cacheable(self) -> bool {
        self == StatementClass::Read
    }
}

/// Classifies one statement. Schema changes win over data changes.
#[must_use]
pub fn classify(sql: &str) -> StatementClass {
    if SCHEMA_CHANGE.is_match(sql) {
        StatementClass::SchemaChange
    } else if DATA_CHANGE.is_match(sql) {
        StatementClass::DataChange
    } else {
        StatementClass::Read
    }
}

fn mention_regex(alternation: &str) -> Option<Regex> {
    RegexBuilder::new(&format!(r"(?:^|\W)({alternation})(?:\W|$)"))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Whether `sql` mentions `table` as a whole word, ignoring case.
#[must_use]
pub fn mentions_table(sql: &str, table: &str) -> bool {
    mention_regex(&regex::escape(table)).is_some_and(|re| re.is_match(sql))
}

/// The known tables `sql` mentions, in the order they are listed.
#[must_use]
pub fn tables_mentioned<'a>(sql: &str, known_tables: &'a [String]) -> Vec<&'a str> {
    known_tables
        .iter()
        .map(String::as_str)
        .filter(|table| mentions_table(sql, table))
        .collect()
}

/// Decides which cached query texts an executed statement makes stale.
#[derive(Debug, Clone)]
pub struct Invalidation {
    regex: Regex,
}

impl Invalidation {
    /// Builds the matcher for a statement, given the tables it mentions.
    ///
    /// Returns `None` when nothing can have become stale: reads, and data
    /// changes that touch no known table.
    #[must_use]
    pub fn for_statement(class: StatementClass, tables: &[&str]) -> Option<Self> {
        let mut terms: Vec<String> = Vec::new();
        if class == StatementClass::SchemaChange {
            terms.extend(INTROSPECTION_TERMS.iter().map(ToString::to_string));
        }
        if class != StatementClass::Read {
            terms.extend(tables.iter().map(|t| regex::escape(t)));
        }
        if terms.is_empty() {
            return None;
        }
        mention_regex(&terms.join("|")).map(|regex| Self { regex })
    }

    /// The terms found in `cached_sql`, empty if it is unaffected.
    #[must_use]
    pub fn matches(&self, cached_sql: &str) -> Vec<String> {
        let mut found: Vec<String> = self
            .regex
            .captures_iter(cached_sql)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect();
        found.dedup();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_by_keyword() {
        assert_eq!(classify("CREATE TABLE `Users` (`ID` int)"), StatementClass::SchemaChange);
        assert_eq!(classify("drop temporary table t"), StatementClass::SchemaChange);
        assert_eq!(classify("ALTER  TABLE Users ADD x int"), StatementClass::SchemaChange);
        assert_eq!(classify("CREATE DATABASE shop"), StatementClass::SchemaChange);
        assert_eq!(classify("INSERT INTO Users VALUES (1)"), StatementClass::DataChange);
        assert_eq!(classify("update Users set a=1"), StatementClass::DataChange);
        assert_eq!(classify("CALL refresh()"), StatementClass::DataChange);
        assert_eq!(classify("TRUNCATE Users"), StatementClass::DataChange);
        assert_eq!(classify("SELECT * FROM Users"), StatementClass::Read);
        assert_eq!(classify("SHOW TABLES"), StatementClass::Read);
    }

    #[test]
    fn keywords_need_word_boundaries() {
        assert_eq!(classify("SELECT * FROM UpdateLog"), StatementClass::Read);
        assert_eq!(classify("SELECT `created_table` FROM t"), StatementClass::Read);
        assert!(!StatementClass::DataChange.is_cacheable());
        assert!(StatementClass::Read.is_cacheable());
    }

    #[test]
    fn table_mentions_are_whole_words() {
        let known = vec!["Users".to_string(), "User".to_string(), "Orders".to_string()];
        assert_eq!(tables_mentioned("INSERT INTO Users (a) VALUES (1)", &known), vec!["Users"]);
        assert_eq!(tables_mentioned("DELETE FROM `user`", &known), vec!["User"]);
        assert_eq!(tables_mentioned("SELECT * FROM Orders", &known), vec!["Orders"]);
        assert!(tables_mentioned("SELECT 1", &known).is_empty());
    }

    #[test]
    fn reads_invalidate_nothing() {
        assert!(Invalidation::for_statement(StatementClass::Read, &["Users"]).is_none());
        assert!(Invalidation::for_statement(StatementClass::DataChange, &[]).is_none());
    }

    #[test]
    fn schema_changes_hit_introspection() {
        let inv = Invalidation::for_statement(StatementClass::SchemaChange, &[]).unwrap();
        assert_eq!(inv.matches("SHOW TABLES"), vec!["SHOW TABLES"]);
        assert_eq!(inv.matches("DESCRIBE `Users`"), vec!["DESCRIBE"]);
        assert!(inv.matches("SELECT * FROM Users").is_empty());
    }

    #[test]
    fn data_changes_hit_their_tables() {
        let inv = Invalidation::for_statement(StatementClass::DataChange, &["Users"]).unwrap();
        assert_eq!(inv.matches("SELECT * FROM Users WHERE ID=1"), vec!["Users"]);
        assert_eq!(inv.matches("SELECT * FROM `users`"), vec!["users"]);
        assert!(inv.matches("SELECT * FROM UsersArchive").is_empty());
        assert!(inv.matches("SHOW TABLES").is_empty());
    }
}
