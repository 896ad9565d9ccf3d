//! In-memory driver for tests.
//!
//! Keeps `CREATE TABLE` statements by table name, answers `SHOW TABLES`,
//! `SHOW CREATE TABLE` and `DESCRIBE` from them, fails statements that
//! reference unknown tables, and replays scripted results for everything
//! else. Every statement advances the shared clock by a fixed latency.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use strata_core::{ClockSource, ManualClock, Row, Value};

use crate::driver::{Driver, StatementResult, Warning};
use crate::error::DriverError;
use crate::{Database, DatabaseConfig};

static CREATE_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?`?(\w+)`?")
        .expect("valid create table regex")
});

static DROP_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*DROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?`?(\w+)`?").expect("valid drop table regex")
});

static SHOW_CREATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*SHOW\s+CREATE\s+TABLE\s+`?(\w+)`?").expect("valid show create regex")
});

static DESCRIBE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*DESCRIBE\s+`?(\w+)`?").expect("valid describe regex"));

static TABLE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:FROM|INTO|UPDATE|JOIN|TRUNCATE)\s+`?(\w+)`?").expect("valid table reference regex")
});

static FIELD_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*`(\w+)`").expect("valid field name regex"));

/// Latency charged to every statement.
pub const STATEMENT_LATENCY_MICROS: u64 = 1_000;

pub struct ScriptedDriver {
    clock: Arc<ManualClock>,
    tables: BTreeMap<String, String>,
    scripted: AHashMap<String, StatementResult>,
    failures: AHashMap<String, DriverError>,
    log: Vec<String>,
}

impl ScriptedDriver {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            tables: BTreeMap::new(),
            scripted: AHashMap::new(),
            failures: AHashMap::new(),
            log: Vec::new(),
        }
    }

    /// Creates a table directly, bypassing the log.
    pub fn add_table(&mut self, name: &str, ddl: &str) {
        self.tables.insert(name.to_string(), ddl.to_string());
    }

    /// Answers `sql` with `result` from now on.
    pub fn script(&mut self, sql: &str, result: StatementResult) {
        self.scripted.insert(sql.to_string(), result);
    }

    /// Fails `sql` with `error` from now on.
    pub fn fail(&mut self, sql: &str, error: DriverError) {
        self.failures.insert(sql.to_string(), error);
    }

    /// Every statement that reached the driver, in order.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn executions_of(&self, sql: &str) -> usize {
        self.log.iter().filter(|s| s.as_str() == sql).count()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    fn missing(table: &str) -> DriverError {
        DriverError::TableNotFound {
            table: table.to_string(),
            message: format!("Table 'test.{table}' doesn't exist"),
        }
    }

    fn run(&mut self, sql: &str) -> Result<StatementResult, DriverError> {
        if let Some(error) = self.failures.get(sql) {
            return Err(error.clone());
        }
        if sql.trim().eq_ignore_ascii_case("SHOW TABLES") {
            let rows = self
                .tables
                .keys()
                .map(|name| one_column("Tables_in_test", name))
                .collect();
            return Ok(StatementResult::rows(rows));
        }
        if let Some(caps) = CREATE_TABLE.captures(sql) {
            let name = caps[1].to_string();
            if self.tables.contains_key(&name) {
                let already = StatementResult::done()
                    .with_warning(Warning::new("Note", 1050, format!("Table '{name}' already exists")));
                return Ok(already);
            }
            self.tables.insert(name, sql.to_string());
            return Ok(StatementResult::done());
        }
        if let Some(caps) = DROP_TABLE.captures(sql) {
            return match self.tables.remove(&caps[1]) {
                Some(_) => Ok(StatementResult::done()),
                None => Err(Self::missing(&caps[1])),
            };
        }
        if let Some(caps) = SHOW_CREATE.captures(sql) {
            let name = &caps[1];
            let ddl = self.tables.get(name).ok_or_else(|| Self::missing(name))?;
            let mut row = one_column("Table", name);
            row.insert("Create Table".to_string(), Value::from(ddl.as_str()));
            return Ok(StatementResult::rows(vec![row]));
        }
        if let Some(caps) = DESCRIBE.captures(sql) {
            let name = &caps[1];
            let ddl = self.tables.get(name).ok_or_else(|| Self::missing(name))?;
            let rows = ddl
                .lines()
                .filter_map(|line| FIELD_NAME.captures(line))
                .map(|caps| one_column("Field", &caps[1]))
                .collect();
            return Ok(StatementResult::rows(rows));
        }
        for caps in TABLE_REFERENCE.captures_iter(sql) {
            if !self.tables.contains_key(&caps[1]) {
                return Err(Self::missing(&caps[1]));
            }
        }
        if let Some(result) = self.scripted.get(sql) {
            return Ok(result.clone());
        }
        if sql.trim_start().to_ascii_uppercase().starts_with("SELECT") {
            Ok(StatementResult::rows(Vec::new()))
        } else {
            Ok(StatementResult::done())
        }
    }
}

impl Driver for ScriptedDriver {
    fn execute(&mut self, sql: &str) -> Result<StatementResult, DriverError> {
        self.log.push(sql.to_string());
        self.clock.advance_micros(STATEMENT_LATENCY_MICROS);
        self.run(sql)
    }
}

pub fn one_column(column: &str, value: &str) -> Row {
    let mut row = Row::new();
    row.insert(column.to_string(), Value::from(value));
    row
}

/// A database over a fresh scripted driver, plus the clock both share.
pub fn scripted_database(config: DatabaseConfig) -> (Database<ScriptedDriver>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let driver = ScriptedDriver::new(Arc::clone(&clock));
    let shared: Arc<dyn ClockSource> = clock.clone();
    let database = Database::with_clock(driver, config, shared);
    (database, clock)
}
