//! The database context: a driver wrapped with the query cache, schema
//! introspection and on-demand table provisioning.

use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use serde::Serialize;
use strata_core::sql::quote_identifier;
use strata_core::{ClockSource, Row, SystemClock, TableDefinition, Value};

use crate::cache::{CacheDebugEntry, MemoryBudget, QueryCache};
use crate::classify::{classify, tables_mentioned, Invalidation, StatementClass};
use crate::config::DatabaseConfig;
use crate::driver::Driver;
use crate::error::{DbError, DriverError};
use crate::provision::TableProvisioner;

/// Aggregate cache counters since construction or the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryStats {
    pub total_queries: u64,
    pub cache_misses: u64,
    pub cache_hits: u64,
    pub hit_percentage: f64,
}

/// A driver plus everything the layer remembers about it.
///
/// Owns the query cache, the cached table list and table descriptions,
/// parsed table definitions, and the optional [`TableProvisioner`]. All
/// methods take `&mut self`; share it across threads behind a mutex.
pub struct Database<D: Driver> {
    driver: D,
    config: DatabaseConfig,
    budget: MemoryBudget,
    clock: Arc<dyn ClockSource>,
    cache: QueryCache,
    cache_enabled: bool,
    table_list: Option<Vec<String>>,
    descriptions: AHashMap<String, Vec<Row>>,
    definitions: AHashMap<String, TableDefinition>,
    provisioner: Option<Box<dyn TableProvisioner>>,
    provisioning: bool,
    total_queries: u64,
    cache_hits: u64,
    total_time: Duration,
    last_time: Duration,
}

impl<D: Driver> Database<D> {
    /// Creates a context timed by the system clock.
    #[must_use]
    pub fn new(driver: D, config: DatabaseConfig) -> Self {
        Self::with_clock(driver, config, Arc::new(SystemClock))
    }

    /// Creates a context with an explicit clock.
    #[must_use]
    pub fn with_clock(driver: D, config: DatabaseConfig, clock: Arc<dyn ClockSource>) -> Self {
        let budget = MemoryBudget::from_config(&config);
        let cache_enabled = config.cache_enabled;
        Self {
            driver,
            config,
            budget,
            clock,
            cache: QueryCache::new(),
            cache_enabled,
            table_list: None,
            descriptions: AHashMap::new(),
            definitions: AHashMap::new(),
            provisioner: None,
            provisioning: false,
            total_queries: 0,
            cache_hits: 0,
            total_time: Duration::ZERO,
            last_time: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Installs the provisioner consulted when a statement hits a missing
    /// table.
    pub fn set_provisioner(&mut self, provisioner: impl TableProvisioner + 'static) {
        self.provisioner = Some(Box::new(provisioner));
    }

    // --- Cache control ---

    #[must_use]
    pub fn is_cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// Turns caching on or off. Turning it off also resets it.
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
        if !enabled {
            self.reset_cache();
        }
    }

    /// Drops every cached result, the shadow set, cached schema state, and
    /// the query and hit counters.
    pub fn reset_cache(&mut self) {
        self.cache.clear();
        self.table_list = None;
        self.descriptions.clear();
        self.definitions.clear();
        self.total_queries = 0;
        self.cache_hits = 0;
        tracing::debug!("Query cache reset");
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cache_stats(&self) -> QueryStats {
        let hit_percentage = if self.total_queries == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_queries as f64 * 100.0
        };
        QueryStats {
            total_queries: self.total_queries,
            cache_misses: self.total_queries - self.cache_hits,
            cache_hits: self.cache_hits,
            hit_percentage,
        }
    }

    /// Every live entry, then every invalidated one.
    #[must_use]
    pub fn cache_debug(&self) -> Vec<CacheDebugEntry> {
        self.cache.debug()
    }

    /// Time spent answering queries, from the driver or the cache.
    #[must_use]
    pub fn total_query_time(&self) -> Duration {
        self.total_time
    }

    #[must_use]
    pub fn last_query_time(&self) -> Duration {
        self.last_time
    }

    // --- Queries ---

    /// Runs `sql`, serving it from the cache when `use_cache` is set and a
    /// live entry exists.
    ///
    /// Results of reads are cached when `use_cache` is set. Every statement
    /// that reaches the driver invalidates the cached queries it may have
    /// made stale.
    ///
    /// # Errors
    ///
    /// [`DbError::Execution`] for driver failures, [`DbError::Warning`] for
    /// any warning above a note, and [`DbError::TableNotFound`] for a missing
    /// table the provisioner could not create.
    pub fn query(&mut self, sql: &str, use_cache: bool) -> Result<Vec<Row>, DbError> {
        self.total_queries += 1;
        let class = classify(sql);
        let known = self.tables_before(class);
        let start = self.clock.now_micros();
        let cacheable = use_cache && self.cache_enabled && class.is_cacheable();

        if cacheable {
            let elapsed = self.elapsed_since(start);
            if let Some(rows) = self.cache.hit(sql, elapsed) {
                self.record_time(elapsed);
                self.cache_hits += 1;
                tracing::debug!(sql = %sql, rows = rows.len(), "Query cache hit");
                return Ok(rows);
            }
            tracing::debug!(sql = %sql, "Query cache miss");
        }

        let mut outcome = self.driver.execute(sql);
        if let Err(DriverError::TableNotFound { table, .. }) = &outcome {
            let table = table.clone();
            if self.provision(&table)? {
                tracing::warn!(table = %table, sql = %sql, "Created missing table; retrying statement");
                outcome = self.driver.execute(sql);
            }
        }
        self.inspect(sql, class, known);
        let elapsed = self.elapsed_since(start);
        self.record_time(elapsed);

        let result = match outcome {
            Ok(result) => result,
            Err(DriverError::TableNotFound { table, .. }) => {
                return Err(DbError::TableNotFound {
                    table,
                    sql: sql.to_string(),
                    hint: None,
                })
            }
            Err(DriverError::Failed { message }) => {
                return Err(DbError::Execution {
                    message,
                    sql: sql.to_string(),
                })
            }
        };
        if let Some(warning) = result.first_problem() {
            return Err(DbError::Warning {
                level: warning.level.clone(),
                code: warning.code,
                message: warning.message.clone(),
                sql: sql.to_string(),
            });
        }
        let Some(rows) = result.rows else {
            return Ok(Vec::new());
        };
        if cacheable {
            self.cache.insert(sql, rows.clone(), elapsed);
            self.cache.enforce(&self.budget);
        }
        Ok(rows)
    }

    fn elapsed_since(&self, start_micros: u64) -> Duration {
        Duration::from_micros(self.clock.now_micros().saturating_sub(start_micros))
    }

    fn record_time(&mut self, elapsed: Duration) {
        self.last_time = elapsed;
        self.total_time += elapsed;
    }

    /// Table names as they stand before a writing statement runs, so that
    /// tables it drops or renames still match. `None` if they could not be
    /// listed.
    fn tables_before(&mut self, class: StatementClass) -> Option<Vec<String>> {
        if class == StatementClass::Read || self.cache.is_empty() {
            return Some(Vec::new());
        }
        match self.table_list() {
            Ok(list) => Some(list),
            Err(err) => {
                tracing::warn!(error = %err, "Table list unavailable; invalidating every cached query");
                None
            }
        }
    }

    /// Invalidates what an executed statement may have made stale.
    fn inspect(&mut self, sql: &str, class: StatementClass, known: Option<Vec<String>>) {
        if class == StatementClass::Read {
            return;
        }
        if class == StatementClass::SchemaChange {
            self.table_list = None;
        }
        if self.cache.is_empty() {
            if class == StatementClass::SchemaChange {
                self.descriptions.clear();
            }
            return;
        }

        let Some(known) = known else {
            if class == StatementClass::SchemaChange {
                self.descriptions.clear();
            }
            let cause = serde_json::json!({ "sql": sql, "matched": [] }).to_string();
            let invalidated = self.cache.invalidate_where(|_| Some(cause.clone()));
            tracing::debug!(sql = %sql, invalidated, "Invalidated all cached queries");
            return;
        };
        let tables = tables_mentioned(sql, &known);
        if class == StatementClass::SchemaChange {
            for table in &tables {
                self.descriptions.remove(*table);
            }
        }
        let Some(invalidation) = Invalidation::for_statement(class, &tables) else {
            return;
        };
        let invalidated = self.cache.invalidate_where(|cached| {
            let matched = invalidation.matches(cached);
            (!matched.is_empty())
                .then(|| serde_json::json!({ "sql": sql, "matched": matched }).to_string())
        });
        if invalidated > 0 {
            tracing::debug!(sql = %sql, invalidated, "Invalidated cached queries");
        }
    }

    /// Creates `table` from the provisioner's definition. Returns whether
    /// the table exists afterwards.
    fn provision(&mut self, table: &str) -> Result<bool, DbError> {
        if self.provisioning {
            return Ok(false);
        }
        let name = table
            .strip_prefix(self.config.table_prefix.as_str())
            .unwrap_or(table);
        let Some(definition) = self
            .provisioner
            .as_ref()
            .and_then(|provisioner| provisioner.definition_for(name))
        else {
            return Ok(false);
        };

        self.provisioning = true;
        let created = self.ensure_table(&definition);
        self.provisioning = false;
        created?;
        self.table_exists(definition.name())
    }

    // --- Schema introspection ---

    fn full_name(&self, table: &str) -> String {
        format!("{}{table}", self.config.table_prefix)
    }

    /// Names of all tables, prefixes included. Cached while the cache is
    /// enabled, until the next schema change.
    ///
    /// # Errors
    ///
    /// Any failure of `SHOW TABLES`.
    pub fn table_list(&mut self) -> Result<Vec<String>, DbError> {
        if self.cache_enabled {
            if let Some(list) = &self.table_list {
                return Ok(list.clone());
            }
        }
        let rows = self.query("SHOW TABLES", false)?;
        let list: Vec<String> = rows
            .iter()
            .flat_map(|row| row.values())
            .map(|value| value.as_str().map_or_else(|| value.to_string(), str::to_string))
            .collect();
        self.table_list = Some(list.clone());
        Ok(list)
    }

    /// Whether `table` (without prefix) exists.
    ///
    /// # Errors
    ///
    /// See [`table_list`](Self::table_list).
    pub fn table_exists(&mut self, table: &str) -> Result<bool, DbError> {
        let full = self.full_name(table);
        Ok(self.table_list()?.contains(&full))
    }

    /// `DESCRIBE` rows for `table`, remembered until a schema change
    /// mentions it.
    ///
    /// # Errors
    ///
    /// [`DbError::TableNotFound`] if the table does not exist, or any
    /// failure of the statement.
    pub fn describe(&mut self, table: &str) -> Result<Vec<Row>, DbError> {
        let full = self.full_name(table);
        let sql = format!("DESCRIBE {}", quote_identifier(&full));
        if !self.table_exists(table)? {
            return Err(DbError::TableNotFound {
                table: full,
                sql,
                hint: None,
            });
        }
        if let Some(rows) = self.descriptions.get(&full) {
            return Ok(rows.clone());
        }
        let rows = self.query(&sql, false)?;
        self.descriptions.insert(full, rows.clone());
        Ok(rows)
    }

    /// The parsed definition of `table`, from `SHOW CREATE TABLE`.
    ///
    /// The statement goes through the cache, and parsed definitions are
    /// remembered by DDL text.
    ///
    /// # Errors
    ///
    /// Execution failures, a result without DDL, or a DDL that does not
    /// parse.
    pub fn table_definition(&mut self, table: &str) -> Result<TableDefinition, DbError> {
        let full = self.full_name(table);
        let sql = format!("SHOW CREATE TABLE {}", quote_identifier(&full));
        let rows = self.query(&sql, true)?;
        let ddl = rows
            .first()
            .and_then(|row| row.get("Create Table").or_else(|| row.values().nth(1)))
            .and_then(Value::as_str)
            .ok_or_else(|| DbError::Execution {
                message: "result carries no CREATE TABLE statement".to_string(),
                sql: sql.clone(),
            })?;

        if let Some(definition) = self.definitions.get(ddl) {
            return Ok(definition.clone());
        }
        let definition = TableDefinition::parse_with_prefix(ddl, &self.config.table_prefix)?;
        self.definitions.insert(ddl.to_string(), definition.clone());
        Ok(definition)
    }

    /// Creates the table for `definition` unless it exists. Returns whether
    /// it was created.
    ///
    /// # Errors
    ///
    /// [`DbError::TableNotFound`] with a hint when only the singular/plural
    /// alternative of the name exists, serialization errors, and failures
    /// of the `CREATE TABLE` statement.
    pub fn ensure_table(&mut self, definition: &TableDefinition) -> Result<bool, DbError> {
        let name = definition.name();
        if self.table_exists(name)? {
            return Ok(false);
        }
        let alternate = name
            .strip_suffix('s')
            .map_or_else(|| format!("{name}s"), str::to_string);
        if !alternate.is_empty() && self.table_exists(&alternate)? {
            return Err(DbError::TableNotFound {
                table: self.full_name(name),
                sql: "SHOW TABLES".to_string(),
                hint: Some(format!(
                    "switching plurality to '{alternate}' finds a table; is '{name}' the right name?"
                )),
            });
        }

        let mut definition = definition.clone();
        definition.set_allow_existing(true);
        let sql = definition.serialize_with_prefix(&self.config.table_prefix)?;
        self.query(&sql, false)?;
        tracing::info!(table = %name, "Created table");
        Ok(true)
    }
}
