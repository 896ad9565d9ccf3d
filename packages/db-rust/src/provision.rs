//! Table provisioning: where a missing table's definition comes from.

use ahash::AHashMap;
use strata_core::TableDefinition;

/// Supplies the definition of a table so it can be created on demand.
///
/// [`Database`](crate::Database) consults its provisioner when a statement
/// fails because a table does not exist, creates the table, and retries the
/// statement once.
pub trait TableProvisioner {
    /// The definition for `table` (without the configured prefix), if known.
    fn definition_for(&self, table: &str) -> Option<TableDefinition>;
}

/// A [`TableProvisioner`] backed by registered definitions.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: AHashMap<String, TableDefinition>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition under its table name, replacing any previous
    /// one. Returns the replaced definition.
    pub fn register(&mut self, definition: TableDefinition) -> Option<TableDefinition> {
        self.tables.insert(definition.name().to_string(), definition)
    }

    #[must_use]
    pub fn get(&self, table: &str) -> Option<&TableDefinition> {
        self.tables.get(table)
    }

    /// Registered table names, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TableProvisioner for SchemaRegistry {
    fn definition_for(&self, table: &str) -> Option<TableDefinition> {
        self.tables.get(table).cloned()
    }
}
