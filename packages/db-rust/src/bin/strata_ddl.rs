//! `strata-ddl`: normalize `CREATE TABLE` files and validate rows against
//! them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use strata_core::{Row, TableDefinition};
use strata_db::{parse_memory_limit, DatabaseConfig};

#[derive(Parser)]
#[command(name = "strata-ddl")]
#[command(about = "Parse, normalize and validate MySQL-style table definitions")]
#[command(version)]
struct Cli {
    /// Table-name prefix stripped on parse and prepended on output
    #[arg(long, env = "STRATA_TABLE_PREFIX", default_value = "")]
    table_prefix: String,

    /// Memory limit for the query cache (e.g. 128M); checked, then reported
    #[arg(long, env = "STRATA_MEMORY_LIMIT", default_value = "128M")]
    memory_limit: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a DDL file and print it in canonical form
    Normalize {
        /// File holding one CREATE TABLE statement
        file: PathBuf,
    },
    /// Validate a JSON object row against the table in a DDL file
    Validate {
        /// File holding one CREATE TABLE statement
        file: PathBuf,
        /// Row as a JSON object, e.g. '{"Name": "ada"}'
        row: String,
    },
}

impl Cli {
    fn config(&self) -> DatabaseConfig {
        DatabaseConfig {
            table_prefix: self.table_prefix.clone(),
            memory_limit: self.memory_limit.clone(),
            ..DatabaseConfig::default()
        }
    }
}

fn load_table(path: &Path, config: &DatabaseConfig) -> Result<TableDefinition> {
    let ddl = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    TableDefinition::parse_with_prefix(&ddl, &config.table_prefix)
        .with_context(|| format!("parsing {}", path.display()))
}

fn normalize(path: &Path, config: &DatabaseConfig) -> Result<String> {
    let table = load_table(path, config)?;
    Ok(table.serialize_with_prefix(&config.table_prefix)?)
}

fn validate(path: &Path, row: &str, config: &DatabaseConfig) -> Result<String> {
    let table = load_table(path, config)?;
    let row: Row = serde_json::from_str(row).context("row must be a JSON object")?;
    let completed = table
        .validate(&row)
        .with_context(|| format!("row does not fit table '{}'", table.name()))?;
    Ok(serde_json::to_string_pretty(&completed)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    strata_db::telemetry::init_tracing(cli.log_json)?;

    let config = cli.config();
    match parse_memory_limit(&config.memory_limit) {
        Some(bytes) => tracing::debug!(bytes, "memory limit"),
        None => tracing::warn!(memory_limit = %config.memory_limit, "No usable memory limit; cache would be unbounded"),
    }

    let output = match &cli.command {
        Commands::Normalize { file } => normalize(file, &config)?,
        Commands::Validate { file, row } => validate(file, row, &config)?,
    };
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const DDL: &str = "create table `app_Users` (
  `ID` bigint(20) unsigned NOT NULL AUTO_INCREMENT COMMENT '',
  `Name` varchar(60) NOT NULL DEFAULT 'anon' COMMENT '',
  PRIMARY KEY (`ID`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8";

    fn ddl_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DDL.as_bytes()).unwrap();
        file
    }

    fn config() -> DatabaseConfig {
        DatabaseConfig {
            table_prefix: "app_".to_string(),
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn normalize_drops_options_and_keeps_prefix() {
        let file = ddl_file();
        let out = normalize(file.path(), &config()).unwrap();
        assert!(out.starts_with("CREATE TABLE `app_Users` (\n"));
        assert!(out.ends_with("PRIMARY KEY (`ID`)\n)"));
    }

    #[test]
    fn validate_fills_defaults() {
        let file = ddl_file();
        let out = validate(file.path(), r#"{"ID": 7}"#, &config()).unwrap();
        let row: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(row["Name"], "anon");
        assert_eq!(row["ID"], 7);
    }

    #[test]
    fn validate_rejects_unknown_columns() {
        let file = ddl_file();
        let err = validate(file.path(), r#"{"Nickname": "x"}"#, &config()).unwrap_err();
        assert!(format!("{err:#}").contains("Nickname"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = normalize(Path::new("/nonexistent/users.sql"), &config()).unwrap_err();
        assert!(err.to_string().contains("reading"));
    }
}
