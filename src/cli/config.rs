//! Configuration file for the CLI
//!
//! ```json
//! {
//!   "database_path": "./ranks.db",
//!   "table": "records",
//!   "order_column": "order",
//!   "log_level": "info"
//! }
//! ```
//!
//! Only `database_path` is required.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::store::{validate_identifier, TableLayout, DEFAULT_ORDER_COLUMN, DEFAULT_TABLE};

use super::errors::{CliError, CliResult};

/// Columns the record table already uses
const RESERVED_COLUMNS: &[&str] = &["id", "scope", "payload", "created_at"];

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file (required)
    pub database_path: String,

    /// Record table name (optional, default "records")
    #[serde(default = "default_table")]
    pub table: String,

    /// Rank column name (optional, default "order")
    #[serde(default = "default_order_column")]
    pub order_column: String,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}
fn default_order_column() -> String {
    DEFAULT_ORDER_COLUMN.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and apply its log level
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Logger::set_min_severity(config.severity()?);

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("database_path", config.database_path.as_str()),
                ("order_column", config.order_column.as_str()),
                ("table", config.table.as_str()),
            ],
        );
        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> CliResult<()> {
        if self.database_path.trim().is_empty() {
            return Err(CliError::config_error("database_path must not be empty"));
        }

        validate_identifier(&self.table)
            .map_err(|_| CliError::config_error(format!("Invalid table name: '{}'", self.table)))?;
        validate_identifier(&self.order_column).map_err(|_| {
            CliError::config_error(format!("Invalid order_column: '{}'", self.order_column))
        })?;
        if RESERVED_COLUMNS.contains(&self.order_column.as_str()) {
            return Err(CliError::config_error(format!(
                "order_column '{}' collides with a reserved column",
                self.order_column
            )));
        }

        self.severity()?;
        Ok(())
    }

    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    pub fn database_path(&self) -> &Path {
        Path::new(&self.database_path)
    }

    pub fn layout(&self) -> TableLayout {
        TableLayout {
            table: self.table.clone(),
            order_column: self.order_column.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Config {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(json!({"database_path": "x.db"}));
        assert_eq!(config.table, "records");
        assert_eq!(config.order_column, "order");
        assert_eq!(config.log_level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn test_database_path_required() {
        let result: Result<Config, _> = serde_json::from_value(json!({"table": "t"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        let config = parse(json!({"database_path": "x.db", "table": "rec; DROP"}));
        assert!(config.validate().is_err());

        let config = parse(json!({"database_path": "x.db", "order_column": "1st"}));
        assert!(config.validate().is_err());

        let config = parse(json!({"database_path": "x.db", "order_column": "scope"}));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_log_level() {
        let config = parse(json!({"database_path": "x.db", "log_level": "loud"}));
        assert!(config.validate().is_err());

        let config = parse(json!({"database_path": "x.db", "log_level": "WARN"}));
        assert_eq!(config.severity().unwrap(), Severity::Warn);
    }
}
