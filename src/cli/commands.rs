//! CLI command implementations
//!
//! Each command is one process: load config, open the store, run one
//! ordering operation in its own transaction, print one JSON line.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use crate::observability::{log_event_with_fields, Event};
use crate::ordering::{MoveDirection, MoveOutcome, OrderMaintainer};
use crate::store::{NewRecord, OrderedRecord, Query, RecordId, RecordStore, Scope, SqliteStore};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    let data = run_command(cli.command)?;
    write_response(&data)
}

/// Run a command and return its response payload
pub fn run_command(cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Insert {
            config,
            scope,
            payload,
            id,
        } => insert(&config, &scope, &payload, id),
        Command::Delete { config, id, scope } => delete(&config, &scope, &id),
        Command::MoveUp { config, id, scope } => move_record(&config, &scope, &id, MoveDirection::Up),
        Command::MoveDown { config, id, scope } => {
            move_record(&config, &scope, &id, MoveDirection::Down)
        }
        Command::List {
            config,
            scope,
            limit,
        } => list(&config, &scope, limit),
        Command::Verify { config, scope } => verify(&config, &scope),
        Command::Repair { config, scope } => repair(&config, &scope),
    }
}

/// Create the database file and record table
pub fn init(config_path: &Path) -> CliResult<Value> {
    let config = Config::load(config_path)?;
    let path = config.database_path();

    if path.exists() {
        return Err(CliError::already_initialized(path));
    }

    SqliteStore::open(path, config.layout())?;
    log_event_with_fields(
        Event::StoreOpened,
        &[("database_path", config.database_path.as_str()), ("created", "true")],
    );

    Ok(json!({
        "initialized": true,
        "database_path": config.database_path,
        "table": config.table,
        "order_column": config.order_column,
    }))
}

/// Append a record
pub fn insert(config_path: &Path, scope: &str, payload: &str, id: Option<String>) -> CliResult<Value> {
    let payload: Value = serde_json::from_str(payload)
        .map_err(|e| CliError::invalid_argument(format!("--payload is not valid JSON: {}", e)))?;
    let (mut store, maintainer) = open(config_path)?;

    let scope = Scope::partition(scope);
    let record = match id {
        Some(id) => NewRecord::with_id(RecordId::new(id), scope, payload),
        None => NewRecord::new(scope, payload),
    };
    let stored = maintainer.insert(&mut store, record, None)?;
    to_value(&stored)
}

/// Delete a record and renumber its scope
pub fn delete(config_path: &Path, scope: &str, id: &str) -> CliResult<Value> {
    let (mut store, maintainer) = open(config_path)?;
    let removed = maintainer.delete(&mut store, &Scope::partition(scope), &RecordId::new(id), None)?;
    to_value(&removed)
}

#[derive(Serialize)]
struct MoveResponse {
    #[serde(flatten)]
    outcome: MoveOutcome,
    record: OrderedRecord,
}

/// Move a record one rank
pub fn move_record(
    config_path: &Path,
    scope: &str,
    id: &str,
    direction: MoveDirection,
) -> CliResult<Value> {
    let (mut store, maintainer) = open(config_path)?;
    let scope = Scope::partition(scope);
    let id = RecordId::new(id);

    let mut record = store
        .find_by_id(&scope, &id)?
        .ok_or_else(|| crate::ordering::OrderError::record_not_found(&scope, &id))?;

    let outcome = match direction {
        MoveDirection::Up => maintainer.move_up(&mut store, &scope, &mut record, None)?,
        MoveDirection::Down => maintainer.move_down(&mut store, &scope, &mut record, None)?,
    };
    to_value(&MoveResponse { outcome, record })
}

/// List a scope in rank order
pub fn list(config_path: &Path, scope: &str, limit: Option<usize>) -> CliResult<Value> {
    let (store, maintainer) = open(config_path)?;
    let mut query = Query::scope(Scope::partition(scope));
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let records = maintainer.list(&store, query)?;
    to_value(&records)
}

/// Report whether a scope is dense
pub fn verify(config_path: &Path, scope: &str) -> CliResult<Value> {
    let (store, maintainer) = open(config_path)?;
    let report = maintainer.verify_scope(&store, &Scope::partition(scope))?;
    Ok(json!({
        "dense": report.is_dense(),
        "report": report,
    }))
}

/// Restore a scope to 1..N
pub fn repair(config_path: &Path, scope: &str) -> CliResult<Value> {
    let (mut store, maintainer) = open(config_path)?;
    let outcome = maintainer.repair_scope(&mut store, &Scope::partition(scope), None)?;
    to_value(&outcome)
}

/// Load config and open an existing database
fn open(config_path: &Path) -> CliResult<(SqliteStore, OrderMaintainer)> {
    let config = Config::load(config_path)?;
    let path = config.database_path();
    if !path.exists() {
        return Err(CliError::not_initialized(path));
    }

    let store = SqliteStore::open(path, config.layout())?;
    log_event_with_fields(
        Event::StoreOpened,
        &[("database_path", config.database_path.as_str()), ("created", "false")],
    );
    Ok((store, OrderMaintainer::new()))
}

fn to_value<T: Serialize>(data: &T) -> CliResult<Value> {
    Ok(serde_json::to_value(data)?)
}
