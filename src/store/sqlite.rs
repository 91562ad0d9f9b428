//! SQLite-backed record store
//!
//! One table holds every scope. The order column carries a
//! `UNIQUE(scope, order)` constraint, so the database itself rejects a
//! duplicate rank or a second sentinel in the same scope.
//!
//! Transactions open with `BEGIN IMMEDIATE`: the write lock is taken before
//! the first read, so a move or an insert never races another writer on the
//! same database file.
//!
//! Multi-row rank rewrites run inside a savepoint and pass through negative
//! temporary values, because SQLite checks uniqueness row by row during an
//! `UPDATE`.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::backend::RecordStore;
use super::errors::{StoreError, StoreResult};
use super::record::{
    OrderField, OrderedRecord, Query, Rank, RecordId, Scope, SortDirection, TxHandle,
};

/// Default table name
pub const DEFAULT_TABLE: &str = "records";

/// Default order column name
pub const DEFAULT_ORDER_COLUMN: &str = "order";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static IDENTIFIER: OnceLock<Regex> = OnceLock::new();

/// Check that `name` is a plain SQL identifier safe to splice into statements
pub fn validate_identifier(name: &str) -> StoreResult<()> {
    let re = IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern is valid")
    });
    if re.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Table layout for a `SqliteStore`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub table: String,
    pub order_column: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            order_column: DEFAULT_ORDER_COLUMN.to_string(),
        }
    }
}

impl TableLayout {
    pub fn new(table: impl Into<String>, order_column: impl Into<String>) -> StoreResult<Self> {
        let layout = Self {
            table: table.into(),
            order_column: order_column.into(),
        };
        validate_identifier(&layout.table)?;
        validate_identifier(&layout.order_column)?;
        Ok(layout)
    }
}

/// Raw row before rank/payload/timestamp decoding
type RawRow = (String, String, i64, String, String);

/// Record store over a single SQLite table
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    /// Quoted table name
    table: String,
    /// Quoted order column name
    col: String,
    active: Option<TxHandle>,
    next_tx: u64,
}

impl SqliteStore {
    /// Open (creating if needed) a database file
    pub fn open(path: impl AsRef<Path>, layout: TableLayout) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, layout)
    }

    /// Private in-memory database
    pub fn open_in_memory(layout: TableLayout) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, layout)
    }

    fn with_connection(conn: Connection, layout: TableLayout) -> StoreResult<Self> {
        validate_identifier(&layout.table)?;
        validate_identifier(&layout.order_column)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let store = Self {
            conn,
            table: format!("\"{}\"", layout.table),
            col: format!("\"{}\"", layout.order_column),
            active: None,
            next_tx: 0,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> StoreResult<()> {
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {t} (
              id TEXT PRIMARY KEY,
              scope TEXT NOT NULL DEFAULT '',
              {c} INTEGER NOT NULL,
              payload TEXT NOT NULL,
              created_at TEXT NOT NULL,
              UNIQUE(scope, {c})
            );
            "#,
            t = self.table,
            c = self.col
        ))?;
        Ok(())
    }

    fn select_columns(&self) -> String {
        format!(
            "SELECT id, scope, {c}, payload, created_at FROM {t}",
            c = self.col,
            t = self.table
        )
    }

    fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    }

    fn decode((id, scope, order, payload, created_at): RawRow) -> StoreResult<OrderedRecord> {
        let order = Rank::try_from(order)
            .map_err(|_| StoreError::CorruptRow(format!("record {id}: rank {order} out of range")))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StoreError::CorruptRow(format!("record {id}: created_at: {e}")))?
            .with_timezone(&Utc);
        Ok(OrderedRecord {
            payload: serde_json::from_str(&payload)?,
            id: RecordId::new(id),
            scope: Scope::partition(scope),
            order,
            created_at,
        })
    }

    fn query_one(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> StoreResult<Option<OrderedRecord>> {
        let raw = self
            .conn
            .query_row(sql, params, Self::read_raw)
            .optional()?;
        raw.map(Self::decode).transpose()
    }

    /// Run `f` inside a savepoint so multi-statement writes are atomic
    /// with or without an enclosing transaction.
    fn with_savepoint<T>(
        &self,
        name: &str,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.conn.execute_batch(&format!("SAVEPOINT {name}"))?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch(&format!("RELEASE {name}"))?;
                Ok(value)
            }
            Err(e) => {
                self.conn
                    .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"))?;
                Err(e)
            }
        }
    }

    fn check_active(&self, tx: TxHandle) -> StoreResult<()> {
        match self.active {
            Some(active) if active == tx => Ok(()),
            Some(_) => Err(StoreError::UnknownTransaction(tx)),
            None => Err(StoreError::NoTransaction),
        }
    }
}

/// Translate a constraint failure on the order column into `UniqueViolation`
fn unique_or(err: rusqlite::Error, scope: &Scope, order: Rank) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::UniqueViolation {
                scope: scope.clone(),
                order,
            }
        }
        _ => StoreError::Sqlite(err),
    }
}

impl RecordStore for SqliteStore {
    fn max_order(&self, scope: &Scope) -> StoreResult<Rank> {
        let max: i64 = self.conn.query_row(
            &format!(
                "SELECT COALESCE(MAX({c}), 0) FROM {t} WHERE scope = ?1",
                c = self.col,
                t = self.table
            ),
            params![scope.key()],
            |row| row.get(0),
        )?;
        Rank::try_from(max).map_err(|_| StoreError::CorruptRow(format!("max rank {max}")))
    }

    fn count_in_scope(&self, scope: &Scope) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE scope = ?1", self.table),
            params![scope.key()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn find_by_order(&self, scope: &Scope, order: Rank) -> StoreResult<Option<OrderedRecord>> {
        let sql = format!("{} WHERE scope = ?1 AND {} = ?2", self.select_columns(), self.col);
        self.query_one(&sql, params![scope.key(), order])
    }

    fn find_by_id(&self, scope: &Scope, id: &RecordId) -> StoreResult<Option<OrderedRecord>> {
        let sql = format!("{} WHERE scope = ?1 AND id = ?2", self.select_columns());
        self.query_one(&sql, params![scope.key(), id.as_str()])
    }

    fn find_all(&self, query: &Query) -> StoreResult<Vec<OrderedRecord>> {
        let mut sql = format!("{} WHERE scope = ?1", self.select_columns());
        if let Some(order_by) = query.order_by {
            let column = match order_by.field {
                OrderField::Rank => self.col.as_str(),
                OrderField::CreatedAt => "created_at",
                OrderField::Id => "id",
            };
            let direction = match order_by.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            sql.push_str(&format!(" ORDER BY {column} {direction}"));
        }
        // SQLite treats a negative LIMIT as unbounded
        let limit = query.limit.map(|l| l as i64).unwrap_or(-1);
        sql.push_str(" LIMIT ?2");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![query.scope.key(), limit], Self::read_raw)?;
        let mut records = Vec::new();
        for raw in rows {
            records.push(Self::decode(raw?)?);
        }
        Ok(records)
    }

    fn insert(&mut self, record: &OrderedRecord) -> StoreResult<()> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1", self.table),
                params![record.id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }

        let payload = serde_json::to_string(&record.payload)?;
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {t} (id, scope, {c}, payload, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    t = self.table,
                    c = self.col
                ),
                params![
                    record.id.as_str(),
                    record.scope.key(),
                    record.order,
                    payload,
                    record.created_at.to_rfc3339()
                ],
            )
            .map_err(|e| unique_or(e, &record.scope, record.order))?;
        Ok(())
    }

    fn delete(&mut self, scope: &Scope, id: &RecordId) -> StoreResult<OrderedRecord> {
        let record = self
            .find_by_id(scope, id)?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.conn.execute(
            &format!("DELETE FROM {} WHERE scope = ?1 AND id = ?2", self.table),
            params![scope.key(), id.as_str()],
        )?;
        Ok(record)
    }

    fn set_order(&mut self, scope: &Scope, id: &RecordId, order: Rank) -> StoreResult<()> {
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE {t} SET {c} = ?1 WHERE scope = ?2 AND id = ?3",
                    t = self.table,
                    c = self.col
                ),
                params![order, scope.key(), id.as_str()],
            )
            .map_err(|e| unique_or(e, scope, order))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn bulk_decrement_order_above(&mut self, scope: &Scope, threshold: Rank) -> StoreResult<u64> {
        let (t, c) = (&self.table, &self.col);
        let flip = format!("UPDATE {t} SET {c} = -{c} WHERE scope = ?1 AND {c} > ?2");
        let restore = format!("UPDATE {t} SET {c} = -{c} - 1 WHERE scope = ?1 AND {c} < 0");
        self.with_savepoint("rank_shift", |conn| {
            let shifted = conn.execute(&flip, params![scope.key(), threshold])?;
            conn.execute(&restore, params![scope.key()])?;
            Ok(shifted as u64)
        })
    }

    fn reassign_orders(
        &mut self,
        scope: &Scope,
        assignments: &[(RecordId, Rank)],
    ) -> StoreResult<()> {
        let update = format!(
            "UPDATE {t} SET {c} = ?1 WHERE scope = ?2 AND id = ?3",
            t = self.table,
            c = self.col
        );
        self.with_savepoint("rank_reassign", |conn| {
            let mut stmt = conn.prepare(&update)?;
            for (i, (id, _)) in assignments.iter().enumerate() {
                let parked = -(i as i64) - 1;
                if stmt.execute(params![parked, scope.key(), id.as_str()])? == 0 {
                    return Err(StoreError::NotFound(id.clone()));
                }
            }
            for (id, order) in assignments {
                stmt.execute(params![order, scope.key(), id.as_str()])
                    .map_err(|e| unique_or(e, scope, *order))?;
            }
            Ok(())
        })
    }

    fn begin_transaction(&mut self) -> StoreResult<TxHandle> {
        if let Some(active) = self.active {
            return Err(StoreError::TransactionActive(active));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.next_tx += 1;
        let handle = TxHandle::new(self.next_tx);
        self.active = Some(handle);
        Ok(handle)
    }

    fn commit(&mut self, tx: TxHandle) -> StoreResult<()> {
        self.check_active(tx)?;
        self.conn.execute_batch("COMMIT")?;
        self.active = None;
        Ok(())
    }

    fn rollback(&mut self, tx: TxHandle) -> StoreResult<()> {
        self.check_active(tx)?;
        self.active = None;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn active_transaction(&self) -> Option<TxHandle> {
        self.active
    }
}
