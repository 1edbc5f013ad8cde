//! In-process destination store.
//!
//! Tables are created up front with [`MemoryTarget::with_table`] or the full
//! destination layout via [`MemoryTarget::with_destination_schema`]. Every
//! table carries an auto-increment `id`. Writes are applied immediately;
//! commits are only counted.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{ExecResult, Row, SqlValue, Statement, TargetSession, TargetStore};
use crate::error::{MigrateError, Result};
use crate::kind::TRUNCATE_ORDER;
use crate::migrate::settings::SETTING_KEYS;

/// Key column present on every in-memory table.
const ID_COLUMN: &str = "id";

/// A stored row.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRow {
    pub id: u64,
    pub values: BTreeMap<String, SqlValue>,
}

impl MemoryRow {
    /// Column value; `id` resolves to the generated key.
    pub fn get(&self, column: &str) -> Option<SqlValue> {
        if column == ID_COLUMN {
            return Some(SqlValue::I64(self.id as i64));
        }
        self.values.get(column).cloned()
    }

    /// Text column, when set to text.
    pub fn text(&self, column: &str) -> Option<String> {
        self.values
            .get(column)
            .and_then(|v| v.as_text())
            .map(str::to_string)
    }

    /// Key-valued column.
    pub fn key(&self, column: &str) -> Option<u64> {
        self.get(column).and_then(|v| v.as_key())
    }
}

#[derive(Debug, Default)]
struct MemoryTable {
    rows: Vec<MemoryRow>,
    next_id: u64,
    unique: Vec<String>,
}

impl MemoryTable {
    fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// `column = value` with SQL semantics: NULL never matches.
    fn matches(row: &MemoryRow, column: &str, value: &SqlValue) -> bool {
        !value.is_null() && row.get(column).as_ref() == Some(value)
    }

    fn insert(&mut self, table: &str, row: &Row) -> Result<u64> {
        for column in &self.unique {
            let Some(value) = row.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            if self.rows.iter().any(|r| Self::matches(r, column, value)) {
                return Err(MigrateError::statement(
                    table,
                    format!("Duplicate entry for key '{}'", column),
                ));
            }
        }

        Ok(self.push(row))
    }

    fn push(&mut self, row: &Row) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.push(MemoryRow {
            id,
            values: row
                .values
                .iter()
                .map(|(c, v)| (c.to_string(), v.clone()))
                .collect(),
        });
        id
    }
}

#[derive(Debug, Default)]
struct MemoryDatabase {
    tables: BTreeMap<String, MemoryTable>,
    commits: usize,
    foreign_key_checks: bool,
    closed: bool,
}

impl MemoryDatabase {
    fn table_mut(&mut self, name: &str) -> Result<&mut MemoryTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| MigrateError::statement(name, format!("Table '{}' doesn't exist", name)))
    }

    fn execute(&mut self, stmt: &Statement) -> Result<ExecResult> {
        match stmt {
            Statement::Insert(row) => {
                let id = self.table_mut(row.table)?.insert(row.table, row)?;
                Ok(ExecResult {
                    rows_affected: 1,
                    last_insert_id: Some(id),
                })
            }
            Statement::Update { table, set, filter } => {
                let t = self.table_mut(table)?;
                let mut affected = 0;
                for row in t
                    .rows
                    .iter_mut()
                    .filter(|r| MemoryTable::matches(r, filter.column, &filter.value))
                {
                    for (column, value) in set {
                        row.values.insert(column.to_string(), value.clone());
                    }
                    affected += 1;
                }
                Ok(ExecResult {
                    rows_affected: affected,
                    last_insert_id: None,
                })
            }
            Statement::Truncate { table } => {
                let t = self.table_mut(table)?;
                t.rows.clear();
                t.next_id = 1;
                Ok(ExecResult::default())
            }
            Statement::SetForeignKeyChecks(on) => {
                self.foreign_key_checks = *on;
                Ok(ExecResult::default())
            }
            Statement::Select { table, .. } => Err(MigrateError::statement(
                *table,
                "SELECT must be run as a query",
            )),
        }
    }

    fn query(&mut self, stmt: &Statement) -> Result<Vec<Vec<SqlValue>>> {
        let Statement::Select {
            table,
            columns,
            filter,
        } = stmt
        else {
            return Err(MigrateError::statement(
                stmt.table().unwrap_or("<session>"),
                "only SELECT can be run as a query",
            ));
        };

        let t = self.table_mut(table)?;
        Ok(t.rows
            .iter()
            .filter(|r| {
                filter
                    .as_ref()
                    .map_or(true, |f| MemoryTable::matches(r, f.column, &f.value))
            })
            .map(|r| {
                columns
                    .iter()
                    .map(|c| r.get(c).unwrap_or(SqlValue::Null))
                    .collect()
            })
            .collect())
    }
}

/// In-memory destination store.
#[derive(Debug, Clone)]
pub struct MemoryTarget {
    db: Arc<Mutex<MemoryDatabase>>,
    reachable: bool,
}

impl Default for MemoryTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTarget {
    /// An empty store with no tables.
    pub fn new() -> Self {
        Self {
            db: Arc::new(Mutex::new(MemoryDatabase {
                foreign_key_checks: true,
                ..Default::default()
            })),
            reachable: true,
        }
    }

    /// A store that refuses every session.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Every destination table, with `settings` holding its known keys.
    pub fn with_destination_schema() -> Self {
        let target = TRUNCATE_ORDER
            .iter()
            .fold(Self::new(), |t, table| t.with_table(table))
            .with_table("settings");

        {
            let mut db = target.lock();
            if let Some(settings) = db.tables.get_mut("settings") {
                for (key, _, _) in SETTING_KEYS {
                    settings.push(&Row::new("settings").set("key", *key));
                }
            }
        }
        target
    }

    /// Add an empty table.
    pub fn with_table(self, name: &str) -> Self {
        self.lock()
            .tables
            .entry(name.to_string())
            .or_insert_with(MemoryTable::new);
        self
    }

    /// Enforce uniqueness of non-null values in `column`.
    pub fn with_unique(self, table: &str, column: &str) -> Self {
        self.lock()
            .tables
            .entry(table.to_string())
            .or_insert_with(MemoryTable::new)
            .unique
            .push(column.to_string());
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryDatabase> {
        lock(&self.db)
    }

    /// Insert a row outside of any session.
    pub fn seed(&self, row: Row) -> Result<u64> {
        self.lock().table_mut(row.table)?.insert(row.table, &row)
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Vec<MemoryRow> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock().tables.get(table).map_or(0, |t| t.rows.len())
    }

    /// Row counts of every non-empty table.
    pub fn table_counts(&self) -> BTreeMap<String, usize> {
        self.lock()
            .tables
            .iter()
            .filter(|(_, t)| !t.rows.is_empty())
            .map(|(name, t)| (name.clone(), t.rows.len()))
            .collect()
    }

    /// Number of commits issued across all sessions.
    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    pub fn foreign_key_checks(&self) -> bool {
        self.lock().foreign_key_checks
    }

    /// Whether [`TargetStore::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[async_trait]
impl TargetStore for MemoryTarget {
    async fn open_session(&self) -> Result<Box<dyn TargetSession>> {
        if !self.reachable {
            return Err(MigrateError::pool(
                "connection refused",
                "opening memory session",
            ));
        }
        Ok(Box::new(MemorySession {
            db: Arc::clone(&self.db),
            open: true,
        }))
    }

    async fn test_connection(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(MigrateError::pool(
                "connection refused",
                "testing memory connection",
            ))
        }
    }

    fn db_type(&self) -> &str {
        "memory"
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}

struct MemorySession {
    db: Arc<Mutex<MemoryDatabase>>,
    open: bool,
}

impl MemorySession {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(MigrateError::pool(
                "session already closed",
                "using memory session",
            ))
        }
    }
}

#[async_trait]
impl TargetSession for MemorySession {
    async fn execute(&mut self, stmt: &Statement) -> Result<ExecResult> {
        self.ensure_open()?;
        lock(&self.db).execute(stmt)
    }

    async fn query(&mut self, stmt: &Statement) -> Result<Vec<Vec<SqlValue>>> {
        self.ensure_open()?;
        lock(&self.db).query(stmt)
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        lock(&self.db).commits += 1;
        Ok(())
    }

    async fn close(&mut self) {
        self.open = false;
    }
}

fn lock(db: &Mutex<MemoryDatabase>) -> MutexGuard<'_, MemoryDatabase> {
    db.lock().unwrap_or_else(PoisonError::into_inner)
}
