//! Destination store abstraction.
//!
//! A [`TargetStore`] hands out one [`TargetSession`] per stage. The session
//! owns its connection for the stage's lifetime and is closed when the stage
//! ends, whether it succeeded or not.
//!
//! Implementations:
//!
//! - [`MysqlTarget`]: MySQL/MariaDB via `mysql_async`
//! - [`MemoryTarget`]: in-process tables, used for dry runs and tests

mod memory;
mod mysql;
mod statement;
mod value;

pub use memory::{MemoryRow, MemoryTarget};
pub use mysql::MysqlTarget;
pub use statement::{quote_ident, Filter, Row, Statement};
pub use value::SqlValue;

use async_trait::async_trait;

use crate::error::Result;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Rows changed by the statement.
    pub rows_affected: u64,
    /// Key generated by an INSERT, when the table has an auto-increment key.
    pub last_insert_id: Option<u64>,
}

/// One connection-scoped unit of work on the destination store.
///
/// Writes stay pending until [`commit`](TargetSession::commit).
#[async_trait]
pub trait TargetSession: Send {
    /// Run a write statement.
    async fn execute(&mut self, stmt: &Statement) -> Result<ExecResult>;

    /// Run a SELECT and return its rows, columns in statement order.
    async fn query(&mut self, stmt: &Statement) -> Result<Vec<Vec<SqlValue>>>;

    /// Commit pending writes.
    async fn commit(&mut self) -> Result<()>;

    /// Release the connection. Safe to call more than once.
    async fn close(&mut self);
}

/// Factory for stage sessions.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Open a new session. Failure here is fatal for the run.
    async fn open_session(&self) -> Result<Box<dyn TargetSession>>;

    /// Check that the store is reachable.
    async fn test_connection(&self) -> Result<()>;

    /// Get the database type identifier (e.g., "mysql", "memory").
    fn db_type(&self) -> &str;

    /// Close the underlying pool.
    async fn close(&self);
}
