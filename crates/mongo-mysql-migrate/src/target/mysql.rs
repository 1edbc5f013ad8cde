//! MySQL/MariaDB destination store.
//!
//! Uses a `mysql_async` pool. Every stage session runs with autocommit off so
//! that a stage's writes become visible at its explicit commit.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Timelike};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts};
use tracing::{debug, info};

use super::{ExecResult, SqlValue, Statement, TargetSession, TargetStore};
use crate::config::TargetConfig;
use crate::error::{MigrateError, Result};

/// MySQL destination using mysql_async.
pub struct MysqlTarget {
    pool: Pool,
    endpoint: String,
}

impl MysqlTarget {
    /// Create the pool and verify the server answers.
    pub async fn new(config: &TargetConfig) -> Result<Self> {
        let target = Self::connect(config)?;
        target.test_connection().await?;
        info!("Connected to MySQL target: {}", target.endpoint);
        Ok(target)
    }

    /// Create the pool without opening a connection.
    pub fn connect(config: &TargetConfig) -> Result<Self> {
        let constraints = PoolConstraints::new(1, 2)
            .ok_or_else(|| MigrateError::pool("invalid pool constraints", "creating pool"))?;

        let builder = OptsBuilder::default()
            .ip_or_hostname(&config.host)
            .tcp_port(config.port)
            .db_name(Some(&config.database))
            .user(Some(&config.user))
            .pass(Some(&config.password))
            // Use utf8mb4 for full Unicode support
            .init(vec!["SET NAMES utf8mb4"])
            .pool_opts(PoolOpts::new().with_constraints(constraints));

        let opts: Opts = builder.into();
        Ok(Self {
            pool: Pool::new(opts),
            endpoint: format!("{}:{}/{}", config.host, config.port, config.database),
        })
    }

    /// Get a clone of the underlying connection pool.
    pub fn pool(&self) -> Pool {
        self.pool.clone()
    }
}

#[async_trait]
impl TargetStore for MysqlTarget {
    async fn open_session(&self) -> Result<Box<dyn TargetSession>> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| MigrateError::pool(e, "opening MySQL session"))?;

        conn.query_drop("SET autocommit = 0")
            .await
            .map_err(|e| MigrateError::pool(e, "disabling autocommit"))?;

        Ok(Box::new(MysqlSession { conn: Some(conn) }))
    }

    async fn test_connection(&self) -> Result<()> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| MigrateError::pool(e, "testing MySQL connection"))?;
        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| MigrateError::pool(e, "testing MySQL connection"))?;
        Ok(())
    }

    fn db_type(&self) -> &str {
        "mysql"
    }

    async fn close(&self) {
        if let Err(e) = self.pool.clone().disconnect().await {
            debug!("error disconnecting MySQL pool: {}", e);
        }
    }
}

/// A single connection held for one stage.
struct MysqlSession {
    conn: Option<Conn>,
}

impl MysqlSession {
    fn conn(&mut self) -> Result<&mut Conn> {
        self.conn
            .as_mut()
            .ok_or_else(|| MigrateError::pool("session already closed", "using MySQL session"))
    }
}

#[async_trait]
impl TargetSession for MysqlSession {
    async fn execute(&mut self, stmt: &Statement) -> Result<ExecResult> {
        let (sql, params) = stmt.to_mysql();
        let conn = self.conn()?;

        if params.is_empty() {
            conn.query_drop(sql).await?;
        } else {
            let params: Vec<mysql_async::Value> = params.iter().map(sql_value_to_mysql).collect();
            conn.exec_drop(sql, params).await?;
        }

        Ok(ExecResult {
            rows_affected: conn.affected_rows(),
            last_insert_id: conn.last_insert_id(),
        })
    }

    async fn query(&mut self, stmt: &Statement) -> Result<Vec<Vec<SqlValue>>> {
        let (sql, params) = stmt.to_mysql();
        let params: Vec<mysql_async::Value> = params.iter().map(sql_value_to_mysql).collect();
        let conn = self.conn()?;

        let rows: Vec<mysql_async::Row> = conn.exec(sql, params).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.unwrap().into_iter().map(mysql_to_sql_value).collect())
            .collect())
    }

    async fn commit(&mut self) -> Result<()> {
        self.conn()?.query_drop("COMMIT").await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.disconnect().await {
                debug!("error closing MySQL session: {}", e);
            }
        }
    }
}

fn sql_value_to_mysql(value: &SqlValue) -> mysql_async::Value {
    match value {
        SqlValue::Null => mysql_async::Value::NULL,
        SqlValue::Bool(b) => mysql_async::Value::from(*b),
        SqlValue::I64(i) => mysql_async::Value::from(*i),
        SqlValue::F64(f) => mysql_async::Value::from(*f),
        SqlValue::Text(s) => mysql_async::Value::from(s.as_str()),
        SqlValue::DateTime(dt) => mysql_async::Value::Date(
            dt.year() as u16,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            dt.nanosecond() / 1_000 % 1_000_000,
        ),
        SqlValue::Date(d) => {
            mysql_async::Value::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0)
        }
    }
}

fn mysql_to_sql_value(value: mysql_async::Value) -> SqlValue {
    use mysql_async::Value;

    match value {
        Value::NULL => SqlValue::Null,
        Value::Bytes(b) => SqlValue::Text(String::from_utf8_lossy(&b).into_owned()),
        Value::Int(i) => SqlValue::I64(i),
        Value::UInt(u) => SqlValue::I64(u as i64),
        Value::Float(f) => SqlValue::F64(f as f64),
        Value::Double(d) => SqlValue::F64(d),
        Value::Date(y, m, d, h, mi, s, us) => {
            NaiveDate::from_ymd_opt(y as i32, m as u32, d as u32)
                .and_then(|date| date.and_hms_micro_opt(h as u32, mi as u32, s as u32, us))
                .map_or(SqlValue::Null, SqlValue::DateTime)
        }
        Value::Time(neg, days, h, m, s, _) => {
            let hours = days * 24 + h as u32;
            let sign = if neg { "-" } else { "" };
            SqlValue::Text(format!("{sign}{hours:02}:{m:02}:{s:02}"))
        }
    }
}
