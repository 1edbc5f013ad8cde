//! Statements understood by every destination store.
//!
//! Migrators describe what they want done with [`Statement`]; the MySQL
//! session renders it to SQL with positional parameters, the in-memory store
//! interprets it directly.

use super::SqlValue;

/// A flat row destined for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub table: &'static str,
    pub values: Vec<(&'static str, SqlValue)>,
}

impl Row {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            values: Vec::new(),
        }
    }

    /// Append a column value.
    pub fn set(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.values.push((column, value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(c, _)| *c)
    }
}

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: SqlValue,
}

/// A statement against the destination store.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Insert one row; the store reports the generated key.
    Insert(Row),

    /// Update the rows matching `filter`.
    Update {
        table: &'static str,
        set: Vec<(&'static str, SqlValue)>,
        filter: Filter,
    },

    /// Read `columns` from the rows matching `filter` (all rows when `None`).
    Select {
        table: &'static str,
        columns: Vec<&'static str>,
        filter: Option<Filter>,
    },

    /// Remove every row and reset the key sequence.
    Truncate { table: &'static str },

    /// Toggle foreign key enforcement for the session.
    SetForeignKeyChecks(bool),
}

impl Statement {
    pub fn insert(row: Row) -> Self {
        Statement::Insert(row)
    }

    /// `UPDATE table SET column = value WHERE filter_column = filter_value`
    pub fn update(
        table: &'static str,
        set: Vec<(&'static str, SqlValue)>,
        filter_column: &'static str,
        filter_value: impl Into<SqlValue>,
    ) -> Self {
        Statement::Update {
            table,
            set,
            filter: Filter {
                column: filter_column,
                value: filter_value.into(),
            },
        }
    }

    /// `SELECT columns FROM table`
    pub fn select_all(table: &'static str, columns: Vec<&'static str>) -> Self {
        Statement::Select {
            table,
            columns,
            filter: None,
        }
    }

    /// `SELECT columns FROM table WHERE column = value`
    pub fn select_where(
        table: &'static str,
        columns: Vec<&'static str>,
        column: &'static str,
        value: impl Into<SqlValue>,
    ) -> Self {
        Statement::Select {
            table,
            columns,
            filter: Some(Filter {
                column,
                value: value.into(),
            }),
        }
    }

    /// Table the statement touches, if any.
    pub fn table(&self) -> Option<&'static str> {
        match self {
            Statement::Insert(row) => Some(row.table),
            Statement::Update { table, .. }
            | Statement::Select { table, .. }
            | Statement::Truncate { table } => Some(*table),
            Statement::SetForeignKeyChecks(_) => None,
        }
    }

    /// Render as MySQL text with `?` placeholders.
    pub fn to_mysql(&self) -> (String, Vec<SqlValue>) {
        match self {
            Statement::Insert(row) => {
                let cols: Vec<String> = row.columns().map(quote_ident).collect();
                let placeholders = vec!["?"; cols.len()].join(", ");
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    quote_ident(row.table),
                    cols.join(", "),
                    placeholders
                );
                let params = row.values.iter().map(|(_, v)| v.clone()).collect();
                (sql, params)
            }
            Statement::Update { table, set, filter } => {
                let assignments: Vec<String> = set
                    .iter()
                    .map(|(c, _)| format!("{} = ?", quote_ident(c)))
                    .collect();
                let sql = format!(
                    "UPDATE {} SET {} WHERE {} = ?",
                    quote_ident(table),
                    assignments.join(", "),
                    quote_ident(filter.column)
                );
                let mut params: Vec<SqlValue> = set.iter().map(|(_, v)| v.clone()).collect();
                params.push(filter.value.clone());
                (sql, params)
            }
            Statement::Select {
                table,
                columns,
                filter,
            } => {
                let cols: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
                let mut sql = format!("SELECT {} FROM {}", cols.join(", "), quote_ident(table));
                let mut params = Vec::new();
                if let Some(f) = filter {
                    sql.push_str(&format!(" WHERE {} = ?", quote_ident(f.column)));
                    params.push(f.value.clone());
                }
                (sql, params)
            }
            Statement::Truncate { table } => {
                (format!("TRUNCATE TABLE {}", quote_ident(table)), Vec::new())
            }
            Statement::SetForeignKeyChecks(on) => (
                format!("SET FOREIGN_KEY_CHECKS = {}", if *on { 1 } else { 0 }),
                Vec::new(),
            ),
        }
    }
}

/// Quote a MySQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
