//! Error types for the migration library.
//!
//! Two severities exist. [`MigrateError`] aborts the run; [`DocError`] is
//! scoped to a single source document, which is logged and skipped.

use thiserror::Error;

use crate::registry::RegistryError;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for destination database errors.
pub const EXIT_TARGET_ERROR: u8 = 3;
/// Exit code for source backup errors.
pub const EXIT_SOURCE_ERROR: u8 = 4;
/// Exit code for I/O errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source backup could not be read at all
    #[error("Source backup error: {0}")]
    Source(String),

    /// Target database error reported by the driver
    #[error("Target database error: {0}")]
    Target(#[from] mysql_async::Error),

    /// Connection error with context
    #[error("Connection error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// A single statement was rejected by the destination store
    #[error("Statement rejected on {table}: {message}")]
    Statement { table: String, message: String },

    /// A stage-level operation (clear, commit) failed
    #[error("Stage {stage} failed: {message}")]
    Stage { stage: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Statement error
    pub fn statement(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Statement {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a Stage error
    pub fn stage(stage: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Stage {
            stage: stage.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error must abort the whole run.
    ///
    /// A statement the server rejected (constraint violation, bad value) only
    /// costs the current document. Anything that means the connection or the
    /// stage itself is gone is fatal.
    pub fn is_fatal(&self) -> bool {
        match self {
            MigrateError::Statement { .. } => false,
            MigrateError::Target(mysql_async::Error::Server(_)) => false,
            _ => true,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => EXIT_CONFIG_ERROR,
            MigrateError::Source(_) => EXIT_SOURCE_ERROR,
            MigrateError::Target(_)
            | MigrateError::Pool { .. }
            | MigrateError::Statement { .. }
            | MigrateError::Stage { .. } => EXIT_TARGET_ERROR,
            MigrateError::Io(_) => EXIT_IO_ERROR,
            MigrateError::Json(_) => EXIT_CONFIG_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Failure scoped to one source document.
#[derive(Error, Debug)]
pub enum DocError {
    /// The document has no `_id` field.
    #[error("document has no _id")]
    MissingId,

    /// A field holds a value the migrator cannot store.
    #[error("field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// The identifier registry refused the mapping.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The destination store rejected a statement for this document.
    #[error(transparent)]
    Target(#[from] MigrateError),
}

impl DocError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DocError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Escalate to a run-level error when the underlying cause is fatal.
    pub fn into_fatal(self) -> std::result::Result<Self, MigrateError> {
        match self {
            DocError::Target(e) if e.is_fatal() => Err(e),
            other => Ok(other),
        }
    }
}

impl From<serde_json::Error> for DocError {
    fn from(e: serde_json::Error) -> Self {
        DocError::invalid("<json>", e.to_string())
    }
}

/// Result of migrating one document.
pub type DocResult<T> = std::result::Result<T, DocError>;
