//! # mongo-mysql-migrate
//!
//! One-shot migration of a MongoDB BSON backup into a MySQL schema.
//!
//! Every source document gets a fresh integer key in the destination. The
//! mapping from original object ids to new keys is kept per kind in an
//! [`IdentifierRegistry`] so that later kinds can rewrite their references:
//!
//! - **Fixed stage order** so that referenced kinds are migrated first
//! - **Per-document failures** are logged and skipped, never abort the run
//! - **Two-pass categories** for parents listed after their children
//! - **Brand de-duplication** against rows already in the destination
//! - **Association tables** rebuilt from lists of related ids
//!
//! ## Example
//!
//! ```rust,no_run
//! use mongo_mysql_migrate::{Config, Orchestrator};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let report = orchestrator.run().await?;
//!     for line in report.summary_lines() {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod kind;
pub mod migrate;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod source;
pub mod target;

// Re-exports for convenient access
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig};
pub use document::{Document, Value};
pub use error::{DocError, MigrateError, Result};
pub use kind::EntityKind;
pub use orchestrator::{health_check, inspect, BatchSummary, HealthCheckResult, Orchestrator};
pub use registry::IdentifierRegistry;
pub use report::{MigrationReport, StageReport, StageStatus};
pub use source::{BatchLoad, BsonDirSource, DocumentSource, MemorySource};
pub use target::{MemoryTarget, MysqlTarget, SqlValue, TargetSession, TargetStore};
