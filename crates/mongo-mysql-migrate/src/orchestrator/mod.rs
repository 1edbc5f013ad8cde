//! Migration orchestrator - main workflow coordinator.
//!
//! A run is strictly sequential:
//!
//! 1. Clear: empty every destination table (optional)
//! 2. Migrate: one stage per kind, in [`EntityKind::MIGRATION_ORDER`]
//! 3. Report: per-stage outcomes and per-kind totals

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{Config, SourceConfig};
use crate::error::{MigrateError, Result};
use crate::kind::{EntityKind, TRUNCATE_ORDER};
use crate::migrate::{migrator_for, run_stage, StageContext};
use crate::registry::IdentifierRegistry;
use crate::report::{MigrationReport, StageReport};
use crate::source::{BatchLoad, BsonDirSource, DocumentSource};
use crate::target::{MysqlTarget, Statement, TargetSession, TargetStore};

/// Migration orchestrator.
pub struct Orchestrator {
    config: Config,
    source: Arc<dyn DocumentSource>,
    target: Arc<dyn TargetStore>,
}

/// Document count of one batch, as reported by [`Orchestrator::inspect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Destination table of the kind.
    pub kind: String,

    /// Batch name in the backup.
    pub batch: String,

    /// Documents in the batch; `None` when the batch does not exist.
    pub documents: Option<usize>,
}

/// Outcome of a destination connection check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub target_connected: bool,
    pub target_latency_ms: u64,
    pub target_error: Option<String>,
}

impl HealthCheckResult {
    /// Turn a failed check back into a connection error.
    pub fn into_result(self) -> Result<()> {
        match self.target_error {
            Some(e) if !self.target_connected => Err(MigrateError::pool(e, "health check")),
            _ => Ok(()),
        }
    }
}

impl Orchestrator {
    /// Create an orchestrator reading the backup directory and writing to
    /// MySQL.
    pub async fn new(config: Config) -> Result<Self> {
        let source = BsonDirSource::open(&config.source.backup_path)?;
        let target = MysqlTarget::new(&config.target).await?;
        Ok(Self::with_parts(config, Arc::new(source), Arc::new(target)))
    }

    /// Create an orchestrator over explicit source and target stores.
    pub fn with_parts(
        config: Config,
        source: Arc<dyn DocumentSource>,
        target: Arc<dyn TargetStore>,
    ) -> Self {
        Self {
            config,
            source,
            target,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the migration.
    pub async fn run(&self) -> Result<MigrationReport> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        info!("Starting migration run: {}", run_id);
        info!(
            "Source: {}, target: {}",
            self.source.describe(),
            self.target.db_type()
        );

        let cleared = self.config.migration.clear_target;
        if cleared {
            info!("Clearing destination tables");
            self.clear().await?;
        } else {
            info!("Keeping existing destination rows");
        }

        let mut registry = IdentifierRegistry::new();
        let mut stages = Vec::with_capacity(EntityKind::MIGRATION_ORDER.len());
        for kind in EntityKind::MIGRATION_ORDER {
            stages.push(self.migrate_kind(kind, &mut registry).await?);
        }

        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let mut report = MigrationReport {
            run_id,
            status: "completed".to_string(),
            config_hash: self.config.hash(),
            cleared,
            started_at,
            completed_at,
            duration_seconds,
            stages,
            totals: MigrationReport::totals_from(&registry),
        };

        let failures = report.failures();
        if failures > 0 {
            warn!("{} documents could not be migrated", failures);
            report.status = "completed_with_errors".to_string();
        }
        info!("Migration finished in {:.2}s", report.duration_seconds);
        Ok(report)
    }

    /// Count the documents of every batch without touching the destination.
    pub async fn inspect(&self) -> Result<Vec<BatchSummary>> {
        inspect(self.source.as_ref(), &self.config.source).await
    }

    /// Check that the destination accepts connections.
    pub async fn health_check(&self) -> HealthCheckResult {
        health_check(self.target.as_ref()).await
    }

    /// Release the destination's connections.
    pub async fn close(&self) {
        self.target.close().await;
    }

    /// Empty every destination table with foreign-key checks disabled.
    async fn clear(&self) -> Result<()> {
        let mut session = self.target.open_session().await?;
        let result = truncate_all(session.as_mut()).await;
        session.close().await;
        result
    }

    async fn migrate_kind(
        &self,
        kind: EntityKind,
        registry: &mut IdentifierRegistry,
    ) -> Result<StageReport> {
        let batch = self.config.source.batch_for(kind);
        let docs = match self.source.load(batch).await? {
            BatchLoad::Missing => {
                info!("{} file not found", kind.label());
                return Ok(StageReport::missing(kind, batch));
            }
            BatchLoad::Loaded(docs) => docs,
        };

        info!("Migrating {}...", kind.label());
        let started = Instant::now();
        let mut report = StageReport::new(kind, batch);

        let mut session = self.target.open_session().await?;
        let result = {
            let mut ctx = StageContext::new(session.as_mut(), registry, &self.config.migration);
            let mut migrator = migrator_for(kind);
            run_stage(migrator.as_mut(), &mut ctx, &docs, &mut report).await
        };
        session.close().await;
        result?;

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "{} migration completed ({} inserted, {} failed)",
            kind.label(),
            report.inserted,
            report.failed()
        );
        Ok(report)
    }
}

/// Count the documents of every batch `source` holds for the configured kinds.
pub async fn inspect(
    source: &dyn DocumentSource,
    config: &SourceConfig,
) -> Result<Vec<BatchSummary>> {
    let mut batches = Vec::with_capacity(EntityKind::MIGRATION_ORDER.len());
    for kind in EntityKind::MIGRATION_ORDER {
        let batch = config.batch_for(kind);
        let documents = match source.load(batch).await? {
            BatchLoad::Missing => None,
            BatchLoad::Loaded(docs) => Some(docs.len()),
        };
        batches.push(BatchSummary {
            kind: kind.table().to_string(),
            batch: batch.to_string(),
            documents,
        });
    }
    Ok(batches)
}

/// Time one connection test against `target`.
pub async fn health_check(target: &dyn TargetStore) -> HealthCheckResult {
    let started = Instant::now();
    let result = target.test_connection().await;
    HealthCheckResult {
        target_connected: result.is_ok(),
        target_latency_ms: started.elapsed().as_millis() as u64,
        target_error: result.err().map(|e| e.to_string()),
    }
}

async fn truncate_all(session: &mut dyn TargetSession) -> Result<()> {
    session
        .execute(&Statement::SetForeignKeyChecks(false))
        .await?;
    for table in TRUNCATE_ORDER {
        session.execute(&Statement::Truncate { table }).await?;
    }
    session
        .execute(&Statement::SetForeignKeyChecks(true))
        .await?;
    session.commit().await
}
