//! Run and stage reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::kind::EntityKind;
use crate::registry::IdentifierRegistry;

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Documents were read and processed.
    Completed,
    /// The batch does not exist in the backup.
    SourceMissing,
}

/// One document that could not be migrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocFailure {
    /// Identifying field value, `unknown` when absent.
    pub label: String,
    pub error: String,
}

/// Outcome of one migration stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    /// Destination table of the stage.
    pub stage: String,

    /// Batch the documents were read from.
    pub batch: String,

    pub status: StageStatus,

    /// Documents read from the batch.
    pub documents: usize,

    /// Rows inserted.
    pub inserted: usize,

    /// Documents mapped onto an existing row instead of inserted.
    pub merged: usize,

    /// Rows updated in place.
    pub updated: usize,

    /// Documents that wrote nothing without being an error.
    pub skipped: usize,

    /// Association rows inserted.
    pub links_inserted: usize,

    /// Related ids that did not resolve.
    pub links_dropped: usize,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// Per-document failures, in source order.
    pub failures: Vec<DocFailure>,
}

impl StageReport {
    pub fn new(kind: EntityKind, batch: impl Into<String>) -> Self {
        Self {
            stage: kind.table().to_string(),
            batch: batch.into(),
            status: StageStatus::Completed,
            documents: 0,
            inserted: 0,
            merged: 0,
            updated: 0,
            skipped: 0,
            links_inserted: 0,
            links_dropped: 0,
            duration_ms: 0,
            failures: Vec::new(),
        }
    }

    /// Report for a batch that does not exist.
    pub fn missing(kind: EntityKind, batch: impl Into<String>) -> Self {
        Self {
            status: StageStatus::SourceMissing,
            ..Self::new(kind, batch)
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Registered document count for one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCount {
    pub kind: String,
    pub count: usize,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: String,

    /// Fingerprint of the configuration the run used.
    pub config_hash: String,

    /// Whether the destination was cleared first.
    pub cleared: bool,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Stages in execution order.
    pub stages: Vec<StageReport>,

    /// Registered documents per kind, summary order, non-zero only.
    pub totals: Vec<KindCount>,
}

impl MigrationReport {
    /// Per-kind totals taken from the registry.
    pub fn totals_from(registry: &IdentifierRegistry) -> Vec<KindCount> {
        EntityKind::SUMMARY_ORDER
            .iter()
            .map(|&kind| KindCount {
                kind: kind.table().to_string(),
                count: registry.count(kind),
            })
            .filter(|c| c.count > 0)
            .collect()
    }

    /// Total per-document failures across stages.
    pub fn failures(&self) -> usize {
        self.stages.iter().map(StageReport::failed).sum()
    }

    /// The closing summary block.
    pub fn summary_lines(&self) -> Vec<String> {
        std::iter::once("Total records migrated:".to_string())
            .chain(
                self.totals
                    .iter()
                    .map(|c| format!("  {}: {}", c.kind, c.count)),
            )
            .collect()
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
