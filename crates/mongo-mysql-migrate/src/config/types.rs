//! Configuration type definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::kind::EntityKind;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backup to read documents from.
    pub source: SourceConfig,

    /// Destination database (MySQL).
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Source backup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding the `<Batch>.bson` files of a mongodump.
    pub backup_path: PathBuf,

    /// Batch file name overrides keyed by kind (e.g. `users: Member`).
    #[serde(default)]
    pub batches: BTreeMap<String, String>,
}

impl SourceConfig {
    /// Batch name to read for `kind`.
    pub fn batch_for(&self, kind: EntityKind) -> &str {
        self.batches
            .get(kind.table())
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_batch())
    }
}

/// Destination database (MySQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Truncate destination tables before migrating (default: true).
    #[serde(default = "default_true")]
    pub clear_target: bool,

    /// Password given to users whose document has none.
    #[serde(default = "default_password")]
    pub default_password: String,

    /// Country stored on real estate rows.
    #[serde(default = "default_country")]
    pub default_country: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            clear_target: true,
            default_password: default_password(),
            default_country: default_country(),
        }
    }
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_true() -> bool {
    true
}

fn default_password() -> String {
    "password123".to_string()
}

fn default_country() -> String {
    "Turkiye".to_string()
}
