//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};
use crate::kind::EntityKind;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.backup_path.as_os_str().is_empty() {
        return Err(MigrateError::Config("source.backup_path is required".into()));
    }
    for (kind, batch) in &config.source.batches {
        if EntityKind::from_table(kind).is_none() {
            return Err(MigrateError::Config(format!(
                "source.batches: unknown kind '{}'",
                kind
            )));
        }
        if batch.is_empty() {
            return Err(MigrateError::Config(format!(
                "source.batches.{} must not be empty",
                kind
            )));
        }
    }

    // Target validation
    if config.target.host.is_empty() {
        return Err(MigrateError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(MigrateError::Config("target.user is required".into()));
    }

    if config.migration.default_password.is_empty() {
        return Err(MigrateError::Config(
            "migration.default_password must not be empty".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationConfig, SourceConfig, TargetConfig};

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                backup_path: "/backups/dump".into(),
                batches: Default::default(),
            },
            target: TargetConfig {
                host: "localhost".to_string(),
                port: 3306,
                database: "kampanya".to_string(),
                user: "root".to_string(),
                password: "password".to_string(),
            },
            migration: MigrationConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_backup_path() {
        let mut config = valid_config();
        config.source.backup_path = "".into();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_target_host() {
        let mut config = valid_config();
        config.target.host = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_batch_override() {
        let mut config = valid_config();
        config
            .source
            .batches
            .insert("widgets".to_string(), "Widget".to_string());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("unknown kind 'widgets'"));
    }

    #[test]
    fn test_known_batch_override() {
        let mut config = valid_config();
        config
            .source
            .batches
            .insert("users".to_string(), "Member".to_string());
        assert!(validate(&config).is_ok());
        assert_eq!(config.source.batch_for(EntityKind::Users), "Member");
        assert_eq!(config.source.batch_for(EntityKind::Brands), "Brand");
    }

    #[test]
    fn test_target_config_debug_redacts_password() {
        let mut config = valid_config();
        config.target.password = "super_secret_password_456".to_string();
        let debug_output = format!("{:?}", config.target);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password_456"));
    }
}
