//! Site settings.
//!
//! The source holds one settings document. Its fields are written into the
//! pre-seeded `settings(key, value)` rows; keys missing from the destination
//! are skipped.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{EntityMigrator, Outcome, StageContext};
use crate::document::{now, Document, ID_FIELD};
use crate::error::DocResult;
use crate::kind::EntityKind;
use crate::target::{SqlValue, Statement};

/// Destination key, source field, default value.
pub const SETTING_KEYS: &[(&str, &str, &str)] = &[
    ("site_logo", "logo", "/logo.png"),
    ("meta_title", "metaTitle", "KampanyaRadar"),
    (
        "meta_description",
        "metaDescription",
        "Türkiye'nin en güncel kampanya platformu",
    ),
    ("meta_keywords", "metaKeywords", "kampanya, indirim, fırsat"),
    ("meta_separator", "metaSeperate", "|"),
    ("head_after_code", "headAfterCode", ""),
    ("body_after_code", "bodyAfterCode", ""),
];

#[derive(Debug, Default)]
pub struct SettingsMigrator {
    applied: bool,
}

impl SettingsMigrator {
    pub fn new() -> Self {
        Self { applied: false }
    }
}

#[async_trait]
impl EntityMigrator for SettingsMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::Settings
    }

    fn label_field(&self) -> &'static str {
        ID_FIELD
    }

    async fn migrate(&mut self, ctx: &mut StageContext<'_>, doc: &Document) -> DocResult<Outcome> {
        if self.applied {
            info!("Ignoring additional settings document {}", doc.label(ID_FIELD));
            return Ok(Outcome::Skipped);
        }
        self.applied = true;

        let mut updated = 0;
        for (key, field, default) in SETTING_KEYS {
            let stmt = Statement::update(
                "settings",
                vec![
                    ("value", doc.field_or(field, *default)),
                    ("updated_at", SqlValue::DateTime(now())),
                ],
                "key",
                *key,
            );

            match ctx.session.execute(&stmt).await {
                Ok(result) if result.rows_affected == 0 => {
                    info!("Setting {} not found in database, skipping", key);
                }
                Ok(result) => updated += result.rows_affected as usize,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => warn!("Error migrating setting {}: {}", key, e),
            }
        }

        Ok(Outcome::Updated(updated))
    }
}
