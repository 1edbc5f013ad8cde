//! Hierarchical categories.
//!
//! Parents may appear after their children in the batch, so rows are inserted
//! with `parent_id` NULL first. Once every row exists the kind is committed
//! and closed, then a second pass fills in `parent_id`.

use async_trait::async_trait;
use tracing::{info, warn};

use super::columns::{col, flag, json, stamp, text, Source};
use super::{build_row, Column, EntityMigrator, Outcome, StageContext};
use crate::document::{Document, EmptyJson};
use crate::error::{DocResult, Result};
use crate::kind::EntityKind;
use crate::report::{DocFailure, StageReport};
use crate::target::{Row, SqlValue, Statement};

const PARENT_FIELD: &str = "parentId";

const COLUMNS: &[Column] = &[
    text("name"),
    text("slug"),
    col("parent_id", Source::Null),
    flag("is_active", "isActive", true),
    text("content"),
    text("description"),
    json("meta", "meta", EmptyJson::Map),
    stamp("created_at", "created_at"),
    stamp("updated_at", "updated_at"),
];

pub struct CategoriesMigrator;

#[async_trait]
impl EntityMigrator for CategoriesMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::Categories
    }

    fn label_field(&self) -> &'static str {
        "name"
    }

    async fn migrate(&mut self, ctx: &mut StageContext<'_>, doc: &Document) -> DocResult<Outcome> {
        let oid = doc.oid()?;
        let row = build_row(ctx, Row::new("categories"), COLUMNS, doc);
        let key = ctx.insert_document(EntityKind::Categories, oid, row).await?;
        Ok(Outcome::Inserted(key))
    }

    async fn finish(
        &mut self,
        ctx: &mut StageContext<'_>,
        docs: &[Document],
        report: &mut StageReport,
    ) -> Result<()> {
        ctx.commit(EntityKind::Categories).await?;
        ctx.registry.close(EntityKind::Categories);

        let mut linked = 0;
        for doc in docs {
            let Some(parent) = doc.reference(PARENT_FIELD) else {
                continue;
            };
            let Ok(oid) = doc.oid() else {
                continue;
            };
            // Only rows that made it through the first pass.
            let Some(key) = ctx.registry.resolve(EntityKind::Categories, &oid) else {
                continue;
            };
            let Some(parent_key) = ctx.registry.resolve(EntityKind::Categories, &parent) else {
                warn!("Parent category {} not found for {}", parent, doc.label("name"));
                continue;
            };

            let stmt = Statement::update(
                "categories",
                vec![("parent_id", SqlValue::from(parent_key))],
                "id",
                key,
            );
            match ctx.session.execute(&stmt).await {
                Ok(_) => linked += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let label = doc.label("name");
                    warn!("Error updating parent for category {}: {}", label, e);
                    report.failures.push(DocFailure {
                        label,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.updated += linked;
        info!("Linked {} categories to their parent", linked);
        Ok(())
    }
}
