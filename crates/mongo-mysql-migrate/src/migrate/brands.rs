//! Brands, de-duplicated by name against rows already in the destination.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info};

use super::columns::{flag, nullable, stamp, text};
use super::slug::{source_slug, SlugAllocator};
use super::{build_row, Column, EntityMigrator, Outcome, StageContext};
use crate::document::{Document, Value};
use crate::error::{DocResult, Result};
use crate::kind::EntityKind;
use crate::target::{Row, SqlValue, Statement};

const AFTER_SLUG: &[Column] = &[
    nullable("logo"),
    flag("is_active", "isActive", true),
    text("content"),
    stamp("created_at", "created_at"),
    stamp("updated_at", "updated_at"),
];

#[derive(Debug, Default)]
pub struct BrandsMigrator {
    names: HashSet<String>,
    slugs: SlugAllocator,
}

impl BrandsMigrator {
    pub fn new() -> Self {
        Self::default()
    }

    async fn existing_key(ctx: &mut StageContext<'_>, name: &str) -> DocResult<Option<u64>> {
        let rows = ctx
            .session
            .query(&Statement::select_where("brands", vec!["id"], "name", name))
            .await?;
        Ok(rows
            .first()
            .and_then(|r| r.first())
            .and_then(SqlValue::as_key))
    }
}

/// Brand name: `''` when absent, `None` when null.
fn brand_name(doc: &Document) -> Option<String> {
    match doc.get("name") {
        None => Some(String::new()),
        Some(Value::Null) => None,
        Some(v) => Some(v.to_text()),
    }
}

#[async_trait]
impl EntityMigrator for BrandsMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::Brands
    }

    fn label_field(&self) -> &'static str {
        "name"
    }

    async fn prepare(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        let rows = ctx
            .session
            .query(&Statement::select_all("brands", vec!["name", "slug"]))
            .await?;

        let mut slugs = Vec::with_capacity(rows.len());
        for row in rows {
            let mut values = row.into_iter();
            if let Some(SqlValue::Text(name)) = values.next() {
                self.names.insert(name);
            }
            if let Some(SqlValue::Text(slug)) = values.next() {
                slugs.push(slug);
            }
        }
        debug!(
            names = self.names.len(),
            slugs = slugs.len(),
            "loaded existing brands"
        );
        self.slugs = SlugAllocator::with_taken(slugs);
        Ok(())
    }

    async fn migrate(&mut self, ctx: &mut StageContext<'_>, doc: &Document) -> DocResult<Outcome> {
        let oid = doc.oid()?;
        let name = brand_name(doc);

        if let Some(existing) = name.as_deref().filter(|n| self.names.contains(*n)) {
            info!("Skipping duplicate brand name: {}", existing);
            ctx.ensure_unmapped(EntityKind::Brands, &oid)?;
            return match Self::existing_key(ctx, existing).await? {
                Some(key) => {
                    ctx.registry.register(EntityKind::Brands, oid, key)?;
                    Ok(Outcome::Merged(key))
                }
                None => Ok(Outcome::Skipped),
            };
        }

        let slug = source_slug(doc).map(|base| self.slugs.candidate(&base));
        let row = Row::new("brands")
            .set("name", name.clone())
            .set("slug", slug.clone());
        let row = build_row(ctx, row, AFTER_SLUG, doc);
        let key = ctx.insert_document(EntityKind::Brands, oid, row).await?;

        if let Some(name) = name {
            self.names.insert(name);
        }
        if let Some(slug) = slug {
            self.slugs.reserve(slug);
        }
        Ok(Outcome::Inserted(key))
    }
}
