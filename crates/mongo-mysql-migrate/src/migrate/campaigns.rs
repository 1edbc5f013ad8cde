//! Campaigns and their brand/category associations.

use async_trait::async_trait;

use super::columns::{col, flag, json, nullable, nullable_from, stamp, text, Fallback, Source};
use super::link::{CAMPAIGN_BRAND, CAMPAIGN_CATEGORY};
use super::slug::{source_slug, SlugAllocator};
use super::{build_row, Column, EntityMigrator, Outcome, StageContext};
use crate::document::{Document, EmptyJson};
use crate::error::DocResult;
use crate::kind::EntityKind;
use crate::target::Row;

const AFTER_SLUG: &[Column] = &[
    text("title"),
    flag("is_active", "isActive", true),
    col(
        "is_active_button",
        Source::Field("isActiveButton", Fallback::Text("join")),
    ),
    nullable("image"),
    text("content"),
    nullable("link"),
    nullable_from("start_date", "startDate"),
    nullable_from("end_date", "endDate"),
    col("item_type", Source::Field("itemType", Fallback::Text("general"))),
    nullable_from("item_id", "itemId"),
    json("actuals", "actuals", EmptyJson::List),
    nullable_from("coupon_code", "couponCode"),
    json("meta", "meta", EmptyJson::Map),
    flag("is_active_ads", "isActiveAds", true),
    col("form_id", Source::Ref("leadFormId", EntityKind::LeadForms)),
    stamp("created_at", "created_at"),
    stamp("updated_at", "updated_at"),
];

/// Campaign slugs are unique among the campaigns of one run.
#[derive(Debug, Default)]
pub struct CampaignsMigrator {
    slugs: SlugAllocator,
}

impl CampaignsMigrator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityMigrator for CampaignsMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::Campaigns
    }

    fn label_field(&self) -> &'static str {
        "title"
    }

    async fn migrate(&mut self, ctx: &mut StageContext<'_>, doc: &Document) -> DocResult<Outcome> {
        let oid = doc.oid()?;
        let slug = source_slug(doc).map(|base| self.slugs.candidate(&base));

        let row = Row::new("campaigns").set("slug", slug.clone());
        let row = build_row(ctx, row, AFTER_SLUG, doc);
        let key = ctx.insert_document(EntityKind::Campaigns, oid, row).await?;
        if let Some(slug) = slug {
            self.slugs.reserve(slug);
        }

        ctx.link(&CAMPAIGN_BRAND, key, doc).await?;
        ctx.link(&CAMPAIGN_CATEGORY, key, doc).await?;
        Ok(Outcome::Inserted(key))
    }
}
