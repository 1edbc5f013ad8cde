//! Products and their price histories.
//!
//! A product document carries a list of store offers. The row keeps the raw
//! offers as JSON and derives `price`, `image` and `images` from them.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime};
use tracing::{debug, info};

use super::columns::{col, json, now_stamp, nullable, text, Fallback, Source};
use super::{build_row, Column, EntityMigrator, Outcome, StageContext};
use crate::document::{now, to_json_text, Document, EmptyJson, Value};
use crate::error::{DocError, DocResult, Result};
use crate::kind::EntityKind;
use crate::target::{Row, SqlValue, Statement};

const PRODUCT_HEAD: &[Column] = &[text("gtin"), nullable("description")];

const PRODUCT_JSON: &[Column] = &[
    json("attributes", "attributes", EmptyJson::List),
    json("stores", "stores", EmptyJson::List),
];

const PRICE_HISTORY: &[Column] = &[
    col("date", Source::Field("date", Fallback::Today)),
    col("store_price", Source::Field("storePrice", Fallback::Float(0.0))),
    col("store_brand", Source::Field("storeBrand", Fallback::Text(""))),
    now_stamp("created_at"),
    now_stamp("updated_at"),
];

/// Values derived from a product's store offers.
#[derive(Debug, Default, PartialEq)]
struct Offers {
    price: Option<f64>,
    images: Vec<String>,
}

impl Offers {
    fn from_doc(doc: &Document) -> DocResult<Self> {
        let mut offers = Offers::default();
        let Some(Value::List(stores)) = doc.get("stores") else {
            return Ok(offers);
        };

        for store in stores {
            let Value::Map(store) = store else {
                continue;
            };

            if let Some(price) = store.get("price").filter(|v| v.is_truthy()) {
                let price = price.as_f64().ok_or_else(|| {
                    DocError::invalid("stores.price", format!("not a number: {}", price.to_text()))
                })?;
                offers.price = Some(offers.price.map_or(price, |p| p.min(price)));
            }

            if let Some(link) = store.get("image_link").filter(|v| v.is_truthy()) {
                let link = link.to_text();
                if !offers.images.contains(&link) {
                    offers.images.push(link);
                }
            }
        }
        Ok(offers)
    }

    fn image(&self) -> SqlValue {
        self.images.first().cloned().into()
    }

    fn images_json(&self) -> SqlValue {
        if self.images.is_empty() {
            return SqlValue::Null;
        }
        let list = Value::List(self.images.iter().cloned().map(Value::String).collect());
        SqlValue::Text(to_json_text(Some(&list), EmptyJson::List))
    }
}

/// Epoch milliseconds as a local wall-clock time.
fn from_epoch_millis(millis: f64) -> Option<NaiveDateTime> {
    if !millis.is_finite() {
        return None;
    }
    let secs = (millis / 1000.0).floor();
    let nanos = ((millis - secs * 1000.0) * 1_000_000.0).round() as u32;
    let utc = DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))?;
    Some(utc.with_timezone(&Local).naive_local())
}

/// Product timestamps come as epoch milliseconds or as date/times.
fn product_timestamp(doc: &Document, field: &str) -> SqlValue {
    let value = match doc.get(field) {
        Some(Value::Int(ms)) => from_epoch_millis(*ms as f64),
        Some(Value::Float(ms)) => from_epoch_millis(*ms),
        Some(Value::DateTime(dt)) => Some(*dt),
        _ => None,
    };
    SqlValue::DateTime(value.unwrap_or_else(now))
}

/// Products; `brand` holds a brand name, not a reference.
#[derive(Debug, Default)]
pub struct ProductsMigrator {
    brands: HashMap<String, u64>,
}

impl ProductsMigrator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityMigrator for ProductsMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::Products
    }

    fn label_field(&self) -> &'static str {
        "gtin"
    }

    async fn prepare(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        let rows = ctx
            .session
            .query(&Statement::select_all("brands", vec!["id", "name"]))
            .await?;
        self.brands = rows
            .into_iter()
            .filter_map(|row| match row.as_slice() {
                [id, SqlValue::Text(name)] => Some((name.clone(), id.as_key()?)),
                _ => None,
            })
            .collect();
        debug!(brands = self.brands.len(), "loaded brand names");
        Ok(())
    }

    async fn migrate(&mut self, ctx: &mut StageContext<'_>, doc: &Document) -> DocResult<Outcome> {
        let oid = doc.oid()?;
        let offers = Offers::from_doc(doc)?;
        let brand_id = doc
            .get("brand")
            .filter(|v| v.is_truthy())
            .and_then(|name| self.brands.get(&name.to_text()).copied());

        let row = Row::new("products").set("title", doc.field("title"));
        let row = build_row(ctx, row, PRODUCT_HEAD, doc).set("brand_id", brand_id);
        let row = build_row(ctx, row, PRODUCT_JSON, doc)
            .set("images", offers.images_json())
            .set("image", offers.image())
            .set("price", offers.price)
            .set("created_at", product_timestamp(doc, "createdAt"))
            .set("updated_at", product_timestamp(doc, "updatedAt"));

        let key = ctx.insert_document(EntityKind::Products, oid, row).await?;
        Ok(Outcome::Inserted(key))
    }
}

/// Price histories, kept only for products that were migrated.
pub struct PriceHistoryMigrator;

#[async_trait]
impl EntityMigrator for PriceHistoryMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::ProductPriceHistories
    }

    fn label_field(&self) -> &'static str {
        "gtin"
    }

    async fn migrate(&mut self, ctx: &mut StageContext<'_>, doc: &Document) -> DocResult<Outcome> {
        let oid = doc.oid()?;
        let gtin = doc.field_or("gtin", "");

        let found = ctx
            .session
            .query(&Statement::select_where(
                "products",
                vec!["id"],
                "gtin",
                gtin.clone(),
            ))
            .await?;
        if found.is_empty() {
            info!("Product not found for GTIN: {}", doc.label("gtin"));
            return Ok(Outcome::Skipped);
        }

        let row = Row::new("product_price_histories").set("gtin", gtin);
        let row = build_row(ctx, row, PRICE_HISTORY, doc);
        let key = ctx
            .insert_document(EntityKind::ProductPriceHistories, oid, row)
            .await?;
        Ok(Outcome::Inserted(key))
    }
}
