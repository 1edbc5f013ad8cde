//! Declarative column mappings.
//!
//! Most kinds are a flat copy of document fields into columns with a default
//! per column. Those are described as a `&'static [Column]` and migrated by
//! [`MappedMigrator`].

use async_trait::async_trait;

use super::link::Association;
use super::{EntityMigrator, Outcome, StageContext};
use crate::document::{now, Document, EmptyJson};
use crate::error::DocResult;
use crate::kind::EntityKind;
use crate::target::{Row, SqlValue};

/// Value used when a field is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    Null,
    Text(&'static str),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Current local date/time.
    Now,
    /// Current local date.
    Today,
    /// `migration.default_country`.
    Country,
}

/// Where a column's value comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source {
    /// Copy a document field.
    Field(&'static str, Fallback),
    /// Serialize a nested field as JSON text.
    Json(&'static str, EmptyJson),
    /// Resolve a reference field to a relational key.
    Ref(&'static str, EntityKind),
    /// Always the current date/time.
    Now,
    /// Always NULL; filled in later.
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub source: Source,
}

/// Shorthand for a [`Column`].
pub const fn col(name: &'static str, source: Source) -> Column {
    Column { name, source }
}

/// Text column copied from a field of the same name, `''` when absent.
pub const fn text(name: &'static str) -> Column {
    col(name, Source::Field(name, Fallback::Text("")))
}

/// Nullable column copied from a field of the same name.
pub const fn nullable(name: &'static str) -> Column {
    col(name, Source::Field(name, Fallback::Null))
}

/// Nullable column copied from a differently named field.
pub const fn nullable_from(name: &'static str, field: &'static str) -> Column {
    col(name, Source::Field(field, Fallback::Null))
}

/// Boolean column copied from `field`.
pub const fn flag(name: &'static str, field: &'static str, default: bool) -> Column {
    col(name, Source::Field(field, Fallback::Bool(default)))
}

/// JSON column copied from `field`.
pub const fn json(name: &'static str, field: &'static str, empty: EmptyJson) -> Column {
    col(name, Source::Json(field, empty))
}

/// Timestamp column read from `field`, now when absent.
pub const fn stamp(name: &'static str, field: &'static str) -> Column {
    col(name, Source::Field(field, Fallback::Now))
}

/// Timestamp column always set to now.
pub const fn now_stamp(name: &'static str) -> Column {
    col(name, Source::Now)
}

impl Fallback {
    fn value(self, ctx: &StageContext<'_>) -> SqlValue {
        match self {
            Fallback::Null => SqlValue::Null,
            Fallback::Text(s) => SqlValue::from(s),
            Fallback::Bool(b) => SqlValue::Bool(b),
            Fallback::Int(i) => SqlValue::I64(i),
            Fallback::Float(f) => SqlValue::F64(f),
            Fallback::Now => SqlValue::DateTime(now()),
            Fallback::Today => SqlValue::Date(now().date()),
            Fallback::Country => SqlValue::from(ctx.config.default_country.as_str()),
        }
    }
}

/// Append the mapped `columns` of `doc` to `row`.
pub fn build_row(ctx: &StageContext<'_>, row: Row, columns: &[Column], doc: &Document) -> Row {
    columns.iter().fold(row, |row, column| {
        let value = match column.source {
            Source::Field(field, fallback) => match doc.get(field) {
                Some(v) => v.to_sql(),
                None => fallback.value(ctx),
            },
            Source::Json(field, empty) => doc.json_or(field, empty),
            Source::Ref(field, kind) => ctx.resolve(kind, doc, field).into(),
            Source::Now => SqlValue::DateTime(now()),
            Source::Null => SqlValue::Null,
        };
        row.set(column.name, value)
    })
}

/// Migrator for kinds that need nothing beyond a column mapping and
/// optional association tables.
#[derive(Debug, Clone)]
pub struct MappedMigrator {
    pub kind: EntityKind,
    pub label_field: &'static str,
    pub columns: &'static [Column],
    pub links: &'static [Association],
}

#[async_trait]
impl EntityMigrator for MappedMigrator {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn label_field(&self) -> &'static str {
        self.label_field
    }

    async fn migrate(&mut self, ctx: &mut StageContext<'_>, doc: &Document) -> DocResult<Outcome> {
        let oid = doc.oid()?;
        let row = build_row(ctx, Row::new(self.kind.table()), self.columns, doc);
        let key = ctx.insert_document(self.kind, oid, row).await?;

        for assoc in self.links {
            ctx.link(assoc, key, doc).await?;
        }
        Ok(Outcome::Inserted(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MigrationConfig;
    use crate::document::{Value, ID_FIELD};
    use crate::registry::IdentifierRegistry;
    use crate::target::{MemoryTarget, TargetStore};

    const COLUMNS: &[Column] = &[
        text("name"),
        nullable("image"),
        flag("is_active", "isActive", true),
        json("meta", "meta", EmptyJson::Map),
        col("brand_id", Source::Ref("brandId", EntityKind::Brands)),
        col("country", Source::Field("country", Fallback::Country)),
    ];

    #[tokio::test]
    async fn test_build_row_defaults_and_references() {
        let target = MemoryTarget::new();
        let mut session = target.open_session().await.unwrap();
        let mut registry = IdentifierRegistry::new();
        registry.register(EntityKind::Brands, "b1", 3).unwrap();
        let config = MigrationConfig::default();
        let ctx = StageContext::new(session.as_mut(), &mut registry, &config);

        let doc = Document::new()
            .with(ID_FIELD, Value::oid("x"))
            .with("image", Value::Null)
            .with("brandId", Value::oid("b1"));
        let row = build_row(&ctx, Row::new("things"), COLUMNS, &doc);

        assert_eq!(row.get("name"), Some(&SqlValue::from("")));
        assert_eq!(row.get("image"), Some(&SqlValue::Null));
        assert_eq!(row.get("is_active"), Some(&SqlValue::Bool(true)));
        assert_eq!(row.get("meta"), Some(&SqlValue::from("{}")));
        assert_eq!(row.get("brand_id"), Some(&SqlValue::I64(3)));
        assert_eq!(row.get("country"), Some(&SqlValue::from("Turkiye")));
        assert_eq!(
            row.columns().collect::<Vec<_>>(),
            vec!["name", "image", "is_active", "meta", "brand_id", "country"]
        );
    }

    #[tokio::test]
    async fn test_unresolved_reference_is_null() {
        let target = MemoryTarget::new();
        let mut session = target.open_session().await.unwrap();
        let mut registry = IdentifierRegistry::new();
        let config = MigrationConfig::default();
        let ctx = StageContext::new(session.as_mut(), &mut registry, &config);

        let doc = Document::new().with("brandId", Value::oid("gone"));
        let row = build_row(&ctx, Row::new("things"), COLUMNS, &doc);
        assert_eq!(row.get("brand_id"), Some(&SqlValue::Null));
    }
}
