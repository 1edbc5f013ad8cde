//! Many-to-many association rows.

use tracing::{debug, warn};

use crate::error::Result;
use crate::kind::EntityKind;
use crate::registry::IdentifierRegistry;
use crate::target::{Row, Statement, TargetSession};

/// An association table between a parent kind and a related kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    pub table: &'static str,
    /// Parent document field listing related original ids.
    pub field: &'static str,
    pub related: EntityKind,
    /// Columns in table order.
    pub columns: (&'static str, &'static str),
    /// Whether the parent key goes in the first column.
    pub parent_first: bool,
}

impl Association {
    fn row(&self, parent_key: u64, related_key: u64) -> Row {
        let (first, second) = if self.parent_first {
            (parent_key, related_key)
        } else {
            (related_key, parent_key)
        };
        Row::new(self.table)
            .set(self.columns.0, first)
            .set(self.columns.1, second)
    }
}

pub const CAMPAIGN_BRAND: Association = Association {
    table: "campaign_brand",
    field: "brandIds",
    related: EntityKind::Brands,
    columns: ("campaign_id", "brand_id"),
    parent_first: true,
};

pub const CAMPAIGN_CATEGORY: Association = Association {
    table: "campaign_category",
    field: "categoryIds",
    related: EntityKind::Categories,
    columns: ("campaign_id", "category_id"),
    parent_first: true,
};

pub const CATEGORY_POST: Association = Association {
    table: "category_post",
    field: "categoryIds",
    related: EntityKind::Categories,
    columns: ("category_id", "post_id"),
    parent_first: false,
};

/// Association rows written and ids dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub inserted: usize,
    pub dropped: usize,
}

impl LinkStats {
    pub fn add(&mut self, other: LinkStats) {
        self.inserted += other.inserted;
        self.dropped += other.dropped;
    }
}

/// Insert one association row per related id that resolves.
///
/// A row the store rejects (e.g. a repeated id hitting the primary key) is
/// counted as dropped. Only a fatal store error stops the linking.
pub async fn link_related(
    session: &mut dyn TargetSession,
    registry: &IdentifierRegistry,
    assoc: &Association,
    parent_key: u64,
    related: &[String],
) -> Result<LinkStats> {
    let mut stats = LinkStats::default();

    for oid in related {
        let Some(related_key) = registry.resolve(assoc.related, oid) else {
            debug!("{}: dropping unresolved {} {}", assoc.table, assoc.related, oid);
            stats.dropped += 1;
            continue;
        };
        match session
            .execute(&Statement::insert(assoc.row(parent_key, related_key)))
            .await
        {
            Ok(_) => stats.inserted += 1,
            Err(e) if !e.is_fatal() => {
                warn!("{}: dropping {} {}: {}", assoc.table, assoc.related, oid, e);
                stats.dropped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{MemoryTarget, TargetStore};

    #[tokio::test]
    async fn test_two_of_three_resolve() {
        let target = MemoryTarget::with_destination_schema();
        let mut session = target.open_session().await.unwrap();
        let mut registry = IdentifierRegistry::new();
        registry.register(EntityKind::Brands, "b1", 10).unwrap();
        registry.register(EntityKind::Brands, "b3", 30).unwrap();

        let related = vec!["b1".to_string(), "b2".to_string(), "b3".to_string()];
        let stats = link_related(session.as_mut(), &registry, &CAMPAIGN_BRAND, 7, &related)
            .await
            .unwrap();

        assert_eq!(stats, LinkStats { inserted: 2, dropped: 1 });
        let rows = target.rows("campaign_brand");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key("campaign_id"), Some(7));
        assert_eq!(rows[0].key("brand_id"), Some(10));
        assert_eq!(rows[1].key("brand_id"), Some(30));
    }

    #[tokio::test]
    async fn test_rejected_row_counts_as_dropped() {
        let target =
            MemoryTarget::with_destination_schema().with_unique("campaign_brand", "brand_id");
        let mut session = target.open_session().await.unwrap();
        let mut registry = IdentifierRegistry::new();
        registry.register(EntityKind::Brands, "b1", 10).unwrap();

        let related = vec!["b1".to_string(), "b1".to_string()];
        let stats = link_related(session.as_mut(), &registry, &CAMPAIGN_BRAND, 7, &related)
            .await
            .unwrap();

        assert_eq!(stats, LinkStats { inserted: 1, dropped: 1 });
        assert_eq!(target.row_count("campaign_brand"), 1);
    }

    #[tokio::test]
    async fn test_lost_session_aborts_linking() {
        let target = MemoryTarget::with_destination_schema();
        let mut session = target.open_session().await.unwrap();
        session.close().await;
        let mut registry = IdentifierRegistry::new();
        registry.register(EntityKind::Brands, "b1", 10).unwrap();

        let err = link_related(
            session.as_mut(),
            &registry,
            &CAMPAIGN_BRAND,
            7,
            &["b1".to_string()],
        )
        .await
        .unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_parent_in_second_column() {
        let target = MemoryTarget::with_destination_schema();
        let mut session = target.open_session().await.unwrap();
        let mut registry = IdentifierRegistry::new();
        registry.register(EntityKind::Categories, "c1", 4).unwrap();

        link_related(
            session.as_mut(),
            &registry,
            &CATEGORY_POST,
            9,
            &["c1".to_string()],
        )
        .await
        .unwrap();

        let rows = target.rows("category_post");
        assert_eq!(rows[0].key("category_id"), Some(4));
        assert_eq!(rows[0].key("post_id"), Some(9));
    }
}
