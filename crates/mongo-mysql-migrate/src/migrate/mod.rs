//! Per-entity migrators.
//!
//! Each [`EntityKind`] has one [`EntityMigrator`]. A stage hands the
//! migrator every document of the kind's batch, one at a time, through
//! [`run_stage`]:
//!
//! 1. `prepare` runs once (e.g. reading rows that already exist),
//! 2. `migrate` runs per document; a [`DocError`] is logged and the loop
//!    moves on, unless its cause is fatal,
//! 3. `finish` runs once (e.g. a second pass over the documents),
//! 4. the session is committed.

mod brands;
mod campaigns;
mod categories;
mod columns;
mod content;
mod leads;
pub mod link;
mod listings;
mod products;
pub mod settings;
pub mod slug;
mod users;

pub use columns::{build_row, Column, Fallback, MappedMigrator, Source};
pub use link::{Association, LinkStats};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::MigrationConfig;
use crate::document::Document;
use crate::error::{DocError, DocResult, MigrateError, Result};
use crate::kind::EntityKind;
use crate::registry::{IdentifierRegistry, RegistryError};
use crate::report::{DocFailure, StageReport};
use crate::target::{Row, Statement, TargetSession};

/// What migrating one document did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new row was inserted under this key.
    Inserted(u64),
    /// The document was mapped onto an existing row.
    Merged(u64),
    /// Existing rows were updated in place.
    Updated(usize),
    /// Nothing was written.
    Skipped,
}

/// Everything a migrator may touch during one stage.
pub struct StageContext<'a> {
    pub session: &'a mut dyn TargetSession,
    pub registry: &'a mut IdentifierRegistry,
    pub config: &'a MigrationConfig,
    links: LinkStats,
}

impl<'a> StageContext<'a> {
    pub fn new(
        session: &'a mut dyn TargetSession,
        registry: &'a mut IdentifierRegistry,
        config: &'a MigrationConfig,
    ) -> Self {
        Self {
            session,
            registry,
            config,
            links: LinkStats::default(),
        }
    }

    /// Resolve a single reference field through `kind`'s registry.
    ///
    /// Absent or falsy fields and unknown ids both resolve to `None`.
    pub fn resolve(&self, kind: EntityKind, doc: &Document, field: &str) -> Option<u64> {
        let oid = doc.reference(field)?;
        let key = self.registry.resolve(kind, &oid);
        if key.is_none() {
            warn!(reference = %kind, oid = %oid, "{} {} not found for {}", kind.label(), oid, field);
        }
        key
    }

    /// Fail early when `oid` already has a key, before anything is written.
    pub fn ensure_unmapped(&self, kind: EntityKind, oid: &str) -> DocResult<()> {
        match self.registry.resolve(kind, oid) {
            Some(existing) => Err(RegistryError::Duplicate {
                kind,
                oid: oid.to_string(),
                existing,
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Insert a row and return its generated key.
    pub async fn insert(&mut self, row: Row) -> DocResult<u64> {
        let table = row.table;
        let result = self.session.execute(&Statement::insert(row)).await?;
        result.last_insert_id.ok_or_else(|| {
            DocError::Target(MigrateError::statement(table, "no generated key returned"))
        })
    }

    /// Insert a document's row and record its key.
    pub async fn insert_document(
        &mut self,
        kind: EntityKind,
        oid: String,
        row: Row,
    ) -> DocResult<u64> {
        self.ensure_unmapped(kind, &oid)?;
        let key = self.insert(row).await?;
        self.registry.register(kind, oid, key)?;
        Ok(key)
    }

    /// Create the association rows listed in `doc` for `parent_key`.
    pub async fn link(
        &mut self,
        assoc: &Association,
        parent_key: u64,
        doc: &Document,
    ) -> Result<LinkStats> {
        let related = doc.references(assoc.field);
        let stats =
            link::link_related(&mut *self.session, &*self.registry, assoc, parent_key, &related)
                .await?;
        self.links.add(stats);
        Ok(stats)
    }

    /// Commit the stage's pending writes.
    pub async fn commit(&mut self, kind: EntityKind) -> Result<()> {
        self.session
            .commit()
            .await
            .map_err(|e| MigrateError::stage(kind.table(), e))
    }
}

/// Migration logic for one entity kind.
#[async_trait]
pub trait EntityMigrator: Send {
    fn kind(&self) -> EntityKind;

    /// Field that identifies a document in failure log lines.
    fn label_field(&self) -> &'static str;

    /// Runs once before the first document.
    async fn prepare(&mut self, _ctx: &mut StageContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Migrate one document.
    async fn migrate(&mut self, ctx: &mut StageContext<'_>, doc: &Document) -> DocResult<Outcome>;

    /// Runs once after the last document, before the final commit.
    async fn finish(
        &mut self,
        _ctx: &mut StageContext<'_>,
        _docs: &[Document],
        _report: &mut StageReport,
    ) -> Result<()> {
        Ok(())
    }
}

/// Drive one migrator over a batch and commit.
///
/// Per-document failures are recorded in `report`; only fatal errors are
/// returned.
pub async fn run_stage(
    migrator: &mut dyn EntityMigrator,
    ctx: &mut StageContext<'_>,
    docs: &[Document],
    report: &mut StageReport,
) -> Result<()> {
    let kind = migrator.kind();
    report.documents = docs.len();

    migrator.prepare(ctx).await?;

    for doc in docs {
        match migrator.migrate(ctx, doc).await {
            Ok(Outcome::Inserted(key)) => {
                debug!(stage = %kind, key, "inserted");
                report.inserted += 1;
            }
            Ok(Outcome::Merged(_)) => report.merged += 1,
            Ok(Outcome::Updated(n)) => report.updated += n,
            Ok(Outcome::Skipped) => report.skipped += 1,
            Err(e) => {
                let e = e.into_fatal()?;
                let label = doc.label(migrator.label_field());
                warn!(stage = %kind, "Error migrating {} {}: {}", kind.label(), label, e);
                report.failures.push(DocFailure {
                    label,
                    error: e.to_string(),
                });
            }
        }
    }

    migrator.finish(ctx, docs, report).await?;
    ctx.commit(kind).await?;

    report.links_inserted = ctx.links.inserted;
    report.links_dropped = ctx.links.dropped;
    Ok(())
}

/// The migrator for `kind`.
pub fn migrator_for(kind: EntityKind) -> Box<dyn EntityMigrator> {
    match kind {
        EntityKind::Settings => Box::new(settings::SettingsMigrator::new()),
        EntityKind::Users => Box::new(users::UsersMigrator),
        EntityKind::Categories => Box::new(categories::CategoriesMigrator),
        EntityKind::Brands => Box::new(brands::BrandsMigrator::new()),
        EntityKind::Attributes => Box::new(content::attributes()),
        EntityKind::LeadForms => Box::new(leads::lead_forms()),
        EntityKind::Banks => Box::new(listings::banks()),
        EntityKind::Campaigns => Box::new(campaigns::CampaignsMigrator::new()),
        EntityKind::Posts => Box::new(content::posts()),
        EntityKind::Pages => Box::new(content::pages()),
        EntityKind::Sliders => Box::new(content::sliders()),
        EntityKind::Ads => Box::new(content::ads()),
        EntityKind::Products => Box::new(products::ProductsMigrator::new()),
        EntityKind::ProductPriceHistories => Box::new(products::PriceHistoryMigrator),
        EntityKind::Cars => Box::new(listings::cars()),
        EntityKind::RealEstates => Box::new(listings::real_estates()),
        EntityKind::Leads => Box::new(leads::leads()),
    }
}
