//! End-to-end runs against the in-memory destination.

use std::collections::BTreeMap;
use std::sync::Arc;

use bson::{doc, oid::ObjectId};
use mongo_mysql_migrate::target::Row;
use mongo_mysql_migrate::{
    Config, Document, EntityKind, MemorySource, MemoryTarget, MigrateError, MigrationConfig,
    Orchestrator, SourceConfig, SqlValue, StageStatus, TargetConfig, Value,
};

fn config() -> Config {
    Config {
        source: SourceConfig {
            backup_path: "/backup".into(),
            batches: BTreeMap::new(),
        },
        target: TargetConfig {
            host: "localhost".to_string(),
            port: 3306,
            database: "app".to_string(),
            user: "root".to_string(),
            password: String::new(),
        },
        migration: MigrationConfig::default(),
    }
}

fn record(oid: &str) -> Document {
    Document::new().with("_id", Value::oid(oid))
}

fn ids(oids: &[&str]) -> Value {
    Value::List(oids.iter().map(|o| Value::oid(*o)).collect())
}

fn offer(price: impl Into<Value>, image: &str) -> Document {
    Document::new().with("price", price).with("image_link", image)
}

/// One or two documents for every kind, cross-referencing each other.
fn full_backup() -> MemorySource {
    MemorySource::new()
        .with_batch("Setting", vec![record("s1").with("metaTitle", "Deals")])
        .with_batch(
            "User",
            vec![
                record("u1").with("email", "a@example.com"),
                record("u2").with("email", "b@example.com"),
            ],
        )
        .with_batch(
            "Category",
            vec![
                record("c2").with("name", "Phones").with("parentId", Value::oid("c1")),
                record("c1").with("name", "Electronics"),
            ],
        )
        .with_batch(
            "Brand",
            vec![
                record("b1").with("name", "Acme").with("slug", "sale"),
                record("b2").with("name", "Globex").with("slug", "sale"),
            ],
        )
        .with_batch("Attribute", vec![record("a1").with("name", "Color")])
        .with_batch("LeadForm", vec![record("f1").with("name", "Apply")])
        .with_batch("Bank", vec![record("k1").with("brandId", Value::oid("b1"))])
        .with_batch(
            "Campaign",
            vec![record("m1")
                .with("title", "Summer")
                .with("slug", "summer")
                .with("leadFormId", Value::oid("f1"))
                .with("brandIds", ids(&["b1", "deleted", "b2"]))
                .with("categoryIds", ids(&["c1"]))],
        )
        .with_batch(
            "Post",
            vec![record("p1")
                .with("title", "Hello")
                .with("categoryIds", ids(&["c1", "c2"]))],
        )
        .with_batch("Page", vec![record("g1").with("title", "About")])
        .with_batch("Slider", vec![record("l1").with("name", "Hero")])
        .with_batch("Ads", vec![record("d1").with("name", "Banner")])
        .with_batch(
            "Product",
            vec![record("r1")
                .with("gtin", "869")
                .with("brand", "Acme")
                .with(
                    "stores",
                    vec![offer(19.99, "a.jpg"), offer(0, ""), offer(15.50, "b.jpg")],
                )],
        )
        .with_batch(
            "ProductPriceHistory",
            vec![
                record("h1").with("gtin", "869").with("storePrice", 15.5),
                record("h2").with("gtin", "000"),
            ],
        )
        .with_batch("Car", vec![record("v1").with("model", "Model S")])
        .with_batch("RealEstate", vec![record("e1").with("name", "Towers")])
        .with_batch(
            "Lead",
            vec![record("n1")
                .with("campaignId", Value::oid("m1"))
                .with("userId", Value::oid("u2"))
                .with("formId", Value::oid("f1"))],
        )
}

fn orchestrator(source: MemorySource, target: &MemoryTarget) -> Orchestrator {
    Orchestrator::with_parts(config(), Arc::new(source), Arc::new(target.clone()))
}

#[tokio::test]
async fn test_full_run() {
    let target = MemoryTarget::with_destination_schema();
    let report = orchestrator(full_backup(), &target).run().await.unwrap();

    assert_eq!(report.status, "completed");
    assert_eq!(report.failures(), 0);
    assert_eq!(
        report.summary_lines(),
        vec![
            "Total records migrated:",
            "  users: 2",
            "  categories: 2",
            "  brands: 2",
            "  campaigns: 1",
            "  lead_forms: 1",
            "  banks: 1",
            "  posts: 1",
            "  pages: 1",
            "  sliders: 1",
            "  ads: 1",
            "  products: 1",
            "  product_price_histories: 1",
            "  cars: 1",
            "  real_estates: 1",
            "  attributes: 1",
            "  leads: 1",
        ]
    );

    // Category parent listed after its child.
    let categories = target.rows("categories");
    assert_eq!(categories[0].key("parent_id"), Some(2));
    assert_eq!(categories[1].get("parent_id"), Some(SqlValue::Null));

    let slugs: Vec<_> = target
        .rows("brands")
        .iter()
        .filter_map(|r| r.text("slug"))
        .collect();
    assert_eq!(slugs, vec!["sale", "sale-1"]);

    assert_eq!(target.row_count("campaign_brand"), 2);
    assert_eq!(target.row_count("campaign_category"), 1);
    assert_eq!(target.row_count("category_post"), 2);
    let campaigns = report
        .stages
        .iter()
        .find(|s| s.stage == "campaigns")
        .unwrap();
    assert_eq!(campaigns.links_dropped, 1);

    let product = target.rows("products").remove(0);
    assert_eq!(product.get("price"), Some(SqlValue::F64(15.5)));
    assert_eq!(product.key("brand_id"), Some(1));
    assert_eq!(product.text("images").as_deref(), Some(r#"["a.jpg","b.jpg"]"#));

    let lead = target.rows("leads").remove(0);
    assert_eq!(lead.key("campaign_id"), Some(1));
    assert_eq!(lead.key("user_id"), Some(2));
    assert_eq!(lead.key("form_id"), Some(1));

    let bank = target.rows("banks").remove(0);
    assert_eq!(bank.key("brand_id"), Some(1));

    // Clear, one commit per kind, and the category parent pass.
    assert_eq!(target.commits(), 1 + EntityKind::MIGRATION_ORDER.len() + 1);
}

#[tokio::test]
async fn test_missing_batch_does_not_stop_later_stages() {
    let target = MemoryTarget::with_destination_schema();
    let source = full_backup().without_batch("Brand");
    let report = orchestrator(source, &target).run().await.unwrap();

    let brands = report.stages.iter().find(|s| s.stage == "brands").unwrap();
    assert_eq!(brands.status, StageStatus::SourceMissing);
    assert!(report.totals.iter().all(|c| c.kind != "brands"));
    assert_eq!(target.row_count("brands"), 0);

    // Later stages still ran; their brand references are NULL.
    assert_eq!(target.row_count("campaigns"), 1);
    assert_eq!(target.row_count("campaign_brand"), 0);
    assert_eq!(target.rows("banks")[0].get("brand_id"), Some(SqlValue::Null));
    assert_eq!(target.rows("products")[0].get("brand_id"), Some(SqlValue::Null));
}

#[tokio::test]
async fn test_two_runs_are_identical() {
    let target = MemoryTarget::with_destination_schema();

    let keys = |target: &MemoryTarget| {
        let lead = target.rows("leads").remove(0);
        let links: Vec<_> = target
            .rows("campaign_brand")
            .iter()
            .map(|r| (r.key("campaign_id"), r.key("brand_id")))
            .collect();
        (
            lead.id,
            lead.key("campaign_id"),
            lead.key("user_id"),
            lead.key("form_id"),
            links,
        )
    };

    let first = orchestrator(full_backup(), &target).run().await.unwrap();
    let first_counts = target.table_counts();
    let first_keys = keys(&target);

    let second = orchestrator(full_backup(), &target).run().await.unwrap();

    assert_eq!(first.totals, second.totals);
    assert_eq!(first_counts, target.table_counts());
    assert_eq!(first_keys, keys(&target));
}

#[tokio::test]
async fn test_unreachable_target_is_fatal() {
    let target = MemoryTarget::unreachable();
    let err = orchestrator(full_backup(), &target).run().await.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, MigrateError::Pool { .. }));
}

#[tokio::test]
async fn test_rejected_rows_are_skipped_not_fatal() {
    let target = MemoryTarget::with_destination_schema().with_unique("users", "email");
    let source = full_backup().with_batch(
        "User",
        vec![
            record("u1").with("email", "same@example.com"),
            record("u2").with("email", "same@example.com"),
        ],
    );
    let report = orchestrator(source, &target).run().await.unwrap();

    assert_eq!(report.status, "completed_with_errors");
    let users = report.stages.iter().find(|s| s.stage == "users").unwrap();
    assert_eq!(users.inserted, 1);
    assert_eq!(users.failures[0].label, "same@example.com");
    // The lead's user did not make it: its reference is NULL.
    assert_eq!(target.rows("leads")[0].get("user_id"), Some(SqlValue::Null));
}

#[tokio::test]
async fn test_existing_brand_is_reused() {
    let target = MemoryTarget::with_destination_schema();
    let mut config = config();
    config.migration.clear_target = false;
    target
        .seed(Row::new("brands").set("name", "Acme").set("slug", "acme"))
        .unwrap();

    let source = MemorySource::new().with_batch(
        "Brand",
        vec![record("b1").with("name", "Acme").with("slug", "acme")],
    );
    let report = Orchestrator::with_parts(config, Arc::new(source), Arc::new(target.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(target.row_count("brands"), 1);
    let brands = report.stages.iter().find(|s| s.stage == "brands").unwrap();
    assert_eq!(brands.merged, 1);
    assert_eq!(report.totals[0].kind, "brands");
    assert_eq!(report.totals[0].count, 1);
}

#[tokio::test]
async fn test_bson_backup_directory() {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, docs: &[bson::Document]| {
        let mut buf = Vec::new();
        for d in docs {
            d.to_writer(&mut buf).unwrap();
        }
        std::fs::write(dir.path().join(format!("{name}.bson")), buf).unwrap();
    };

    let brand = ObjectId::new();
    let campaign = ObjectId::new();
    write("Brand", &[doc! { "_id": brand, "name": "Acme", "slug": "acme" }]);
    write(
        "Campaign",
        &[doc! {
            "_id": campaign,
            "title": "Spring",
            "brandIds": [brand, ObjectId::new()],
            "meta": { "title": "Spring", "createdBy": brand },
        }],
    );
    std::fs::write(dir.path().join("Car.bson"), b"not bson").unwrap();

    let mut config = config();
    config.source.backup_path = dir.path().to_path_buf();
    let source = mongo_mysql_migrate::BsonDirSource::open(dir.path()).unwrap();
    let target = MemoryTarget::with_destination_schema();
    let report = Orchestrator::with_parts(config, Arc::new(source), Arc::new(target.clone()))
        .run()
        .await
        .unwrap();

    let campaign_row = target.rows("campaigns").remove(0);
    assert_eq!(
        campaign_row.text("meta"),
        Some(format!(r#"{{"title":"Spring","createdBy":"{}"}}"#, brand.to_hex()))
    );
    assert_eq!(target.row_count("campaign_brand"), 1);

    // The corrupt batch is read as empty, not missing.
    let cars = report.stages.iter().find(|s| s.stage == "cars").unwrap();
    assert_eq!(cars.status, StageStatus::Completed);
    assert_eq!(cars.documents, 0);
}
