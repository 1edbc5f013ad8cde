//! Editorial content: posts, pages, sliders, ads and product attributes.

use super::columns::{col, flag, json, nullable, now_stamp, stamp, text, Fallback, Source};
use super::link::CATEGORY_POST;
use super::{Column, MappedMigrator};
use crate::document::EmptyJson;
use crate::kind::EntityKind;

const POSTS: &[Column] = &[
    text("slug"),
    text("title"),
    text("content"),
    nullable("image"),
    json("meta", "meta", EmptyJson::Map),
    stamp("created_at", "created_at"),
    stamp("updated_at", "updated_at"),
];

const PAGES: &[Column] = &[
    text("slug"),
    text("title"),
    text("content"),
    json("meta", "meta", EmptyJson::Map),
    stamp("created_at", "createdAt"),
    stamp("updated_at", "updatedAt"),
];

const SLIDERS: &[Column] = &[
    text("name"),
    nullable("image"),
    nullable("link"),
    flag("is_active", "isActive", true),
    stamp("created_at", "createdAt"),
    stamp("updated_at", "updatedAt"),
];

const ADS: &[Column] = &[
    text("name"),
    text("type"),
    col("item_type", Source::Field("itemType", Fallback::Text(""))),
    nullable("device"),
    nullable("item"),
    nullable("image"),
    nullable("link"),
    nullable("code"),
    flag("is_active", "isActive", true),
    text("position"),
    stamp("created_at", "createdAt"),
    stamp("updated_at", "updatedAt"),
];

const ATTRIBUTES: &[Column] = &[
    text("name"),
    text("type"),
    now_stamp("created_at"),
    now_stamp("updated_at"),
];

pub fn posts() -> MappedMigrator {
    MappedMigrator {
        kind: EntityKind::Posts,
        label_field: "title",
        columns: POSTS,
        links: &[CATEGORY_POST],
    }
}

pub fn pages() -> MappedMigrator {
    MappedMigrator {
        kind: EntityKind::Pages,
        label_field: "title",
        columns: PAGES,
        links: &[],
    }
}

pub fn sliders() -> MappedMigrator {
    MappedMigrator {
        kind: EntityKind::Sliders,
        label_field: "name",
        columns: SLIDERS,
        links: &[],
    }
}

pub fn ads() -> MappedMigrator {
    MappedMigrator {
        kind: EntityKind::Ads,
        label_field: "name",
        columns: ADS,
        links: &[],
    }
}

pub fn attributes() -> MappedMigrator {
    MappedMigrator {
        kind: EntityKind::Attributes,
        label_field: "name",
        columns: ATTRIBUTES,
        links: &[],
    }
}
