//! Listing kinds: banks, cars and real estate projects.

use super::columns::{col, flag, json, now_stamp, nullable_from, text, Fallback, Source};
use super::{Column, MappedMigrator};
use crate::document::{EmptyJson, ID_FIELD};
use crate::kind::EntityKind;

const BANKS: &[Column] = &[
    col("brand_id", Source::Ref("brandId", EntityKind::Brands)),
    text("content"),
    json("faqs", "faqs", EmptyJson::List),
    json("personal", "personal", EmptyJson::Map),
    json("mortgage", "mortgage", EmptyJson::Map),
    json("new_car", "newCar", EmptyJson::Map),
    json("used_car", "usedCar", EmptyJson::Map),
    flag("is_active", "isActive", true),
    flag("sponsored_status", "sponsoredStatus", false),
    now_stamp("created_at"),
    now_stamp("updated_at"),
];

const CARS: &[Column] = &[
    text("model"),
    text("brand"),
    json("history_prices", "historyPrices", EmptyJson::List),
    json("attributes", "attributes", EmptyJson::List),
    json("images", "images", EmptyJson::List),
    json("euroncap", "euroncap", EmptyJson::Map),
    json("colors", "colors", EmptyJson::List),
    now_stamp("created_at"),
    now_stamp("updated_at"),
];

const REAL_ESTATES: &[Column] = &[
    text("name"),
    nullable_from("delivery_date", "deliveryDate"),
    col("unit_delivery", Source::Field("unitDelivery", Fallback::Text(""))),
    col("property_type", Source::Field("propertyType", Fallback::Text(""))),
    col("number_of_units", Source::Field("numberOfUnits", Fallback::Int(0))),
    col("floor_count", Source::Field("floorCount", Fallback::Int(0))),
    text("elevator"),
    text("parking"),
    text("heating"),
    col("maps_url", Source::Field("mapsUrl", Fallback::Text(""))),
    json("images", "images", EmptyJson::List),
    json("price_plans", "pricePlans", EmptyJson::List),
    json("owners", "owners", EmptyJson::List),
    col("country", Source::Field("country", Fallback::Country)),
    text("city"),
    text("district"),
    now_stamp("created_at"),
    now_stamp("updated_at"),
];

pub fn banks() -> MappedMigrator {
    MappedMigrator {
        kind: EntityKind::Banks,
        label_field: ID_FIELD,
        columns: BANKS,
        links: &[],
    }
}

pub fn cars() -> MappedMigrator {
    MappedMigrator {
        kind: EntityKind::Cars,
        label_field: "model",
        columns: CARS,
        links: &[],
    }
}

pub fn real_estates() -> MappedMigrator {
    MappedMigrator {
        kind: EntityKind::RealEstates,
        label_field: "name",
        columns: REAL_ESTATES,
        links: &[],
    }
}
