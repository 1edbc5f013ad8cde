//! Lead capture: forms and submitted leads.

use super::columns::{col, flag, json, stamp, text, Fallback, Source};
use super::{Column, MappedMigrator};
use crate::document::{EmptyJson, ID_FIELD};
use crate::kind::EntityKind;

const LEAD_FORMS: &[Column] = &[
    text("name"),
    text("description"),
    col("button_text", Source::Field("buttonText", Fallback::Text("Gönder"))),
    flag("is_category_show", "isCategoryShow", false),
    json("fields", "fields", EmptyJson::List),
    stamp("created_at", "created_at"),
    stamp("updated_at", "updated_at"),
];

const LEADS: &[Column] = &[
    col("campaign_id", Source::Ref("campaignId", EntityKind::Campaigns)),
    col("user_id", Source::Ref("userId", EntityKind::Users)),
    col("form_id", Source::Ref("formId", EntityKind::LeadForms)),
    json("form_values", "formValues", EmptyJson::List),
    json("interest_categories", "interestCategories", EmptyJson::List),
    stamp("created_at", "createdAt"),
    stamp("updated_at", "updatedAt"),
];

pub fn lead_forms() -> MappedMigrator {
    MappedMigrator {
        kind: EntityKind::LeadForms,
        label_field: "name",
        columns: LEAD_FORMS,
        links: &[],
    }
}

pub fn leads() -> MappedMigrator {
    MappedMigrator {
        kind: EntityKind::Leads,
        label_field: ID_FIELD,
        columns: LEADS,
        links: &[],
    }
}
