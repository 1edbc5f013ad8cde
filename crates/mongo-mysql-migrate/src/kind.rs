//! Entity kinds and the fixed migration order.

use std::fmt;

/// One source collection and its destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Settings,
    Users,
    Categories,
    Brands,
    Attributes,
    LeadForms,
    Banks,
    Campaigns,
    Posts,
    Pages,
    Sliders,
    Ads,
    Products,
    ProductPriceHistories,
    Cars,
    RealEstates,
    Leads,
}

impl EntityKind {
    /// Stage order. A kind only references kinds that appear before it.
    pub const MIGRATION_ORDER: [EntityKind; 17] = [
        EntityKind::Settings,
        EntityKind::Users,
        EntityKind::Categories,
        EntityKind::Brands,
        EntityKind::Attributes,
        EntityKind::LeadForms,
        EntityKind::Banks,
        EntityKind::Campaigns,
        EntityKind::Posts,
        EntityKind::Pages,
        EntityKind::Sliders,
        EntityKind::Ads,
        EntityKind::Products,
        EntityKind::ProductPriceHistories,
        EntityKind::Cars,
        EntityKind::RealEstates,
        EntityKind::Leads,
    ];

    /// Order of the per-kind lines in the final summary.
    pub const SUMMARY_ORDER: [EntityKind; 16] = [
        EntityKind::Users,
        EntityKind::Categories,
        EntityKind::Brands,
        EntityKind::Campaigns,
        EntityKind::LeadForms,
        EntityKind::Banks,
        EntityKind::Posts,
        EntityKind::Pages,
        EntityKind::Sliders,
        EntityKind::Ads,
        EntityKind::Products,
        EntityKind::ProductPriceHistories,
        EntityKind::Cars,
        EntityKind::RealEstates,
        EntityKind::Attributes,
        EntityKind::Leads,
    ];

    /// Destination table name; also the kind's name in config and summaries.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Settings => "settings",
            EntityKind::Users => "users",
            EntityKind::Categories => "categories",
            EntityKind::Brands => "brands",
            EntityKind::Attributes => "attributes",
            EntityKind::LeadForms => "lead_forms",
            EntityKind::Banks => "banks",
            EntityKind::Campaigns => "campaigns",
            EntityKind::Posts => "posts",
            EntityKind::Pages => "pages",
            EntityKind::Sliders => "sliders",
            EntityKind::Ads => "ads",
            EntityKind::Products => "products",
            EntityKind::ProductPriceHistories => "product_price_histories",
            EntityKind::Cars => "cars",
            EntityKind::RealEstates => "real_estates",
            EntityKind::Leads => "leads",
        }
    }

    /// Default batch (collection dump) name, without the `.bson` extension.
    pub fn default_batch(self) -> &'static str {
        match self {
            EntityKind::Settings => "Setting",
            EntityKind::Users => "User",
            EntityKind::Categories => "Category",
            EntityKind::Brands => "Brand",
            EntityKind::Attributes => "Attribute",
            EntityKind::LeadForms => "LeadForm",
            EntityKind::Banks => "Bank",
            EntityKind::Campaigns => "Campaign",
            EntityKind::Posts => "Post",
            EntityKind::Pages => "Page",
            EntityKind::Sliders => "Slider",
            EntityKind::Ads => "Ads",
            EntityKind::Products => "Product",
            EntityKind::ProductPriceHistories => "ProductPriceHistory",
            EntityKind::Cars => "Car",
            EntityKind::RealEstates => "RealEstate",
            EntityKind::Leads => "Lead",
        }
    }

    /// Human-readable label used in progress lines.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Settings => "Settings",
            EntityKind::Users => "Users",
            EntityKind::Categories => "Categories",
            EntityKind::Brands => "Brands",
            EntityKind::Attributes => "Attributes",
            EntityKind::LeadForms => "Lead Forms",
            EntityKind::Banks => "Banks",
            EntityKind::Campaigns => "Campaigns",
            EntityKind::Posts => "Posts",
            EntityKind::Pages => "Pages",
            EntityKind::Sliders => "Sliders",
            EntityKind::Ads => "Ads",
            EntityKind::Products => "Products",
            EntityKind::ProductPriceHistories => "Product Price Histories",
            EntityKind::Cars => "Cars",
            EntityKind::RealEstates => "Real Estates",
            EntityKind::Leads => "Leads",
        }
    }

    /// Parse a kind from its table name.
    pub fn from_table(name: &str) -> Option<Self> {
        Self::MIGRATION_ORDER
            .iter()
            .copied()
            .find(|k| k.table() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Tables emptied before a run, children first. `settings` is left alone
/// because it carries seeded keys that the settings stage updates in place.
pub const TRUNCATE_ORDER: [&str; 19] = [
    "campaign_brand",
    "campaign_category",
    "category_post",
    "leads",
    "campaigns",
    "brands",
    "categories",
    "users",
    "lead_forms",
    "banks",
    "posts",
    "pages",
    "sliders",
    "ads",
    "products",
    "product_price_histories",
    "cars",
    "real_estates",
    "attributes",
];
