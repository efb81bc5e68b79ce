//! Raw records as the local store holds them.
//!
//! These mirror WooCommerce's own shape (stock status slugs, separate
//! short description, optional per-product overrides).  The extractor
//! turns them into [`catsync_core::entity::LocalEntity`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use catsync_core::entity::ProductKind;
use catsync_core::types::EntityId;

/// WooCommerce `_stock_status` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    #[default]
    #[serde(rename = "instock")]
    InStock,
    #[serde(rename = "outofstock")]
    OutOfStock,
    #[serde(rename = "onbackorder")]
    OnBackorder,
}

impl StockStatus {
    /// Parse the stored slug; anything unrecognized counts as in stock,
    /// which is what WooCommerce assumes for a missing value.
    pub fn from_slug(slug: &str) -> Self {
        match slug.trim() {
            "outofstock" => Self::OutOfStock,
            "onbackorder" => Self::OnBackorder,
            _ => Self::InStock,
        }
    }

    /// The remote catalog's availability vocabulary.
    pub fn availability(&self) -> &'static str {
        match self {
            Self::InStock => "in stock",
            Self::OutOfStock => "out of stock",
            Self::OnBackorder => "available for order",
        }
    }
}

/// A product or variation row plus the meta the validator reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProduct {
    pub id: EntityId,
    pub kind: ProductKind,
    #[serde(default)]
    pub parent_id: Option<EntityId>,
    #[serde(default)]
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub stock_status: StockStatus,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    /// Attribute name (without the `pa_` prefix) to value.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Term taxonomy ids of the product's categories.
    #[serde(default)]
    pub category_ids: Vec<EntityId>,
}

/// A `product_cat` term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCategory {
    pub term_id: EntityId,
    pub term_taxonomy_id: EntityId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub parent: Option<EntityId>,
}

/// Remote integration settings as recorded locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    #[serde(default)]
    pub configured: bool,
    #[serde(default)]
    pub catalog_id: String,
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_status_slugs() {
        assert_eq!(StockStatus::from_slug("outofstock"), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_slug(""), StockStatus::InStock);
        assert_eq!(StockStatus::OnBackorder.availability(), "available for order");
    }

    #[test]
    fn product_defaults_from_minimal_json() {
        let product: StoredProduct =
            serde_json::from_str(r#"{"id": 3, "kind": "simple", "name": "Mug"}"#).unwrap();
        assert_eq!(product.stock_status, StockStatus::InStock);
        assert!(product.sku.is_empty());
        assert!(product.category_ids.is_empty());
    }
}
