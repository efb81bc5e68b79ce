//! Canonical comparison schema shared by both sides of a validation.
//!
//! [`LocalEntity`] / [`CategoryEntity`] are what the extractor produces
//! from the local store; [`RemoteEntity`] / [`RemoteSet`] are what the
//! remote catalog reports.  Field access goes through [`FieldSource`]
//! so the comparator can walk a field mapping without knowing which
//! concrete type it holds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, RemoteId};

/// Local product shape, as far as validation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Simple,
    Variable,
    Variation,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Variable => "variable",
            Self::Variation => "variation",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A price with its currency kept apart from the amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: String,
    pub currency: String,
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.currency.is_empty() {
            f.write_str(&self.amount)
        } else {
            write!(f, "{} {}", self.amount, self.currency)
        }
    }
}

/// A simple product or a single variant, flattened for comparison.
///
/// Variants carry their parent's id; inherited fields (brand, condition,
/// description, image) are already resolved by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEntity {
    pub id: EntityId,
    pub kind: ProductKind,
    pub parent_id: Option<EntityId>,
    pub retailer_id: String,
    pub title: String,
    pub price: Option<Price>,
    pub description: String,
    pub availability: String,
    pub condition: String,
    pub brand: String,
    pub attributes: BTreeMap<String, String>,
    pub image_url: Option<String>,
    /// Stable keys of the categories the product belongs to.
    pub category_keys: Vec<String>,
}

/// A local category, keyed by its term taxonomy id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntity {
    pub id: EntityId,
    pub term_taxonomy_id: EntityId,
    pub name: String,
    pub retailer_id: String,
}

/// A set a remote product belongs to: the set's remote id and its own
/// external key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub set_id: RemoteId,
    pub retailer_id: Option<String>,
}

/// A product record as reported by the remote catalog.
///
/// Every field except `id` is optional: the remote only returns what it
/// has ingested so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntity {
    pub id: RemoteId,
    pub retailer_id: Option<String>,
    pub name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub availability: Option<String>,
    pub condition: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    /// The remote product family this record belongs to.
    pub group_id: Option<RemoteId>,
    pub memberships: Vec<Membership>,
}

/// A remote product set -- the remote analog of a category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteSet {
    pub id: RemoteId,
    pub name: Option<String>,
    pub retailer_id: Option<String>,
}

/// Field lookup by mapping name.
///
/// `None` means the source does not carry the field at all, which is
/// different from carrying an empty value.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<String>;
}

impl FieldSource for LocalEntity {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "title" => Some(self.title.clone()),
            "price" => self.price.as_ref().map(ToString::to_string),
            "retailer_id" => Some(self.retailer_id.clone()),
            "availability" => Some(self.availability.clone()),
            "description" => Some(self.description.clone()),
            "brand" => Some(self.brand.clone()),
            "condition" => Some(self.condition.clone()),
            "image_url" => self.image_url.clone(),
            other => self.attributes.get(other).cloned(),
        }
    }
}

impl FieldSource for RemoteEntity {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "name" => self.name.clone(),
            "price" => self.price.clone(),
            "retailer_id" => self.retailer_id.clone(),
            "availability" => self.availability.clone(),
            "description" => self.description.clone(),
            "brand" => self.brand.clone(),
            "condition" => self.condition.clone(),
            "image_url" => self.image_url.clone(),
            _ => None,
        }
    }
}

impl FieldSource for CategoryEntity {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "name" => Some(self.name.clone()),
            "retailer_id" => Some(self.retailer_id.clone()),
            _ => None,
        }
    }
}

impl FieldSource for RemoteSet {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "name" => self.name.clone(),
            "retailer_id" => self.retailer_id.clone(),
            _ => None,
        }
    }
}
