//! Local record extractor.
//!
//! Reads a product (and, for a variable product, each variation) or a
//! category from the local store and flattens it into the comparison
//! schema.  Variations inherit brand, condition, description, image,
//! categories and attributes from their parent unless they override
//! them.  A variation that cannot be read is noted in the trail and left
//! out; the remaining ones are still extracted.

use catsync_core::entity::{CategoryEntity, LocalEntity, Price, ProductKind};
use catsync_core::error::CoreError;
use catsync_core::normalize::{clean_text, truncate, DESCRIPTION_LIMIT};
use catsync_core::result::DebugTrail;
use catsync_core::types::EntityId;
use catsync_store::{keys, LocalCatalog, StoredProduct};

const DEFAULT_CONDITION: &str = "new";

/// Everything extracted for one product id.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductExtraction {
    pub kind: ProductKind,
    /// Key of the requested product itself (the parent for a variable).
    pub retailer_id: String,
    /// One entry per comparable entity, in store order.
    pub entities: Vec<LocalEntity>,
    /// Variations that were listed but could not be extracted.
    pub skipped: Vec<EntityId>,
}

/// Extract the product `id`.
pub async fn extract_product(
    catalog: &dyn LocalCatalog,
    id: EntityId,
    trail: &mut DebugTrail,
) -> Result<ProductExtraction, CoreError> {
    let product = catalog
        .product(id)
        .await
        .map_err(|e| CoreError::Extraction(format!("product {id}: {e}")))?
        .ok_or(CoreError::NotFound {
            entity: "product",
            id,
        })?;

    let retailer_id = catalog.product_key(&product);
    trail.push(format!(
        "local product {id} is {} with key {retailer_id}",
        product.kind
    ));

    let mut entities = Vec::new();
    let mut skipped = Vec::new();

    match product.kind {
        ProductKind::Simple => entities.push(to_local(catalog, &product, None)),
        ProductKind::Variation => {
            let parent = match product.parent_id {
                Some(parent_id) => match catalog.product(parent_id).await {
                    Ok(parent) => parent,
                    Err(e) => {
                        trail.push(format!(
                            "parent {parent_id} of variation {id} unreadable, nothing inherited: {e}"
                        ));
                        None
                    }
                },
                None => None,
            };
            entities.push(to_local(catalog, &product, parent.as_ref()));
        }
        ProductKind::Variable => {
            let children = catalog
                .children(id)
                .await
                .map_err(|e| CoreError::Extraction(format!("variations of {id}: {e}")))?;
            trail.push(format!("variable product {id} lists {} variations", children.len()));

            for child_id in children {
                match catalog.product(child_id).await {
                    Ok(Some(child)) if child.kind == ProductKind::Variation => {
                        entities.push(to_local(catalog, &child, Some(&product)));
                    }
                    Ok(Some(child)) => {
                        trail.push(format!(
                            "child {child_id} is {} rather than a variation; skipped",
                            child.kind
                        ));
                        skipped.push(child_id);
                    }
                    Ok(None) => {
                        trail.push(format!("variation {child_id} not found locally; skipped"));
                        skipped.push(child_id);
                    }
                    Err(e) => {
                        tracing::warn!(parent_id = id, child_id, error = %e, "Variation extraction failed");
                        trail.push(format!("variation {child_id} could not be read: {e}; skipped"));
                        skipped.push(child_id);
                    }
                }
            }
        }
    }

    Ok(ProductExtraction {
        kind: product.kind,
        retailer_id,
        entities,
        skipped,
    })
}

/// Extract the category with term id `id`.
pub async fn extract_category(
    catalog: &dyn LocalCatalog,
    id: EntityId,
    trail: &mut DebugTrail,
) -> Result<CategoryEntity, CoreError> {
    let category = catalog
        .category(id)
        .await
        .map_err(|e| CoreError::Extraction(format!("category {id}: {e}")))?
        .ok_or(CoreError::NotFound {
            entity: "category",
            id,
        })?;

    let retailer_id = catalog.category_key(&category);
    trail.push(format!(
        "local category {id} (term taxonomy {}) has key {retailer_id}",
        category.term_taxonomy_id
    ));

    Ok(CategoryEntity {
        id: category.term_id,
        term_taxonomy_id: category.term_taxonomy_id,
        name: category.name,
        retailer_id,
    })
}

fn first_non_empty<'a>(candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    candidates.into_iter().map(str::trim).find(|s| !s.is_empty())
}

/// Flatten `product` into the comparison schema, filling gaps from
/// `parent`.
fn to_local(
    catalog: &dyn LocalCatalog,
    product: &StoredProduct,
    parent: Option<&StoredProduct>,
) -> LocalEntity {
    let from_parent = |f: fn(&StoredProduct) -> &str| parent.map(f).unwrap_or_default();

    let title = first_non_empty([product.name.as_str(), from_parent(|p| &p.name)])
        .unwrap_or_default()
        .to_string();

    let currency = first_non_empty([product.currency.as_str(), from_parent(|p| &p.currency)])
        .unwrap_or_default()
        .to_string();
    let price = product
        .price
        .as_deref()
        .map(str::trim)
        .filter(|amount| !amount.is_empty())
        .map(|amount| Price {
            amount: amount.to_string(),
            currency,
        });

    let description = first_non_empty([
        product.description.as_str(),
        product.short_description.as_str(),
        from_parent(|p| &p.description),
        from_parent(|p| &p.short_description),
    ])
    .map(|d| truncate(&clean_text(d), DESCRIPTION_LIMIT))
    .unwrap_or_default();

    let condition = product
        .condition
        .as_deref()
        .or_else(|| parent.and_then(|p| p.condition.as_deref()))
        .unwrap_or(DEFAULT_CONDITION)
        .to_string();

    let brand = product
        .brand
        .as_deref()
        .or_else(|| parent.and_then(|p| p.brand.as_deref()))
        .unwrap_or_default()
        .to_string();

    let mut attributes = parent.map(|p| p.attributes.clone()).unwrap_or_default();
    attributes.extend(product.attributes.clone());

    let image_url = product
        .image_url
        .clone()
        .or_else(|| parent.and_then(|p| p.image_url.clone()));

    let category_ids = if product.category_ids.is_empty() {
        parent.map(|p| p.category_ids.as_slice()).unwrap_or_default()
    } else {
        product.category_ids.as_slice()
    };

    LocalEntity {
        id: product.id,
        kind: product.kind,
        parent_id: product.parent_id,
        retailer_id: catalog.product_key(product),
        title,
        price,
        description,
        availability: product.stock_status.availability().to_string(),
        condition,
        brand,
        attributes,
        image_url,
        category_keys: category_ids.iter().map(|ttid| keys::category_key(*ttid)).collect(),
    }
}
