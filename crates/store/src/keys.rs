//! Stable external keys.
//!
//! The key is the join column against the remote catalog.  It survives
//! renames and edits because it only depends on the SKU and the id.

use catsync_core::types::EntityId;

const POST_ID_PREFIX: &str = "wc_post_id_";
const CATEGORY_PREFIX: &str = "wc_category_";

/// `{sku}_{id}` when the product has a SKU, `wc_post_id_{id}` otherwise.
pub fn product_key(sku: &str, id: EntityId) -> String {
    let sku = sku.trim();
    if sku.is_empty() {
        format!("{POST_ID_PREFIX}{id}")
    } else {
        format!("{sku}_{id}")
    }
}

/// `wc_category_{term_taxonomy_id}`.
pub fn category_key(term_taxonomy_id: EntityId) -> String {
    format!("{CATEGORY_PREFIX}{term_taxonomy_id}")
}
