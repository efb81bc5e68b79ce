//! Read-only access to the local commerce catalog.
//!
//! [`LocalCatalog`] is the seam the validator reads through.  Two
//! implementations ship here:
//!
//! - [`snapshot::SnapshotCatalog`] -- an in-memory catalog loaded from a
//!   JSON export.
//! - [`woo::WooCatalog`] -- direct `SELECT`s against a WooCommerce MySQL
//!   database.
//!
//! Neither ever writes.

pub mod error;
pub mod keys;
pub mod model;
pub mod snapshot;
pub mod woo;

use async_trait::async_trait;

use catsync_core::types::EntityId;

pub use error::StoreError;
pub use model::{IntegrationConfig, StockStatus, StoredCategory, StoredProduct};

/// Read-only view of the local catalog.
#[async_trait]
pub trait LocalCatalog: Send + Sync {
    /// A product or variation by post id, `None` if absent or trashed.
    async fn product(&self, id: EntityId) -> Result<Option<StoredProduct>, StoreError>;

    /// Variation ids of a variable product, in display order.
    async fn children(&self, parent_id: EntityId) -> Result<Vec<EntityId>, StoreError>;

    /// A product category by term id.
    async fn category(&self, term_id: EntityId) -> Result<Option<StoredCategory>, StoreError>;

    /// Remote integration settings recorded in the store.
    async fn integration(&self) -> Result<IntegrationConfig, StoreError>;

    /// External key the remote catalog knows this product by.
    fn product_key(&self, product: &StoredProduct) -> String {
        keys::product_key(&product.sku, product.id)
    }

    /// External key of the remote set mirroring this category.
    fn category_key(&self, category: &StoredCategory) -> String {
        keys::category_key(category.term_taxonomy_id)
    }
}
