//! In-memory catalog loaded from a JSON export.
//!
//! ```json
//! {
//!   "integration": { "configured": true, "catalog_id": "123" },
//!   "products": [ { "id": 10, "kind": "simple", "name": "Widget", "sku": "SKU-1" } ],
//!   "categories": [ { "term_id": 4, "term_taxonomy_id": 9, "name": "Shoes" } ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use catsync_core::types::EntityId;

use crate::error::StoreError;
use crate::model::{IntegrationConfig, StoredCategory, StoredProduct};
use crate::LocalCatalog;

/// On-disk snapshot layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub integration: IntegrationConfig,
    #[serde(default)]
    pub products: Vec<StoredProduct>,
    #[serde(default)]
    pub categories: Vec<StoredCategory>,
}

/// Immutable catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCatalog {
    integration: IntegrationConfig,
    products: HashMap<EntityId, StoredProduct>,
    categories: HashMap<EntityId, StoredCategory>,
}

impl SnapshotCatalog {
    pub fn from_document(doc: SnapshotDocument) -> Self {
        Self {
            integration: doc.integration,
            products: doc.products.into_iter().map(|p| (p.id, p)).collect(),
            categories: doc
                .categories
                .into_iter()
                .map(|c| (c.term_id, c))
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let doc: SnapshotDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(doc))
    }

    /// Read and parse a snapshot file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            products = catalog.products.len(),
            categories = catalog.categories.len(),
            "Loaded catalog snapshot",
        );
        Ok(catalog)
    }
}

#[async_trait]
impl LocalCatalog for SnapshotCatalog {
    async fn product(&self, id: EntityId) -> Result<Option<StoredProduct>, StoreError> {
        Ok(self.products.get(&id).cloned())
    }

    async fn children(&self, parent_id: EntityId) -> Result<Vec<EntityId>, StoreError> {
        let mut ids: Vec<EntityId> = self
            .products
            .values()
            .filter(|p| p.parent_id == Some(parent_id))
            .map(|p| p.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn category(&self, term_id: EntityId) -> Result<Option<StoredCategory>, StoreError> {
        Ok(self.categories.get(&term_id).cloned())
    }

    async fn integration(&self) -> Result<IntegrationConfig, StoreError> {
        Ok(self.integration.clone())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const DOC: &str = r#"{
        "integration": { "configured": true, "catalog_id": "123" },
        "products": [
            { "id": 20, "kind": "variable", "name": "Tee", "sku": "TEE" },
            { "id": 22, "kind": "variation", "parent_id": 20, "name": "Tee - Blue" },
            { "id": 21, "kind": "variation", "parent_id": 20, "name": "Tee - Red" },
            { "id": 10, "kind": "simple", "name": "Widget", "sku": "SKU-1" }
        ],
        "categories": [ { "term_id": 4, "term_taxonomy_id": 9, "name": "Shoes" } ]
    }"#;

    #[tokio::test]
    async fn children_are_ordered_by_id() {
        let catalog = SnapshotCatalog::from_json(DOC).unwrap();
        assert_eq!(catalog.children(20).await.unwrap(), vec![21, 22]);
        assert!(catalog.children(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookups_and_keys() {
        let catalog = SnapshotCatalog::from_json(DOC).unwrap();
        let widget = catalog.product(10).await.unwrap().unwrap();
        assert_eq!(catalog.product_key(&widget), "SKU-1_10");

        let shoes = catalog.category(4).await.unwrap().unwrap();
        assert_eq!(catalog.category_key(&shoes), "wc_category_9");

        assert!(catalog.product(99).await.unwrap().is_none());
        assert!(catalog.category(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn integration_settings() {
        let catalog = SnapshotCatalog::from_json(DOC).unwrap();
        let integration = catalog.integration().await.unwrap();
        assert!(integration.configured);
        assert_eq!(integration.catalog_id, "123");
    }

    #[test]
    fn malformed_document_is_a_decode_error() {
        assert_matches!(
            SnapshotCatalog::from_json("{ not json"),
            Err(StoreError::Decode(_))
        );
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let result = SnapshotCatalog::from_path("/nonexistent/catalog.json").await;
        assert_matches!(result, Err(StoreError::Io(_)));
    }
}
