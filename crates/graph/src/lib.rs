//! Remote catalog access.
//!
//! [`RemoteCatalog`] is the single raw query the validator depends on;
//! [`api::GraphApi`] implements it over HTTP with [`reqwest`].
//! [`client::RemoteCatalogClient`] wraps any implementation with bounded
//! retries, exponential backoff and response parsing, and never returns
//! an error: remote trouble degrades to "not found".

pub mod api;
pub mod backoff;
pub mod client;
pub mod error;
pub mod wire;

use async_trait::async_trait;

pub use backoff::Backoff;
pub use client::{Lookup, RemoteCatalogClient, SetMatch};
pub use error::GraphApiError;

/// Which catalog edge a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// `/{catalog_id}/products`, filtered by retailer id.
    Products,
    /// `/{catalog_id}/product_sets`, returned unfiltered.
    ProductSets,
}

/// One lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub kind: QueryKind,
    pub catalog_id: String,
    pub retailer_id: String,
    pub fields: Vec<String>,
}

/// A single remote lookup.  Returns the raw response object, which
/// carries a `data` array.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    async fn query(&self, query: &CatalogQuery) -> Result<serde_json::Value, GraphApiError>;
}
