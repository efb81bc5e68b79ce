//! HTTP client for the Graph API catalog endpoints.
//!
//! Wraps `GET /{version}/{catalog_id}/products` and
//! `GET /{version}/{catalog_id}/product_sets` using [`reqwest`].  Only
//! reads; the validator never writes to the remote catalog.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GraphApiError;
use crate::{CatalogQuery, QueryKind, RemoteCatalog};

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_VERSION: &str = "v21.0";

/// Page size for the unfiltered product set listing.
const SET_PAGE_LIMIT: &str = "250";

/// HTTP client for one catalog owner's access token.
pub struct GraphApi {
    client: reqwest::Client,
    base_url: String,
    version: String,
    access_token: String,
}

impl GraphApi {
    /// Create a client with a per-request `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        version: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GraphApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, version, access_token))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        version: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            version: version.into(),
            access_token: access_token.into(),
        }
    }

    fn endpoint(&self, query: &CatalogQuery) -> String {
        let edge = match query.kind {
            QueryKind::Products => "products",
            QueryKind::ProductSets => "product_sets",
        };
        format!(
            "{}/{}/{}/{}",
            self.base_url, self.version, query.catalog_id, edge
        )
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, returning the
    /// status and body text as [`GraphApiError::ApiError`] otherwise.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GraphApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GraphApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// `{"retailer_id":{"eq":"<key>"}}`
fn retailer_filter(retailer_id: &str) -> String {
    serde_json::json!({ "retailer_id": { "eq": retailer_id } }).to_string()
}

#[async_trait]
impl RemoteCatalog for GraphApi {
    async fn query(&self, query: &CatalogQuery) -> Result<serde_json::Value, GraphApiError> {
        let url = self.endpoint(query);
        let fields = query.fields.join(",");

        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("fields", fields.as_str())]);

        request = match query.kind {
            QueryKind::Products => {
                request.query(&[("filter", retailer_filter(&query.retailer_id).as_str())])
            }
            QueryKind::ProductSets => request.query(&[("limit", SET_PAGE_LIMIT)]),
        };

        tracing::debug!(url = %url, retailer_id = %query.retailer_id, "Querying remote catalog");

        let response = Self::ensure_success(request.send().await?).await?;
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| GraphApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> GraphApi {
        GraphApi::new(
            "https://graph.example.test/",
            DEFAULT_VERSION,
            "token",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn query(kind: QueryKind) -> CatalogQuery {
        CatalogQuery {
            kind,
            catalog_id: "123".into(),
            retailer_id: "SKU-1_10".into(),
            fields: vec!["id".into()],
        }
    }

    #[test]
    fn endpoints_per_kind() {
        let api = api();
        assert_eq!(
            api.endpoint(&query(QueryKind::Products)),
            "https://graph.example.test/v21.0/123/products"
        );
        assert_eq!(
            api.endpoint(&query(QueryKind::ProductSets)),
            "https://graph.example.test/v21.0/123/product_sets"
        );
    }

    #[test]
    fn filter_is_retailer_id_equality() {
        assert_eq!(
            retailer_filter("SKU-1_10"),
            r#"{"retailer_id":{"eq":"SKU-1_10"}}"#
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let api = GraphApi::new(
            "http://127.0.0.1:9",
            DEFAULT_VERSION,
            "token",
            Duration::from_millis(200),
        )
        .unwrap();
        let result = api.query(&query(QueryKind::Products)).await;
        assert!(matches!(result, Err(GraphApiError::Request(_))));
    }
}
