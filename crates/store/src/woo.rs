//! WooCommerce MySQL store.
//!
//! Reads products from `{prefix}posts` / `{prefix}postmeta`, categories
//! from `{prefix}terms` / `{prefix}term_taxonomy`, and the remote
//! integration settings from `{prefix}options`.  Every query is a plain
//! `SELECT`; ids are cast to signed so they decode as `i64`.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::Row;

use catsync_core::entity::ProductKind;
use catsync_core::types::EntityId;

use crate::error::StoreError;
use crate::model::{IntegrationConfig, StockStatus, StoredCategory, StoredProduct};
use crate::LocalCatalog;

const MAX_CONNECTIONS: u32 = 4;

const OPTION_CATALOG_ID: &str = "wc_facebook_product_catalog_id";
const OPTION_ACCESS_TOKEN: &str = "wc_facebook_access_token";
const OPTION_CURRENCY: &str = "woocommerce_currency";

const META_SKU: &str = "_sku";
const META_PRICE: &str = "_price";
const META_STOCK_STATUS: &str = "_stock_status";
const META_THUMBNAIL: &str = "_thumbnail_id";
const META_BRAND: &str = "fb_brand";
const META_CONDITION: &str = "fb_product_condition";
const META_DESCRIPTION: &str = "fb_product_description";
const ATTRIBUTE_META_PREFIX: &str = "attribute_";

/// Read-only handle on a WooCommerce database.
pub struct WooCatalog {
    pool: MySqlPool,
    prefix: String,
}

impl WooCatalog {
    /// Connect to `database_url` using table prefix `prefix` (usually `wp_`).
    pub async fn connect(database_url: &str, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        Ok(Self::with_pool(pool, prefix))
    }

    pub fn with_pool(pool: MySqlPool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }

    fn table(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    async fn option(&self, name: &str) -> Result<Option<String>, StoreError> {
        let sql = format!(
            "SELECT option_value FROM {} WHERE option_name = ? LIMIT 1",
            self.table("options")
        );
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(row.try_get::<Option<String>, _>("option_value")?),
            None => Ok(None),
        }
    }

    async fn meta(&self, post_id: EntityId) -> Result<HashMap<String, String>, StoreError> {
        let sql = format!(
            "SELECT meta_key, meta_value FROM {} WHERE post_id = ?",
            self.table("postmeta")
        );
        let rows = sqlx::query(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;

        let mut meta = HashMap::with_capacity(rows.len());
        for row in rows {
            let key: Option<String> = row.try_get("meta_key")?;
            let value: Option<String> = row.try_get("meta_value")?;
            if let (Some(key), Some(value)) = (key, value) {
                meta.insert(key, value);
            }
        }
        Ok(meta)
    }

    /// Term taxonomy ids of `post_id` within `taxonomy`, paired with slugs.
    async fn terms(
        &self,
        post_id: EntityId,
        taxonomy: &str,
    ) -> Result<Vec<(EntityId, String)>, StoreError> {
        let sql = format!(
            "SELECT CAST(tt.term_taxonomy_id AS SIGNED) AS term_taxonomy_id, t.slug \
             FROM {rel} tr \
             JOIN {tax} tt ON tt.term_taxonomy_id = tr.term_taxonomy_id \
             JOIN {terms} t ON t.term_id = tt.term_id \
             WHERE tr.object_id = ? AND tt.taxonomy = ? \
             ORDER BY tt.term_taxonomy_id",
            rel = self.table("term_relationships"),
            tax = self.table("term_taxonomy"),
            terms = self.table("terms"),
        );
        let rows = sqlx::query(&sql)
            .bind(post_id)
            .bind(taxonomy)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                Ok((
                    row.try_get::<i64, _>("term_taxonomy_id")?,
                    row.try_get::<String, _>("slug")?,
                ))
            })
            .collect()
    }

    async fn attachment_url(&self, attachment_id: &str) -> Result<Option<String>, StoreError> {
        let Ok(attachment_id) = attachment_id.trim().parse::<EntityId>() else {
            return Ok(None);
        };
        let sql = format!(
            "SELECT guid FROM {} WHERE ID = ? AND post_type = 'attachment'",
            self.table("posts")
        );
        let row = sqlx::query(&sql)
            .bind(attachment_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(row
                .try_get::<Option<String>, _>("guid")?
                .filter(|g| !g.is_empty())),
            None => Ok(None),
        }
    }
}

/// `attribute_pa_color` -> `color`, `attribute_size` -> `size`.
fn attribute_name(meta_key: &str) -> Option<&str> {
    let name = meta_key.strip_prefix(ATTRIBUTE_META_PREFIX)?;
    Some(name.strip_prefix("pa_").unwrap_or(name))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

#[async_trait]
impl LocalCatalog for WooCatalog {
    async fn product(&self, id: EntityId) -> Result<Option<StoredProduct>, StoreError> {
        let sql = format!(
            "SELECT CAST(ID AS SIGNED) AS id, CAST(post_parent AS SIGNED) AS parent, \
                    post_type, post_title, post_content, post_excerpt \
             FROM {} \
             WHERE ID = ? AND post_type IN ('product', 'product_variation') \
               AND post_status NOT IN ('trash', 'auto-draft')",
            self.table("posts")
        );
        let Some(row) = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let post_type: String = row.try_get("post_type")?;
        let parent: i64 = row.try_get("parent")?;
        let meta = self.meta(id).await?;

        let kind = if post_type == "product_variation" {
            ProductKind::Variation
        } else {
            let types = self.terms(id, "product_type").await?;
            if types.iter().any(|(_, slug)| slug == "variable") {
                ProductKind::Variable
            } else {
                ProductKind::Simple
            }
        };
        if kind == ProductKind::Variation && parent == 0 {
            return Err(StoreError::Corrupt {
                id,
                reason: "variation without parent".into(),
            });
        }

        let category_ids = if kind == ProductKind::Variation {
            Vec::new()
        } else {
            self.terms(id, "product_cat")
                .await?
                .into_iter()
                .map(|(ttid, _)| ttid)
                .collect()
        };

        let image_url = match meta.get(META_THUMBNAIL) {
            Some(thumbnail) => self.attachment_url(thumbnail).await?,
            None => None,
        };

        let attributes: BTreeMap<String, String> = meta
            .iter()
            .filter_map(|(k, v)| attribute_name(k).map(|name| (name.to_string(), v.clone())))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        let description = non_empty(meta.get(META_DESCRIPTION))
            .unwrap_or(row.try_get::<String, _>("post_content")?);

        Ok(Some(StoredProduct {
            id,
            kind,
            parent_id: (parent > 0).then_some(parent),
            sku: meta.get(META_SKU).cloned().unwrap_or_default(),
            name: row.try_get("post_title")?,
            price: non_empty(meta.get(META_PRICE)),
            currency: self.option(OPTION_CURRENCY).await?.unwrap_or_default(),
            description,
            short_description: row.try_get("post_excerpt")?,
            stock_status: meta
                .get(META_STOCK_STATUS)
                .map(|s| StockStatus::from_slug(s))
                .unwrap_or_default(),
            condition: non_empty(meta.get(META_CONDITION)),
            brand: non_empty(meta.get(META_BRAND)),
            attributes,
            image_url,
            category_ids,
        }))
    }

    async fn children(&self, parent_id: EntityId) -> Result<Vec<EntityId>, StoreError> {
        let sql = format!(
            "SELECT CAST(ID AS SIGNED) AS id FROM {} \
             WHERE post_parent = ? AND post_type = 'product_variation' \
               AND post_status IN ('publish', 'private') \
             ORDER BY menu_order, ID",
            self.table("posts")
        );
        let rows = sqlx::query(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| -> Result<EntityId, StoreError> { Ok(row.try_get("id")?) })
            .collect()
    }

    async fn category(&self, term_id: EntityId) -> Result<Option<StoredCategory>, StoreError> {
        let sql = format!(
            "SELECT CAST(t.term_id AS SIGNED) AS term_id, \
                    CAST(tt.term_taxonomy_id AS SIGNED) AS term_taxonomy_id, \
                    CAST(tt.parent AS SIGNED) AS parent, t.name, t.slug \
             FROM {terms} t \
             JOIN {tax} tt ON tt.term_id = t.term_id \
             WHERE t.term_id = ? AND tt.taxonomy = 'product_cat'",
            terms = self.table("terms"),
            tax = self.table("term_taxonomy"),
        );
        let Some(row) = sqlx::query(&sql)
            .bind(term_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let parent: i64 = row.try_get("parent")?;
        Ok(Some(StoredCategory {
            term_id: row.try_get("term_id")?,
            term_taxonomy_id: row.try_get("term_taxonomy_id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            parent: (parent > 0).then_some(parent),
        }))
    }

    async fn integration(&self) -> Result<IntegrationConfig, StoreError> {
        let catalog_id = self
            .option(OPTION_CATALOG_ID)
            .await?
            .unwrap_or_default()
            .trim()
            .to_string();
        let access_token = self
            .option(OPTION_ACCESS_TOKEN)
            .await?
            .filter(|t| !t.trim().is_empty());

        Ok(IntegrationConfig {
            configured: !catalog_id.is_empty(),
            catalog_id,
            access_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_names_drop_prefixes() {
        assert_eq!(attribute_name("attribute_pa_color"), Some("color"));
        assert_eq!(attribute_name("attribute_size"), Some("size"));
        assert_eq!(attribute_name("_price"), None);
    }

    #[test]
    fn blank_meta_is_absent() {
        assert_eq!(non_empty(Some(&"  ".to_string())), None);
        assert_eq!(non_empty(Some(&" Acme ".to_string())).as_deref(), Some("Acme"));
        assert_eq!(non_empty(None), None);
    }
}
