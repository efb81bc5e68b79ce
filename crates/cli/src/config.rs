use std::path::PathBuf;
use std::time::Duration;

use catsync_graph::api::{DEFAULT_BASE_URL, DEFAULT_VERSION};

const DEFAULT_TABLE_PREFIX: &str = "wp_";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where local catalog records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    Snapshot(PathBuf),
    Database { url: String, table_prefix: String },
}

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Graph API token; the store's integration settings are consulted
    /// when unset.
    pub access_token: Option<String>,
    /// Overrides the catalog id recorded in the store.
    pub catalog_id: Option<String>,
    pub graph_url: String,
    pub graph_version: String,
    pub request_timeout: Duration,
    /// `None` when neither a snapshot nor a database is configured.
    pub store: Option<StoreSource>,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                      |
    /// |--------------------------------|------------------------------|
    /// | `CATSYNC_ACCESS_TOKEN`         | (store setting)              |
    /// | `CATSYNC_CATALOG_ID`           | (store setting)              |
    /// | `CATSYNC_GRAPH_URL`            | `https://graph.facebook.com` |
    /// | `CATSYNC_GRAPH_VERSION`        | `v21.0`                      |
    /// | `CATSYNC_REQUEST_TIMEOUT_SECS` | `30`                         |
    /// | `CATSYNC_SNAPSHOT`             | none                         |
    /// | `DATABASE_URL`                 | none                         |
    /// | `WP_TABLE_PREFIX`              | `wp_`                        |
    ///
    /// A snapshot takes precedence over `DATABASE_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let request_timeout_secs = match var("CATSYNC_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "CATSYNC_REQUEST_TIMEOUT_SECS is not a number, using default");
                DEFAULT_REQUEST_TIMEOUT_SECS
            }),
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let store = match (var("CATSYNC_SNAPSHOT"), var("DATABASE_URL")) {
            (Some(path), _) => Some(StoreSource::Snapshot(PathBuf::from(path))),
            (None, Some(url)) => Some(StoreSource::Database {
                url,
                table_prefix: var("WP_TABLE_PREFIX").unwrap_or_else(|| DEFAULT_TABLE_PREFIX.into()),
            }),
            (None, None) => None,
        };

        Self {
            access_token: var("CATSYNC_ACCESS_TOKEN"),
            catalog_id: var("CATSYNC_CATALOG_ID"),
            graph_url: var("CATSYNC_GRAPH_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            graph_version: var("CATSYNC_GRAPH_VERSION").unwrap_or_else(|| DEFAULT_VERSION.into()),
            request_timeout: Duration::from_secs(request_timeout_secs),
            store,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> CliConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]);
        assert_eq!(config.graph_url, "https://graph.facebook.com");
        assert_eq!(config.graph_version, "v21.0");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.access_token, None);
        assert_eq!(config.store, None);
    }

    #[test]
    fn snapshot_wins_over_database() {
        let config = load(&[
            ("CATSYNC_SNAPSHOT", "/tmp/shop.json"),
            ("DATABASE_URL", "mysql://localhost/shop"),
        ]);
        assert_eq!(
            config.store,
            Some(StoreSource::Snapshot(PathBuf::from("/tmp/shop.json")))
        );
    }

    #[test]
    fn database_uses_table_prefix() {
        let config = load(&[
            ("DATABASE_URL", "mysql://localhost/shop"),
            ("WP_TABLE_PREFIX", "shop_"),
        ]);
        assert_eq!(
            config.store,
            Some(StoreSource::Database {
                url: "mysql://localhost/shop".into(),
                table_prefix: "shop_".into(),
            })
        );
    }

    #[test]
    fn blank_and_invalid_values_fall_back() {
        let config = load(&[
            ("CATSYNC_ACCESS_TOKEN", "  "),
            ("CATSYNC_REQUEST_TIMEOUT_SECS", "soon"),
        ]);
        assert_eq!(config.access_token, None);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
