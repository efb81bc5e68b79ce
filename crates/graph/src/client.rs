//! Retrying lookup client.
//!
//! Each lookup runs up to `max_attempts` single requests, strictly one
//! after another.  A transport error, a non-2xx status, a malformed
//! body and an empty result all count as a failed attempt; before retry
//! `k` the client sleeps for [`Backoff::delay`]`(k)`.  Nothing here
//! propagates an error: exhaustion yields [`Lookup::NotFound`].

use std::future::Future;
use std::sync::Arc;

use catsync_core::entity::{RemoteEntity, RemoteSet};
use catsync_core::normalize::{normalize, FieldKind};
use catsync_core::result::DebugTrail;

use crate::backoff::Backoff;
use crate::wire::{self, AttemptOutcome};
use crate::{CatalogQuery, QueryKind, RemoteCatalog};

/// Outcome of a retried lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found { record: T, attempts: u32 },
    NotFound {
        attempts: u32,
        /// Reason of the last transport-level failure, if any.
        last_failure: Option<String>,
    },
}

impl<T> Lookup<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Found { attempts, .. } | Self::NotFound { attempts, .. } => *attempts,
        }
    }

    pub fn into_found(self) -> Option<T> {
        match self {
            Self::Found { record, .. } => Some(record),
            Self::NotFound { .. } => None,
        }
    }
}

/// How a product set was picked out of an unfiltered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMatch {
    ByName,
    ByKey,
}

/// Pick the set mirroring a category out of `candidates`.
///
/// Preference order: a same-named set carrying the expected key, then any
/// set carrying the expected key (e.g. the category was renamed), then a
/// same-named set with some other key.  The last case never resolves as
/// synced, but keeps the closest candidate for the report.  Two
/// categories with the same name can still resolve to the same set.
pub fn select_set(
    candidates: &[RemoteSet],
    expected_name: &str,
    expected_key: &str,
) -> Option<(RemoteSet, SetMatch)> {
    let wanted = normalize(expected_name, FieldKind::Text);
    let has_key = |set: &RemoteSet| set.retailer_id.as_deref() == Some(expected_key);
    let has_name = |set: &RemoteSet| {
        set.name
            .as_deref()
            .is_some_and(|name| normalize(name, FieldKind::Text) == wanted)
    };

    if let Some(set) = candidates.iter().find(|set| has_name(*set) && has_key(*set)) {
        return Some((set.clone(), SetMatch::ByName));
    }
    if let Some(set) = candidates.iter().find(|set| has_key(*set)) {
        return Some((set.clone(), SetMatch::ByKey));
    }
    candidates
        .iter()
        .find(|set| has_name(*set))
        .map(|set| (set.clone(), SetMatch::ByName))
}

/// Remote catalog lookups with bounded retries.
#[derive(Clone)]
pub struct RemoteCatalogClient {
    remote: Arc<dyn RemoteCatalog>,
    backoff: Backoff,
    max_attempts: u32,
}

impl RemoteCatalogClient {
    /// `max_attempts` is clamped to at least one.
    pub fn new(remote: Arc<dyn RemoteCatalog>, backoff: Backoff, max_attempts: u32) -> Self {
        Self {
            remote,
            backoff,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Look up the product with external key `retailer_id`.
    pub async fn fetch_product(
        &self,
        catalog_id: &str,
        retailer_id: &str,
        trail: &mut DebugTrail,
    ) -> Lookup<RemoteEntity> {
        let query = CatalogQuery {
            kind: QueryKind::Products,
            catalog_id: catalog_id.to_string(),
            retailer_id: retailer_id.to_string(),
            fields: wire::PRODUCT_FIELDS.iter().map(|f| f.to_string()).collect(),
        };
        let label = format!("product {retailer_id}");
        let remote = &self.remote;
        let query = &query;

        self.with_retries(&label, trail, || async move {
            match remote.query(query).await {
                Ok(response) => wire::parse_product(&response),
                Err(e) => AttemptOutcome::TransportFailure(e.to_string()),
            }
        })
        .await
    }

    /// Look up the set mirroring the category `expected_name` /
    /// `retailer_id`.
    pub async fn fetch_set(
        &self,
        catalog_id: &str,
        retailer_id: &str,
        expected_name: &str,
        trail: &mut DebugTrail,
    ) -> Lookup<(RemoteSet, SetMatch)> {
        let query = CatalogQuery {
            kind: QueryKind::ProductSets,
            catalog_id: catalog_id.to_string(),
            retailer_id: retailer_id.to_string(),
            fields: wire::SET_FIELDS.iter().map(|f| f.to_string()).collect(),
        };
        let label = format!("product set {retailer_id}");
        let remote = &self.remote;
        let query = &query;

        self.with_retries(&label, trail, || async move {
            let response = match remote.query(query).await {
                Ok(response) => response,
                Err(e) => return AttemptOutcome::TransportFailure(e.to_string()),
            };
            match wire::parse_sets(&response) {
                Ok(sets) => match select_set(&sets, expected_name, retailer_id) {
                    Some(selected) => AttemptOutcome::Found(selected),
                    None => AttemptOutcome::NotFound,
                },
                Err(reason) => AttemptOutcome::TransportFailure(reason),
            }
        })
        .await
    }

    async fn with_retries<T, F, Fut>(
        &self,
        label: &str,
        trail: &mut DebugTrail,
        mut attempt_once: F,
    ) -> Lookup<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AttemptOutcome<T>>,
    {
        let mut last_failure = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let delay = self.backoff.delay(attempt - 1);
                trail.push(format!(
                    "{label}: waiting {:.1}s before attempt {attempt}/{}",
                    delay.as_secs_f64(),
                    self.max_attempts
                ));
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            match attempt_once().await {
                AttemptOutcome::Found(record) => {
                    trail.push(format!("{label}: found on attempt {attempt}"));
                    return Lookup::Found {
                        record,
                        attempts: attempt,
                    };
                }
                AttemptOutcome::NotFound => {
                    trail.push(format!(
                        "{label}: not found on attempt {attempt}/{}",
                        self.max_attempts
                    ));
                }
                AttemptOutcome::TransportFailure(reason) => {
                    tracing::warn!(label, attempt, error = %reason, "Remote lookup attempt failed");
                    trail.push(format!(
                        "{label}: attempt {attempt}/{} failed: {reason}",
                        self.max_attempts
                    ));
                    last_failure = Some(reason);
                }
            }
        }

        tracing::warn!(label, attempts = self.max_attempts, "Remote lookup exhausted retries");
        trail.push(format!(
            "{label}: no remote match after {} attempts",
            self.max_attempts
        ));
        Lookup::NotFound {
            attempts: self.max_attempts,
            last_failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::GraphApiError;

    /// Replays scripted responses, then repeats the last one.
    struct Scripted {
        responses: Mutex<Vec<Result<Value, u16>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(responses: Vec<Result<Value, u16>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl RemoteCatalog for Scripted {
        async fn query(&self, _query: &CatalogQuery) -> Result<Value, GraphApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            let next = if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses[0].clone()
            };
            next.map_err(|status| GraphApiError::ApiError {
                status,
                body: String::new(),
            })
        }
    }

    fn client(remote: Arc<Scripted>, attempts: u32) -> RemoteCatalogClient {
        RemoteCatalogClient::new(remote, Backoff::none(), attempts)
    }

    #[tokio::test]
    async fn found_after_one_retry() {
        let remote = Scripted::new(vec![
            Ok(json!({ "data": [] })),
            Ok(json!({ "data": [ { "id": "900", "retailer_id": "SKU-1" } ] })),
        ]);
        let mut trail = DebugTrail::default();
        let lookup = client(remote.clone(), 6)
            .fetch_product("cat", "SKU-1", &mut trail)
            .await;

        assert_matches!(lookup, Lookup::Found { attempts: 2, .. });
        assert_eq!(remote.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn never_found_uses_exactly_max_attempts() {
        let remote = Scripted::new(vec![Ok(json!({ "data": [] }))]);
        let mut trail = DebugTrail::default();
        let lookup = client(remote.clone(), 4)
            .fetch_product("cat", "SKU-1", &mut trail)
            .await;

        assert_matches!(
            lookup,
            Lookup::NotFound {
                attempts: 4,
                last_failure: None
            }
        );
        assert_eq!(remote.calls.load(Ordering::SeqCst), 4);
        assert!(trail.entries().last().unwrap().contains("after 4 attempts"));
    }

    #[tokio::test]
    async fn transport_failures_degrade_to_not_found() {
        let remote = Scripted::new(vec![Err(503)]);
        let mut trail = DebugTrail::default();
        let lookup = client(remote, 2).fetch_product("cat", "SKU-1", &mut trail).await;

        let reason = assert_matches!(lookup, Lookup::NotFound { last_failure: Some(r), .. } => r);
        assert!(reason.contains("503"));
    }

    #[tokio::test]
    async fn zero_attempts_still_looks_once() {
        let remote = Scripted::new(vec![Ok(json!({ "data": [] }))]);
        let mut trail = DebugTrail::default();
        let c = client(remote.clone(), 0);
        assert_eq!(c.max_attempts(), 1);
        c.fetch_product("cat", "SKU-1", &mut trail).await;
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exponential_waits_between_attempts() {
        let remote = Scripted::new(vec![Ok(json!({ "data": [] }))]);
        let c = RemoteCatalogClient::new(remote, Backoff::exponential(), 3);
        let mut trail = DebugTrail::default();

        let started = tokio::time::Instant::now();
        c.fetch_product("cat", "SKU-1", &mut trail).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= std::time::Duration::from_secs(6));
        assert!(elapsed < std::time::Duration::from_secs(7));
    }

    #[tokio::test]
    async fn set_lookup_filters_by_name() {
        let remote = Scripted::new(vec![Ok(json!({
            "data": [
                { "id": "50", "name": "Hats", "retailer_id": "wc_category_3" },
                { "id": "55", "name": "Shoes", "retailer_id": "wc_category_9" }
            ]
        }))]);
        let mut trail = DebugTrail::default();
        let lookup = client(remote, 1)
            .fetch_set("cat", "wc_category_9", "Shoes", &mut trail)
            .await;
        let (set, how) = lookup.into_found().unwrap();
        assert_eq!(set.id, "55");
        assert_eq!(how, SetMatch::ByName);
    }

    fn set(id: &str, name: &str, key: &str) -> RemoteSet {
        RemoteSet {
            id: id.into(),
            name: Some(name.into()),
            retailer_id: Some(key.into()),
        }
    }

    #[test]
    fn select_prefers_name_and_key_together() {
        let sets = [
            set("1", "Shoes", "wc_category_1"),
            set("2", "Shoes", "wc_category_9"),
        ];
        let (chosen, how) = select_set(&sets, "shoes", "wc_category_9").unwrap();
        assert_eq!(chosen.id, "2");
        assert_eq!(how, SetMatch::ByName);
    }

    #[test]
    fn select_falls_back_to_key_after_rename() {
        let sets = [set("2", "Old Shoes", "wc_category_9")];
        let (chosen, how) = select_set(&sets, "Footwear", "wc_category_9").unwrap();
        assert_eq!(chosen.id, "2");
        assert_eq!(how, SetMatch::ByKey);
    }

    #[test]
    fn select_prefers_key_over_foreign_same_named_set() {
        let sets = [
            set("70", "Shirts", "wc_category_12"),
            set("55", "Tops", "wc_category_9"),
        ];
        let (chosen, how) = select_set(&sets, "Shirts", "wc_category_9").unwrap();
        assert_eq!(chosen.id, "55");
        assert_eq!(how, SetMatch::ByKey);
    }

    #[test]
    fn select_keeps_name_only_match_as_last_resort() {
        let sets = [set("70", "Shirts", "wc_category_12")];
        let (chosen, how) = select_set(&sets, "Shirts", "wc_category_9").unwrap();
        assert_eq!(chosen.id, "70");
        assert_eq!(how, SetMatch::ByName);
    }

    #[test]
    fn select_ignores_unrelated_sets() {
        let sets = [set("3", "Hats", "wc_category_3")];
        assert!(select_set(&sets, "Shoes", "wc_category_9").is_none());
    }
}
