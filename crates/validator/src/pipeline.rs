//! The validation pipeline.
//!
//! One [`Validator`] serves any number of concurrent calls; each call
//! owns its [`ResultBuilder`] and shares nothing mutable with others.

use std::sync::Arc;
use std::time::Duration;

use catsync_core::compare::{compare_fields, FieldMapping, CATEGORY_FIELDS, PRODUCT_FIELDS};
use catsync_core::entity::{CategoryEntity, LocalEntity, ProductKind, RemoteEntity, RemoteSet};
use catsync_core::error::CoreError;
use catsync_core::resolve::{resolve_status, GroupRule, SyncStatus};
use catsync_core::result::{DebugTrail, ResultBuilder, Subject, ValidationResult, VariationSummary};
use catsync_core::types::EntityId;
use catsync_graph::{Backoff, Lookup, RemoteCatalog, RemoteCatalogClient, SetMatch};
use catsync_store::LocalCatalog;

use crate::extract::{extract_category, extract_product, ProductExtraction};
use crate::stage::Stage;

pub const DEFAULT_WAIT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RETRIES: u32 = 6;

/// Settings that override what the local store records.
#[derive(Debug, Clone, Default)]
pub struct ValidatorConfig {
    /// Remote catalog id; falls back to the store's integration settings.
    pub catalog_id: Option<String>,
    /// Access token; falls back to the store's integration settings.
    pub access_token: Option<String>,
    pub backoff: Backoff,
}

/// What to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Product(EntityId),
    Category(EntityId),
}

/// One validation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    pub target: Target,
    /// Slept once before the first remote lookup, to give the remote
    /// catalog time to ingest a fresh sync.
    pub wait: Duration,
    /// Attempts per remote lookup (clamped to at least one).
    pub max_retries: u32,
}

impl ValidationRequest {
    pub fn product(id: EntityId) -> Self {
        Self::new(Target::Product(id))
    }

    pub fn category(id: EntityId) -> Self {
        Self::new(Target::Category(id))
    }

    fn new(target: Target) -> Self {
        Self {
            target,
            wait: DEFAULT_WAIT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Reconciles local catalog entities against the remote catalog.
pub struct Validator {
    local: Arc<dyn LocalCatalog>,
    remote: Arc<dyn RemoteCatalog>,
    config: ValidatorConfig,
}

/// Per-call working state.
struct Run {
    builder: ResultBuilder,
    stage: Stage,
}

impl Run {
    fn new(subject: Subject) -> Self {
        let mut run = Self {
            builder: ResultBuilder::new(subject),
            stage: Stage::Initializing,
        };
        run.builder.debug(format!("stage: {}", Stage::Initializing));
        run
    }

    fn enter(&mut self, stage: Stage) {
        debug_assert!(!self.stage.is_terminal(), "transition out of {}", self.stage);
        tracing::debug!(from = %self.stage, to = %stage, "Validation stage change");
        self.stage = stage;
        self.builder.debug(format!("stage: {stage}"));
    }

    fn trail(&mut self) -> &mut DebugTrail {
        self.builder.trail()
    }
}

impl Validator {
    pub fn new(
        local: Arc<dyn LocalCatalog>,
        remote: Arc<dyn RemoteCatalog>,
        config: ValidatorConfig,
    ) -> Self {
        Self {
            local,
            remote,
            config,
        }
    }

    /// Run one validation.  Always returns a verdict; fatal problems are
    /// reported through its `error` field.
    pub async fn validate(&self, request: &ValidationRequest) -> ValidationResult {
        let subject = match request.target {
            Target::Product(id) => Subject::product(id),
            Target::Category(id) => Subject::category(id),
        };
        let mut run = Run::new(subject);

        let outcome = match request.target {
            Target::Product(id) => self.run_product(id, request, &mut run).await,
            Target::Category(id) => self.run_category(id, request, &mut run).await,
        };

        match outcome {
            Ok(()) => run.enter(Stage::Done),
            Err(e) => {
                tracing::error!(
                    subject = ?request.target,
                    stage = %run.stage,
                    kind = e.kind(),
                    error = %e,
                    "Validation failed"
                );
                run.builder.fail(&e);
                run.enter(Stage::Failed);
            }
        }

        let result = run.builder.build();
        tracing::info!(
            subject = ?request.target,
            sync_status = %result.sync_status(),
            success = result.success(),
            mismatches = result.mismatches().len(),
            "Validation finished"
        );
        result
    }

    pub async fn validate_product(&self, id: EntityId) -> ValidationResult {
        self.validate(&ValidationRequest::product(id)).await
    }

    pub async fn validate_category(&self, id: EntityId) -> ValidationResult {
        self.validate(&ValidationRequest::category(id)).await
    }

    async fn run_product(
        &self,
        id: EntityId,
        request: &ValidationRequest,
        run: &mut Run,
    ) -> Result<(), CoreError> {
        let catalog_id = self.catalog_id(run.trail()).await?;

        run.enter(Stage::ExtractingLocal);
        let ProductExtraction {
            kind,
            retailer_id,
            entities,
            skipped,
        } = extract_product(self.local.as_ref(), id, run.trail()).await?;
        run.builder.product_type(kind);
        run.builder.retailer_id(retailer_id.as_str());

        self.initial_wait(request.wait, run.trail()).await;

        run.enter(Stage::FetchingRemote);
        let client = self.client(request, run.trail());
        let mut remotes: Vec<Option<RemoteEntity>> = Vec::with_capacity(entities.len());
        for entity in &entities {
            let lookup = client
                .fetch_product(&catalog_id, &entity.retailer_id, run.trail())
                .await;
            if let Lookup::NotFound {
                last_failure: Some(reason),
                ..
            } = &lookup
            {
                run.builder.debug(format!(
                    "entity {} unmatched after {} attempts, last failure: {reason}",
                    entity.id,
                    lookup.attempts()
                ));
            }
            remotes.push(lookup.into_found());
        }

        run.enter(Stage::ResolvingStatus);
        let rule = match kind {
            ProductKind::Variable => GroupRule::Required,
            ProductKind::Simple | ProductKind::Variation => GroupRule::Optional,
        };
        let resolution = resolve_status(&entities, &remotes, rule);
        for note in &resolution.notes {
            run.builder.debug(note.as_str());
        }
        run.builder.sync_status(resolution.status);
        if resolution.status == SyncStatus::Synced {
            let remote_id = match kind {
                ProductKind::Variable => resolution.group_id.clone(),
                ProductKind::Simple | ProductKind::Variation => remotes
                    .first()
                    .and_then(Option::as_ref)
                    .map(|remote| remote.id.clone()),
            };
            run.builder.remote_id(remote_id);
        }

        run.enter(Stage::ComparingFields);
        let mut summary = VariationSummary::default();
        for ((entity, remote), found) in entities.iter().zip(&remotes).zip(&resolution.found) {
            let remote = match (remote.as_ref(), *found) {
                (Some(remote), true) => remote,
                _ => {
                    summary.record(entity.id, false);
                    continue;
                }
            };
            let clean = compare_into(&mut run.builder, entity.id, entity, remote, PRODUCT_FIELDS);
            note_memberships(run.trail(), entity, remote);
            summary.record(entity.id, clean);
        }

        if kind == ProductKind::Variable {
            for child_id in &skipped {
                summary.record(*child_id, false);
            }
            run.builder.debug(format!(
                "variations: {} total, {} successful, {} failed",
                summary.total_variations, summary.successful_variations, summary.failed_variations
            ));
            run.builder.summary(summary);
        }

        run.builder.raw_data(serde_json::json!({
            "local": entities,
            "remote": remotes,
        }));
        Ok(())
    }

    async fn run_category(
        &self,
        id: EntityId,
        request: &ValidationRequest,
        run: &mut Run,
    ) -> Result<(), CoreError> {
        let catalog_id = self.catalog_id(run.trail()).await?;

        run.enter(Stage::ExtractingLocal);
        let category = extract_category(self.local.as_ref(), id, run.trail()).await?;
        run.builder.term_taxonomy_id(category.term_taxonomy_id);
        run.builder.retailer_id(category.retailer_id.as_str());

        self.initial_wait(request.wait, run.trail()).await;

        run.enter(Stage::FetchingRemote);
        let lookup = self
            .client(request, run.trail())
            .fetch_set(&catalog_id, &category.retailer_id, &category.name, run.trail())
            .await;
        let remote: Option<RemoteSet> = match lookup.into_found() {
            Some((set, SetMatch::ByKey)) => {
                run.builder.debug(format!(
                    "set {} matched by key only; its name differs from \"{}\"",
                    set.id, category.name
                ));
                Some(set)
            }
            Some((set, SetMatch::ByName)) => Some(set),
            None => None,
        };

        run.enter(Stage::ResolvingStatus);
        let locals: [CategoryEntity; 1] = [category];
        let remotes = [remote];
        let resolution = resolve_status(&locals, &remotes, GroupRule::Optional);
        for note in &resolution.notes {
            run.builder.debug(note.as_str());
        }
        run.builder.sync_status(resolution.status);

        run.enter(Stage::ComparingFields);
        let [category] = &locals;
        if let (Some(set), Some(true)) = (&remotes[0], resolution.found.first().copied()) {
            if resolution.status == SyncStatus::Synced {
                run.builder.remote_id(Some(set.id.clone()));
            }
            compare_into(&mut run.builder, category.id, category, set, CATEGORY_FIELDS);
        }

        run.builder.raw_data(serde_json::json!({
            "local": category,
            "remote": &remotes[0],
        }));
        Ok(())
    }

    /// Catalog id to query, after checking the integration is usable.
    async fn catalog_id(&self, trail: &mut DebugTrail) -> Result<String, CoreError> {
        let configured_id = non_empty(self.config.catalog_id.as_deref());
        let configured_token = non_empty(self.config.access_token.as_deref());
        if let (Some(catalog_id), Some(_)) = (configured_id, configured_token) {
            trail.push(format!("using configured catalog {catalog_id}"));
            return Ok(catalog_id.to_string());
        }

        let stored = self
            .local
            .integration()
            .await
            .map_err(|e| CoreError::Configuration(format!("integration settings unreadable: {e}")))?;
        if !stored.configured {
            return Err(CoreError::Configuration(
                "integration not configured".to_string(),
            ));
        }

        let catalog_id = configured_id
            .or_else(|| non_empty(Some(stored.catalog_id.as_str())))
            .ok_or_else(|| CoreError::Configuration("no catalog id".to_string()))?;
        if configured_token.is_none() && non_empty(stored.access_token.as_deref()).is_none() {
            return Err(CoreError::Configuration("no access token".to_string()));
        }

        trail.push(format!("using catalog {catalog_id}"));
        Ok(catalog_id.to_string())
    }

    async fn initial_wait(&self, wait: Duration, trail: &mut DebugTrail) {
        if wait.is_zero() {
            return;
        }
        trail.push(format!(
            "waiting {}s before querying the remote catalog",
            wait.as_secs_f64()
        ));
        tokio::time::sleep(wait).await;
    }

    fn client(&self, request: &ValidationRequest, trail: &mut DebugTrail) -> RemoteCatalogClient {
        let client = RemoteCatalogClient::new(
            Arc::clone(&self.remote),
            self.config.backoff.clone(),
            request.max_retries,
        );
        let attempts = client.max_attempts();
        trail.push(format!(
            "up to {attempts} attempts per lookup, at most {}s of backoff each",
            self.config.backoff.worst_case(attempts).as_secs_f64()
        ));
        client
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Diff one pair into the builder.  Returns `true` when nothing differed.
fn compare_into<L, R>(
    builder: &mut ResultBuilder,
    entity_id: EntityId,
    local: &L,
    remote: &R,
    mapping: &[FieldMapping],
) -> bool
where
    L: catsync_core::entity::FieldSource,
    R: catsync_core::entity::FieldSource,
{
    let comparison = compare_fields(entity_id, local, remote, mapping);
    if !comparison.omitted.is_empty() {
        builder.debug(format!(
            "entity {entity_id}: remote omitted {}; not compared",
            comparison.omitted.join(", ")
        ));
    }
    builder.debug(format!(
        "entity {entity_id}: {} fields compared, {} mismatched",
        comparison.compared,
        comparison.mismatches.len()
    ));
    let clean = comparison.mismatches.is_empty();
    builder.mismatches(comparison.mismatches);
    clean
}

/// Note whether the remote product sits in the sets of its local
/// categories.  Informational only.
fn note_memberships(trail: &mut DebugTrail, local: &LocalEntity, remote: &RemoteEntity) {
    for key in &local.category_keys {
        let member = remote
            .memberships
            .iter()
            .find(|m| m.retailer_id.as_deref() == Some(key.as_str()));
        match member {
            Some(m) => trail.push(format!("entity {} is in set {} ({key})", local.id, m.set_id)),
            None => trail.push(format!("entity {} is not in any set keyed {key}", local.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let request = ValidationRequest::product(7);
        assert_eq!(request.target, Target::Product(7));
        assert_eq!(request.wait, Duration::from_secs(10));
        assert_eq!(request.max_retries, 6);

        let request = ValidationRequest::category(3)
            .with_wait(Duration::ZERO)
            .with_max_retries(2);
        assert_eq!(request.target, Target::Category(3));
        assert!(request.wait.is_zero());
        assert_eq!(request.max_retries, 2);
    }

    #[test]
    fn blank_values_are_missing() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" 12 ")), Some("12"));
        assert_eq!(non_empty(None), None);
    }
}
