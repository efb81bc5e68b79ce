//! Command-line adapter: parses arguments, wires the local store and the
//! Graph API client into a [`Validator`] and runs one validation.

pub mod args;
pub mod config;

use std::sync::Arc;

use anyhow::Context;

use catsync_core::error::CoreError;
use catsync_core::result::{ResultBuilder, Subject};
use catsync_graph::api::GraphApi;
use catsync_store::snapshot::SnapshotCatalog;
use catsync_store::woo::WooCatalog;
use catsync_store::LocalCatalog;
use catsync_validator::{Stage, Target, ValidationRequest, ValidationResult, Validator, ValidatorConfig};

use crate::config::{CliConfig, StoreSource};

/// Run one validation.  Setup problems (no store, unreadable snapshot,
/// unreachable database) come back as a failed verdict.
pub async fn run(config: &CliConfig, request: &ValidationRequest) -> ValidationResult {
    match build_validator(config).await {
        Ok(validator) => validator.validate(request).await,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Validator setup failed");
            setup_failure(request, &e)
        }
    }
}

async fn build_validator(config: &CliConfig) -> anyhow::Result<Validator> {
    let local = open_store(config).await?;

    let access_token = match &config.access_token {
        Some(token) => Some(token.clone()),
        None => local
            .integration()
            .await
            .context("reading integration settings")?
            .access_token,
    };

    let remote = GraphApi::new(
        &config.graph_url,
        &config.graph_version,
        access_token.clone().unwrap_or_default(),
        config.request_timeout,
    )
    .context("building the Graph API client")?;
    tracing::info!(
        url = %config.graph_url,
        version = %config.graph_version,
        "Graph API client ready"
    );

    Ok(Validator::new(
        local,
        Arc::new(remote),
        ValidatorConfig {
            catalog_id: config.catalog_id.clone(),
            access_token,
            ..Default::default()
        },
    ))
}

async fn open_store(config: &CliConfig) -> anyhow::Result<Arc<dyn LocalCatalog>> {
    match &config.store {
        Some(StoreSource::Snapshot(path)) => {
            let catalog = SnapshotCatalog::from_path(path)
                .await
                .with_context(|| format!("loading snapshot {}", path.display()))?;
            Ok(Arc::new(catalog))
        }
        Some(StoreSource::Database { url, table_prefix }) => {
            let catalog = WooCatalog::connect(url, table_prefix.as_str())
                .await
                .context("connecting to the store database")?;
            tracing::info!(prefix = %table_prefix, "Store database connected");
            Ok(Arc::new(catalog))
        }
        None => anyhow::bail!("no local store: set CATSYNC_SNAPSHOT or DATABASE_URL"),
    }
}

fn setup_failure(request: &ValidationRequest, err: &anyhow::Error) -> ValidationResult {
    let subject = match request.target {
        Target::Product(id) => Subject::product(id),
        Target::Category(id) => Subject::category(id),
    };
    let mut builder = ResultBuilder::new(subject);
    builder.debug(format!("stage: {}", Stage::Initializing));
    builder.fail(&CoreError::Configuration(format!("{err:#}")));
    builder.debug(format!("stage: {}", Stage::Failed));
    builder.build()
}
