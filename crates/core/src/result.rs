//! The validation verdict and its JSON shape.
//!
//! [`ResultBuilder`] is the mutable working copy the pipeline fills in;
//! [`ResultBuilder::build`] freezes it into a [`ValidationResult`] whose
//! fields are read-only.  The serialized form is consumed by downstream
//! tooling, so key names and order are fixed:
//!
//! ```text
//! success, product_id | category_id, product_type | term_taxonomy_id,
//! sync_status, retailer_id, facebook_id | facebook_product_set_id,
//! mismatches, [summary], debug, error, raw_data
//! ```

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::compare::Mismatch;
use crate::entity::ProductKind;
use crate::error::CoreError;
use crate::resolve::SyncStatus;
use crate::types::{EntityId, RemoteId};

/// What was validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Product {
        product_id: EntityId,
        product_type: Option<ProductKind>,
    },
    Category {
        category_id: EntityId,
        term_taxonomy_id: Option<EntityId>,
    },
}

impl Subject {
    pub fn product(product_id: EntityId) -> Self {
        Self::Product {
            product_id,
            product_type: None,
        }
    }

    pub fn category(category_id: EntityId) -> Self {
        Self::Category {
            category_id,
            term_taxonomy_id: None,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        match self {
            Self::Product { product_id, .. } => *product_id,
            Self::Category { category_id, .. } => *category_id,
        }
    }
}

/// Per-variation tally for variable products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariationSummary {
    pub total_variations: usize,
    pub successful_variations: usize,
    pub failed_variations: usize,
    pub successful_ids: Vec<EntityId>,
    pub failed_ids: Vec<EntityId>,
}

impl VariationSummary {
    pub fn record(&mut self, id: EntityId, ok: bool) {
        self.total_variations += 1;
        if ok {
            self.successful_variations += 1;
            self.successful_ids.push(id);
        } else {
            self.failed_variations += 1;
            self.failed_ids.push(id);
        }
    }
}

/// Chronological, human-readable record of what the pipeline did.
///
/// Every entry is mirrored to `tracing` at debug level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugTrail {
    entries: Vec<String>,
}

impl DebugTrail {
    pub fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        tracing::debug!(target: "catsync::trail", "{entry}");
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mutable working copy of a verdict.
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    subject: Subject,
    sync_status: SyncStatus,
    retailer_id: Option<String>,
    remote_id: Option<RemoteId>,
    mismatches: Vec<Mismatch>,
    summary: Option<VariationSummary>,
    trail: DebugTrail,
    error: Option<String>,
    raw_data: serde_json::Value,
}

impl ResultBuilder {
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            sync_status: SyncStatus::Unknown,
            retailer_id: None,
            remote_id: None,
            mismatches: Vec::new(),
            summary: None,
            trail: DebugTrail::default(),
            error: None,
            raw_data: serde_json::Value::Null,
        }
    }

    pub fn debug(&mut self, entry: impl Into<String>) {
        self.trail.push(entry);
    }

    /// The trail, for collaborators that log into it directly.
    pub fn trail(&mut self) -> &mut DebugTrail {
        &mut self.trail
    }

    pub fn product_type(&mut self, kind: ProductKind) {
        if let Subject::Product { product_type, .. } = &mut self.subject {
            *product_type = Some(kind);
        }
    }

    pub fn term_taxonomy_id(&mut self, id: EntityId) {
        if let Subject::Category {
            term_taxonomy_id, ..
        } = &mut self.subject
        {
            *term_taxonomy_id = Some(id);
        }
    }

    pub fn sync_status(&mut self, status: SyncStatus) {
        self.sync_status = status;
    }

    pub fn retailer_id(&mut self, key: impl Into<String>) {
        self.retailer_id = Some(key.into());
    }

    pub fn remote_id(&mut self, id: Option<RemoteId>) {
        self.remote_id = id;
    }

    pub fn mismatches(&mut self, mismatches: impl IntoIterator<Item = Mismatch>) {
        self.mismatches.extend(mismatches);
    }

    pub fn summary(&mut self, summary: VariationSummary) {
        self.summary = Some(summary);
    }

    pub fn raw_data(&mut self, raw: serde_json::Value) {
        self.raw_data = raw;
    }

    /// Record a fatal precondition failure.  The status drops back to
    /// `unknown` and the remote id is cleared.
    pub fn fail(&mut self, err: &CoreError) {
        self.trail.push(format!("failed ({}): {err}", err.kind()));
        self.error = Some(err.to_string());
        self.sync_status = SyncStatus::Unknown;
        self.remote_id = None;
    }

    pub fn build(self) -> ValidationResult {
        let success = self.error.is_none()
            && self.sync_status == SyncStatus::Synced
            && self.mismatches.is_empty();
        ValidationResult {
            success,
            subject: self.subject,
            sync_status: self.sync_status,
            retailer_id: self.retailer_id,
            remote_id: self.remote_id,
            mismatches: self.mismatches,
            summary: self.summary,
            debug: self.trail.entries,
            error: self.error,
            raw_data: self.raw_data,
        }
    }
}

/// Immutable verdict of one validation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    success: bool,
    subject: Subject,
    sync_status: SyncStatus,
    retailer_id: Option<String>,
    remote_id: Option<RemoteId>,
    mismatches: Vec<Mismatch>,
    summary: Option<VariationSummary>,
    debug: Vec<String>,
    error: Option<String>,
    raw_data: serde_json::Value,
}

impl ValidationResult {
    /// `true` iff synced, free of mismatches and without error.
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    pub fn retailer_id(&self) -> Option<&str> {
        self.retailer_id.as_deref()
    }

    /// Remote product id, group id or set id, depending on the subject.
    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    pub fn summary(&self) -> Option<&VariationSummary> {
        self.summary.as_ref()
    }

    pub fn debug(&self) -> &[String] {
        &self.debug
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn raw_data(&self) -> &serde_json::Value {
        &self.raw_data
    }
}

/// Serializes mismatches as an ordered map keyed by `"{id}_{field}"`.
struct MismatchMap<'a>(&'a [Mismatch]);

impl Serialize for MismatchMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for mismatch in self.0 {
            map.serialize_entry(&mismatch.key(), mismatch)?;
        }
        map.end()
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("success", &self.success)?;
        match &self.subject {
            Subject::Product {
                product_id,
                product_type,
            } => {
                map.serialize_entry("product_id", product_id)?;
                map.serialize_entry("product_type", product_type)?;
            }
            Subject::Category {
                category_id,
                term_taxonomy_id,
            } => {
                map.serialize_entry("category_id", category_id)?;
                map.serialize_entry("term_taxonomy_id", term_taxonomy_id)?;
            }
        }
        map.serialize_entry("sync_status", &self.sync_status)?;
        map.serialize_entry("retailer_id", &self.retailer_id)?;
        let remote_key = match self.subject {
            Subject::Product { .. } => "facebook_id",
            Subject::Category { .. } => "facebook_product_set_id",
        };
        map.serialize_entry(remote_key, &self.remote_id)?;
        map.serialize_entry("mismatches", &MismatchMap(&self.mismatches))?;
        if let Some(summary) = &self.summary {
            map.serialize_entry("summary", summary)?;
        }
        map.serialize_entry("debug", &self.debug)?;
        map.serialize_entry("error", &self.error)?;
        map.serialize_entry("raw_data", &self.raw_data)?;
        map.end()
    }
}
