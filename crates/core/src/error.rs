use crate::types::EntityId;

/// Fatal conditions that abort a validation before any remote lookup.
///
/// Remote-side problems never appear here: they degrade to a "not
/// synced" verdict instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Integration not configured: {0}")]
    Configuration(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("Extraction failed: {0}")]
    Extraction(String),
}

impl CoreError {
    /// Short machine-friendly label, used as a prefix in debug trails.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::NotFound { .. } => "not_found",
            Self::Extraction(_) => "extraction",
        }
    }
}
