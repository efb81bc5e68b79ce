use catsync_core::types::EntityId;

/// Errors from reading the local catalog.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A query against the WooCommerce database failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The snapshot file could not be read.
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot file is not a valid catalog document.
    #[error("Snapshot decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// A record exists but cannot be interpreted.
    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: EntityId, reason: String },
}
