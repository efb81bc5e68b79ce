//! Catalog sync reconciliation validator.
//!
//! Given a local product or category id, reads the local record, looks
//! its mirror up in the remote catalog, resolves an overall sync status
//! and diffs the mapped fields.  The result is always a
//! [`ValidationResult`]; remote-side trouble never surfaces as an error.
//!
//! ```text
//! initializing -> extracting_local -> fetching_remote
//!              -> resolving_status -> comparing_fields -> done
//!                 (any state) -> failed
//! ```

pub mod extract;
pub mod pipeline;
pub mod stage;

pub use catsync_core::result::ValidationResult;
pub use pipeline::{Target, ValidationRequest, Validator, ValidatorConfig};
pub use stage::Stage;
