//! Pure domain logic for catalog sync reconciliation.
//!
//! Holds the canonical comparison schema shared by the local store and
//! the remote catalog, the field normalizer, the field comparator, the
//! sync status resolver and the verdict type.  Nothing in this crate
//! performs I/O.

pub mod compare;
pub mod entity;
pub mod error;
pub mod normalize;
pub mod resolve;
pub mod result;
pub mod types;
