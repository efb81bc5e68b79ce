use std::time::Duration;

use clap::Parser;

use catsync_core::types::EntityId;
use catsync_validator::ValidationRequest;

/// Check whether a local product or category is mirrored in the remote
/// catalog.  Prints one JSON verdict on stdout.
#[derive(Debug, Parser)]
#[command(name = "catsync", version)]
pub struct Args {
    /// Validate a product category (term id) instead of a product.
    #[arg(long)]
    pub category: bool,

    /// Product post id, or category term id with `--category`.
    pub entity_id: EntityId,

    /// Seconds to wait before the first remote lookup.
    #[arg(default_value_t = 10)]
    pub wait_seconds: u64,

    /// Lookup attempts per remote entity.
    #[arg(default_value_t = 6)]
    pub max_retries: u32,
}

impl Args {
    pub fn request(&self) -> ValidationRequest {
        let request = if self.category {
            ValidationRequest::category(self.entity_id)
        } else {
            ValidationRequest::product(self.entity_id)
        };
        request
            .with_wait(Duration::from_secs(self.wait_seconds))
            .with_max_retries(self.max_retries)
    }
}

#[cfg(test)]
mod tests {
    use catsync_validator::Target;

    use super::*;

    #[test]
    fn product_mode_with_defaults() {
        let args = Args::try_parse_from(["catsync", "42"]).unwrap();
        let request = args.request();
        assert_eq!(request.target, Target::Product(42));
        assert_eq!(request.wait, Duration::from_secs(10));
        assert_eq!(request.max_retries, 6);
    }

    #[test]
    fn category_mode_with_overrides() {
        let args = Args::try_parse_from(["catsync", "--category", "7", "0", "3"]).unwrap();
        let request = args.request();
        assert_eq!(request.target, Target::Category(7));
        assert!(request.wait.is_zero());
        assert_eq!(request.max_retries, 3);
    }

    #[test]
    fn entity_id_is_required() {
        assert!(Args::try_parse_from(["catsync"]).is_err());
        assert!(Args::try_parse_from(["catsync", "--category"]).is_err());
    }

    #[test]
    fn entity_id_must_be_numeric() {
        assert!(Args::try_parse_from(["catsync", "abc"]).is_err());
    }
}
