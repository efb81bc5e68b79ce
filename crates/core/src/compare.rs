//! Field comparator -- diffs normalized local vs. remote values.

use serde::Serialize;

use crate::entity::FieldSource;
use crate::normalize::{normalize, FieldKind};
use crate::types::EntityId;

/// Substituted on either side when no image is known, so a remote that
/// has not ingested the asset yet does not produce a false mismatch.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://woocommerce.com/wp-content/plugins/woocommerce/assets/images/placeholder.png";

const IMAGE_FIELD: &str = "image_url";

/// One local field paired with its remote counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub local: &'static str,
    pub remote: &'static str,
    pub kind: FieldKind,
}

const fn map(local: &'static str, remote: &'static str, kind: FieldKind) -> FieldMapping {
    FieldMapping {
        local,
        remote,
        kind,
    }
}

/// Products and variants.
pub const PRODUCT_FIELDS: &[FieldMapping] = &[
    map("title", "name", FieldKind::Text),
    map("price", "price", FieldKind::Price),
    map("retailer_id", "retailer_id", FieldKind::Plain),
    map("availability", "availability", FieldKind::Plain),
    map("description", "description", FieldKind::LongText),
    map("brand", "brand", FieldKind::Plain),
    map("condition", "condition", FieldKind::Plain),
    map(IMAGE_FIELD, IMAGE_FIELD, FieldKind::Plain),
];

/// Categories vs. remote sets.
pub const CATEGORY_FIELDS: &[FieldMapping] = &[
    map("name", "name", FieldKind::Text),
    map("retailer_id", "retailer_id", FieldKind::Plain),
];

/// A single field whose normalized values disagree.  Raw values are kept
/// for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub entity_id: EntityId,
    pub field: String,
    pub local_value: String,
    pub remote_value: String,
}

impl Mismatch {
    /// Report key, `"{id}_{field}"`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.entity_id, self.field)
    }
}

/// Outcome of comparing one local/remote pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldComparison {
    pub mismatches: Vec<Mismatch>,
    /// Local field names skipped because the remote did not report them.
    pub omitted: Vec<&'static str>,
    pub compared: usize,
}

/// Compare every mapped field of `local` against `remote`.
pub fn compare_fields<L, R>(
    entity_id: EntityId,
    local: &L,
    remote: &R,
    mapping: &[FieldMapping],
) -> FieldComparison
where
    L: FieldSource + ?Sized,
    R: FieldSource + ?Sized,
{
    let mut out = FieldComparison::default();

    for pair in mapping {
        let is_image = pair.local == IMAGE_FIELD;

        let remote_raw = match remote.field(pair.remote) {
            Some(value) if !(is_image && value.trim().is_empty()) => value,
            _ if is_image => PLACEHOLDER_IMAGE_URL.to_string(),
            _ => {
                out.omitted.push(pair.local);
                continue;
            }
        };
        let local_raw = match local.field(pair.local) {
            Some(value) if !(is_image && value.trim().is_empty()) => value,
            _ if is_image => PLACEHOLDER_IMAGE_URL.to_string(),
            _ => String::new(),
        };

        out.compared += 1;
        if normalize(&local_raw, pair.kind) != normalize(&remote_raw, pair.kind) {
            out.mismatches.push(Mismatch {
                entity_id,
                field: pair.local.to_string(),
                local_value: local_raw,
                remote_value: remote_raw,
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::entity::{CategoryEntity, LocalEntity, Price, ProductKind, RemoteEntity, RemoteSet};

    fn widget() -> LocalEntity {
        LocalEntity {
            id: 10,
            kind: ProductKind::Simple,
            parent_id: None,
            retailer_id: "SKU-1".into(),
            title: "Widget".into(),
            price: Some(Price {
                amount: "29.99".into(),
                currency: String::new(),
            }),
            description: "A fine widget".into(),
            availability: "in stock".into(),
            condition: "new".into(),
            brand: "Acme".into(),
            attributes: BTreeMap::new(),
            image_url: None,
            category_keys: Vec::new(),
        }
    }

    fn remote_widget(name: &str) -> RemoteEntity {
        RemoteEntity {
            id: "900".into(),
            retailer_id: Some("SKU-1".into()),
            name: Some(name.into()),
            price: Some("$29.99".into()),
            ..Default::default()
        }
    }

    #[test]
    fn equal_after_normalization_yields_no_mismatch() {
        let result = compare_fields(10, &widget(), &remote_widget("Widget"), PRODUCT_FIELDS);
        assert!(result.mismatches.is_empty());
        // title, price, retailer_id and the placeholder image
        assert_eq!(result.compared, 4);
        assert_eq!(
            result.omitted,
            vec!["availability", "description", "brand", "condition"]
        );
    }

    #[test]
    fn title_mismatch_keeps_raw_values() {
        let result = compare_fields(10, &widget(), &remote_widget("Widget v2"), PRODUCT_FIELDS);
        assert_eq!(result.mismatches.len(), 1);
        let m = &result.mismatches[0];
        assert_eq!(m.field, "title");
        assert_eq!(m.local_value, "Widget");
        assert_eq!(m.remote_value, "Widget v2");
        assert_eq!(m.key(), "10_title");
    }

    #[test]
    fn missing_remote_image_uses_placeholder() {
        let mut local = widget();
        local.image_url = Some("https://shop.test/img/widget.png".into());
        let result = compare_fields(10, &local, &remote_widget("Widget"), PRODUCT_FIELDS);
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].field, "image_url");
        assert_eq!(result.mismatches[0].remote_value, PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn category_compares_name_and_key() {
        let local = CategoryEntity {
            id: 5,
            term_taxonomy_id: 7,
            name: "Shoes &amp; Boots".into(),
            retailer_id: "wc_category_7".into(),
        };
        let remote = RemoteSet {
            id: "321".into(),
            name: Some("Shoes & Boots".into()),
            retailer_id: Some("wc_category_8".into()),
        };
        let result = compare_fields(5, &local, &remote, CATEGORY_FIELDS);
        assert_eq!(result.compared, 2);
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].field, "retailer_id");
    }
}
