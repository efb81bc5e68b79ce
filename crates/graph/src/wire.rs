//! Graph API response shapes and their conversion into the canonical
//! remote types.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use catsync_core::entity::{Membership, RemoteEntity, RemoteSet};

/// Fields requested for a product lookup.
pub const PRODUCT_FIELDS: &[&str] = &[
    "id",
    "retailer_id",
    "name",
    "price",
    "description",
    "availability",
    "condition",
    "brand",
    "image_url",
    "product_group{id,retailer_id}",
    "product_sets{id,retailer_id}",
];

/// Fields requested for a product set lookup.
pub const SET_FIELDS: &[&str] = &["id", "name", "retailer_id"];

/// Graph ids arrive as strings but occasionally as bare numbers.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
struct WireRef {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    retailer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireEdge {
    #[serde(default)]
    data: Vec<WireRef>,
}

#[derive(Debug, Deserialize)]
struct WireProduct {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    retailer_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    price: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    availability: Option<String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    product_group: Option<WireRef>,
    #[serde(default)]
    product_sets: Option<WireEdge>,
}

#[derive(Debug, Deserialize)]
struct WireSet {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    retailer_id: Option<String>,
}

/// Result of interpreting one response.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<T> {
    Found(T),
    NotFound,
    TransportFailure(String),
}

/// The `data` array of a response, or the reason it is unusable.
fn data_array(response: &Value) -> Result<&Vec<Value>, String> {
    if let Some(error) = response.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unspecified error");
        return Err(format!("remote error: {message}"));
    }
    response
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| "response has no data array".to_string())
}

/// Interpret a product lookup response.  The first `data` element, if
/// any, is the match.
pub fn parse_product(response: &Value) -> AttemptOutcome<RemoteEntity> {
    let data = match data_array(response) {
        Ok(data) => data,
        Err(reason) => return AttemptOutcome::TransportFailure(reason),
    };
    let Some(first) = data.first() else {
        return AttemptOutcome::NotFound;
    };

    let wire: WireProduct = match serde_json::from_value(first.clone()) {
        Ok(wire) => wire,
        Err(e) => return AttemptOutcome::TransportFailure(format!("malformed product: {e}")),
    };
    let Some(id) = wire.id else {
        return AttemptOutcome::TransportFailure("product record without id".into());
    };

    let memberships = wire
        .product_sets
        .map(|edge| {
            edge.data
                .into_iter()
                .filter_map(|r| {
                    r.id.map(|set_id| Membership {
                        set_id,
                        retailer_id: r.retailer_id,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    AttemptOutcome::Found(RemoteEntity {
        id,
        retailer_id: wire.retailer_id,
        name: wire.name,
        price: wire.price,
        description: wire.description,
        availability: wire.availability,
        condition: wire.condition,
        brand: wire.brand,
        image_url: wire.image_url,
        group_id: wire.product_group.and_then(|g| g.id),
        memberships,
    })
}

/// Interpret a product set list.  Records without an id are dropped.
pub fn parse_sets(response: &Value) -> Result<Vec<RemoteSet>, String> {
    let data = data_array(response)?;
    let mut sets = Vec::with_capacity(data.len());
    for item in data {
        let wire: WireSet =
            serde_json::from_value(item.clone()).map_err(|e| format!("malformed set: {e}"))?;
        if let Some(id) = wire.id {
            sets.push(RemoteSet {
                id,
                name: wire.name,
                retailer_id: wire.retailer_id,
            });
        }
    }
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn first_record_is_the_match() {
        let response = json!({
            "data": [
                {
                    "id": "900",
                    "retailer_id": "SKU-1_10",
                    "name": "Widget",
                    "price": "$29.99",
                    "product_group": { "id": "700" },
                    "product_sets": { "data": [ { "id": "55", "retailer_id": "wc_category_9" } ] }
                },
                { "id": "901", "retailer_id": "other" }
            ]
        });
        let remote = assert_matches!(parse_product(&response), AttemptOutcome::Found(r) => r);
        assert_eq!(remote.id, "900");
        assert_eq!(remote.group_id.as_deref(), Some("700"));
        assert_eq!(remote.memberships.len(), 1);
        assert_eq!(remote.memberships[0].retailer_id.as_deref(), Some("wc_category_9"));
        assert_eq!(remote.brand, None);
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let response = json!({ "data": [ { "id": 900, "price": 12.5 } ] });
        let remote = assert_matches!(parse_product(&response), AttemptOutcome::Found(r) => r);
        assert_eq!(remote.id, "900");
        assert_eq!(remote.price.as_deref(), Some("12.5"));
    }

    #[test]
    fn empty_data_is_not_found() {
        assert_eq!(parse_product(&json!({ "data": [] })), AttemptOutcome::NotFound);
    }

    #[test]
    fn error_object_is_a_transport_failure() {
        let response = json!({ "error": { "message": "Invalid OAuth access token", "code": 190 } });
        assert_matches!(
            parse_product(&response),
            AttemptOutcome::TransportFailure(reason) if reason.contains("Invalid OAuth")
        );
    }

    #[test]
    fn missing_data_is_a_transport_failure() {
        assert_matches!(parse_product(&json!({})), AttemptOutcome::TransportFailure(_));
    }

    #[test]
    fn sets_without_id_are_dropped() {
        let response = json!({
            "data": [
                { "id": "55", "name": "Shoes", "retailer_id": "wc_category_9" },
                { "name": "Orphan" }
            ]
        });
        let sets = parse_sets(&response).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name.as_deref(), Some("Shoes"));
    }
}
