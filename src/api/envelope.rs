//! Response-envelope parsing.
//!
//! The backend is not uniform about envelopes: listings come back as
//! `{ data: [...], meta: {...} }`, single resources are sometimes wrapped in
//! `{ data: {...} }` and sometimes bare, and some deployments nest one level
//! deeper. Instead of duck-typing at every call site, each endpoint family
//! goes through exactly one parser here and gets either a typed value or a
//! typed [`ServiceError::UnexpectedShape`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::ServiceError;

/// Pagination envelope for list endpoints.
#[derive(Clone, Debug, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default, rename = "totalPages")]
    pub total_pages: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    /// True when `meta` says there is a page after `page`; unknown metadata
    /// is treated as exhausted so bounded loops terminate.
    pub fn has_more(&self, page: u64) -> bool {
        match self.meta.total_pages {
            Some(total_pages) => page < total_pages,
            None => false,
        }
    }
}

fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            // Some deployments wrap twice: { data: { data: ... } }.
            Some(inner) => unwrap_data(inner),
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Parses a single-resource response, accepting `{data: T}` wrapping (at any
/// depth) or a bare `T`.
pub fn parse_entity<T: DeserializeOwned>(
    endpoint: &'static str,
    value: Value,
) -> Result<T, ServiceError> {
    let inner = unwrap_data(value);
    serde_json::from_value(inner).map_err(|e| ServiceError::UnexpectedShape {
        endpoint,
        detail: e.to_string(),
    })
}

/// Parses a paginated listing: `{data: [...], meta: {...}}` or a bare array
/// (empty meta).
pub fn parse_list<T: DeserializeOwned>(
    endpoint: &'static str,
    value: Value,
) -> Result<Paginated<T>, ServiceError> {
    let shape_err = |detail: String| ServiceError::UnexpectedShape { endpoint, detail };

    match value {
        Value::Array(items) => {
            let data = serde_json::from_value(Value::Array(items))
                .map_err(|e| shape_err(e.to_string()))?;
            Ok(Paginated {
                data,
                meta: PageMeta {
                    page: None,
                    limit: None,
                    total: None,
                    total_pages: None,
                },
            })
        }
        Value::Object(mut map) => {
            let data = map
                .remove("data")
                .ok_or_else(|| shape_err("missing `data` array".to_string()))?;
            let data =
                serde_json::from_value(data).map_err(|e| shape_err(e.to_string()))?;
            let meta = match map.remove("meta") {
                Some(meta) => {
                    serde_json::from_value(meta).map_err(|e| shape_err(e.to_string()))?
                }
                None => PageMeta {
                    page: None,
                    limit: None,
                    total: None,
                    total_pages: None,
                },
            };
            Ok(Paginated { data, meta })
        }
        other => Err(shape_err(format!("expected array or object, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        name: String,
    }

    #[test]
    fn entity_accepts_bare_and_wrapped_shapes() {
        let bare: Thing = parse_entity("things", json!({"name": "a"})).unwrap();
        assert_eq!(bare.name, "a");

        let wrapped: Thing = parse_entity("things", json!({"data": {"name": "b"}})).unwrap();
        assert_eq!(wrapped.name, "b");

        let nested: Thing =
            parse_entity("things", json!({"data": {"data": {"name": "c"}}})).unwrap();
        assert_eq!(nested.name, "c");
    }

    #[test]
    fn entity_mismatch_is_a_typed_shape_error() {
        let err = parse_entity::<Thing>("things", json!({"data": [1, 2]})).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::UnexpectedShape { endpoint: "things", .. }
        ));
    }

    #[test]
    fn list_parses_data_meta_envelope() {
        let page: Paginated<Thing> = parse_list(
            "things",
            json!({"data": [{"name": "a"}], "meta": {"page": 1, "totalPages": 3}}),
        )
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.has_more(1));
        assert!(page.has_more(2));
        assert!(!page.has_more(3));
    }

    #[test]
    fn list_accepts_bare_array_without_pagination() {
        let page: Paginated<Thing> = parse_list("things", json!([{"name": "a"}])).unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(!page.has_more(1));
    }

    #[test]
    fn list_without_data_key_is_a_shape_error() {
        let err = parse_list::<Thing>("things", json!({"items": []})).unwrap_err();
        assert!(matches!(err, ServiceError::UnexpectedShape { .. }));
    }
}
