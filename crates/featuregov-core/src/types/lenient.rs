//! Lenient field decoding.
//!
//! Governance inputs come from upstream jobs and hand-edited files. A field
//! holding the wrong JSON type is read as absent so that evaluation stays
//! total instead of failing the whole record.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Decode an optional field, mapping a type mismatch to `None`.
pub(crate) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decode a list field element by element. A non-list reads as empty and
/// elements of the wrong type are dropped.
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Decode a non-negative whole-number field. Integral floats such as `2.0`
/// count; fractions, negatives and non-numbers read as absent.
pub(crate) fn whole<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    }))
}

/// Decode an object field into a map, dropping entries of the wrong type.
/// A non-object reads as empty.
pub(crate) fn map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(name, item)| serde_json::from_value(item).ok().map(|decoded| (name, decoded)))
        .collect())
}

/// Build a record from an arbitrary JSON value, falling back to defaults when
/// the value is not an object.
pub(crate) fn from_value_or_default<T>(value: &Value) -> T
where
    T: DeserializeOwned + Default,
{
    serde_json::from_value(value.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "optional")]
        score: Option<f64>,
        #[serde(default, deserialize_with = "list")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "whole")]
        limit: Option<u64>,
        #[serde(default, deserialize_with = "map")]
        weights: BTreeMap<String, f64>,
    }

    #[test]
    fn wrong_types_read_as_absent() {
        let sample: Sample = from_value_or_default(&json!({"score": "high", "tags": 3}));
        assert_eq!(sample.score, None);
        assert!(sample.tags.is_empty());
    }

    #[test]
    fn well_typed_fields_survive() {
        let sample: Sample = from_value_or_default(&json!({"score": 42, "tags": ["a"]}));
        assert_eq!(sample.score, Some(42.0));
        assert_eq!(sample.tags, vec!["a".to_string()]);
    }

    #[test]
    fn mistyped_list_elements_are_dropped() {
        let sample: Sample = from_value_or_default(&json!({"tags": ["a", 7, null, "b"]}));
        assert_eq!(sample.tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn non_object_root_gives_defaults() {
        let sample: Sample = from_value_or_default(&json!([1, 2, 3]));
        assert_eq!(sample.score, None);
    }

    #[test]
    fn whole_numbers_accept_integral_floats() {
        let sample: Sample = from_value_or_default(&json!({"limit": 2.0}));
        assert_eq!(sample.limit, Some(2));
        let sample: Sample = from_value_or_default(&json!({"limit": 2.5}));
        assert_eq!(sample.limit, None);
        let sample: Sample = from_value_or_default(&json!({"limit": -3}));
        assert_eq!(sample.limit, None);
    }

    #[test]
    fn map_entries_of_wrong_type_are_dropped() {
        let sample: Sample = from_value_or_default(&json!({"weights": {"a": 0.5, "b": "heavy"}}));
        assert_eq!(sample.weights.len(), 1);
        assert_eq!(sample.weights.get("a"), Some(&0.5));
        let sample: Sample = from_value_or_default(&json!({"weights": [1, 2]}));
        assert!(sample.weights.is_empty());
    }
}
