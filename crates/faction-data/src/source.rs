//! Typed view of an untyped faction source map.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::FactionError;

/// Every key a faction source may carry.
///
/// All fields are optional at this layer; a JSON `null` reads as absent.
/// Required fields are enforced by [`FactionSource::from_map`], and the
/// remaining defaults are applied by the record itself.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactionSource {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub motd: Option<String>,
    /// Seconds since the Unix epoch.
    pub created_at: Option<i64>,
    /// Kept untyped: a bad home is a warning, not a schema error.
    pub home: Option<Value>,
    pub power_boost: Option<i64>,
    pub flags: Option<BTreeMap<String, bool>>,
    /// Also read from `permissions`. A source carrying both keys is rejected
    /// as a duplicate field.
    #[serde(alias = "permissions")]
    pub perms: Option<BTreeMap<String, Value>>,
    pub relation_wishes: Option<BTreeMap<String, String>>,
    pub invited_players: Option<Vec<String>>,
    pub members: Option<Vec<String>>,
}

const REQUIRED_FIELDS: [&str; 2] = ["id", "name"];

impl FactionSource {
    /// Validates required keys, then reads the rest of the map.
    ///
    /// Missing required fields are reported before any type checking, so a
    /// source without `id` or `name` always fails with
    /// [`FactionError::MissingField`].
    pub fn from_map(source: &Map<String, Value>) -> Result<Self, FactionError> {
        for field in REQUIRED_FIELDS {
            if source.get(field).map_or(true, Value::is_null) {
                return Err(FactionError::MissingField { field });
            }
        }
        Ok(serde_json::from_value(Value::Object(source.clone()))?)
    }

    /// Same as [`from_map`](Self::from_map) for an arbitrary JSON value.
    pub fn from_value(source: &Value) -> Result<Self, FactionError> {
        match source {
            Value::Object(map) => Self::from_map(map),
            other => Err(FactionError::NotAnObject {
                found: json_type_name(other),
            }),
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_missing_id() {
        let err = FactionSource::from_map(&map(json!({ "name": "Alpha" }))).unwrap_err();
        assert!(matches!(err, FactionError::MissingField { field: "id" }));
    }

    #[test]
    fn test_null_name_counts_as_missing() {
        let err = FactionSource::from_map(&map(json!({ "id": "f1", "name": null }))).unwrap_err();
        assert!(matches!(err, FactionError::MissingField { field: "name" }));
    }

    #[test]
    fn test_missing_field_wins_over_type_errors() {
        let source = map(json!({ "name": "Alpha", "powerBoost": "lots" }));
        let err = FactionSource::from_map(&source).unwrap_err();
        assert!(matches!(err, FactionError::MissingField { field: "id" }));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let source = map(json!({ "id": "f1", "name": "Alpha", "powerBoost": "lots" }));
        let err = FactionSource::from_map(&source).unwrap_err();
        assert!(matches!(err, FactionError::InvalidSource(_)));
    }

    #[test]
    fn test_permissions_alias() {
        let source = map(json!({ "id": "f1", "name": "Alpha", "permissions": { "build": true } }));
        let parsed = FactionSource::from_map(&source).unwrap();
        assert_eq!(parsed.perms.unwrap().get("build"), Some(&json!(true)));
    }

    #[test]
    fn test_perms_and_permissions_together_are_rejected() {
        let source = map(json!({
            "id": "f1",
            "name": "Alpha",
            "perms": { "build": true },
            "permissions": { "build": false }
        }));
        let err = FactionSource::from_map(&source).unwrap_err();
        assert!(matches!(err, FactionError::InvalidSource(_)));
        assert!(err.to_string().contains("duplicate field"));
    }

    #[test]
    fn test_nulls_read_as_absent() {
        let source = map(json!({
            "id": "f1",
            "name": "Alpha",
            "motd": null,
            "home": null,
            "flags": null
        }));
        let parsed = FactionSource::from_map(&source).unwrap();
        assert!(parsed.motd.is_none());
        assert!(parsed.home.is_none());
        assert!(parsed.flags.is_none());
    }

    #[test]
    fn test_non_object_source() {
        let err = FactionSource::from_value(&json!(["f1", "Alpha"])).unwrap_err();
        assert!(matches!(err, FactionError::NotAnObject { found: "an array" }));
    }
}
