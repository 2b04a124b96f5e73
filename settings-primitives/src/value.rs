//! Option values and the maps that hold them.
//!
//! Values are classified once, when they enter the crate from JSON, into a
//! scalar, a sequence, or a mapping. The mapping case is the only one that
//! participates in default merging.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Options keyed by name.
pub type OptionMap = BTreeMap<String, SettingValue>;

/// Value stored for a single option.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum SettingValue {
    /// Null, boolean, number, or string.
    Scalar(Value),
    /// Ordered list of JSON values.
    Sequence(Vec<Value>),
    /// Plain key/value record.
    Mapping(Map<String, Value>),
}

impl SettingValue {
    /// Returns the null scalar.
    #[must_use]
    pub const fn null() -> Self {
        Self::Scalar(Value::Null)
    }

    /// Returns `true` for the mapping variant.
    #[must_use]
    pub const fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Returns `true` for sequences and mappings.
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        !matches!(self, Self::Scalar(_))
    }

    /// Returns the inner record when this is a mapping.
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the boolean when this is a boolean scalar.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Scalar(Value::Bool(flag)) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the string when this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Overlays this value on top of `base`.
    ///
    /// When both sides are mappings the result starts from `base` and every
    /// key of `self` overrides it. In every other case `self` is returned
    /// unchanged.
    #[must_use]
    pub fn merged_over(&self, base: &Self) -> Self {
        match (self, base) {
            (Self::Mapping(overlay), Self::Mapping(base)) => {
                let mut merged = base.clone();
                for (key, value) in overlay {
                    merged.insert(key.clone(), value.clone());
                }
                Self::Mapping(merged)
            }
            _ => self.clone(),
        }
    }

    /// Converts the value back into plain JSON.
    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            Self::Scalar(value) => value,
            Self::Sequence(items) => Value::Array(items),
            Self::Mapping(map) => Value::Object(map),
        }
    }

    /// Returns a JSON copy of the value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        self.clone().into_json()
    }
}

impl Default for SettingValue {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Value> for SettingValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Sequence(items),
            Value::Object(map) => Self::Mapping(map),
            scalar => Self::Scalar(scalar),
        }
    }
}

impl From<SettingValue> for Value {
    fn from(value: SettingValue) -> Self {
        value.into_json()
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Scalar(Value::Bool(value))
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Scalar(Value::from(value))
    }
}

impl From<u64> for SettingValue {
    fn from(value: u64) -> Self {
        Self::Scalar(Value::from(value))
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Scalar(Value::String(value.to_owned()))
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Scalar(Value::String(value))
    }
}

/// Converts a JSON object into an [`OptionMap`].
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] when `value` is not a JSON object.
pub fn option_map_from_json(value: Value) -> Result<OptionMap> {
    match value {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(name, value)| (name, SettingValue::from(value)))
            .collect()),
        other => Err(Error::InvalidValue {
            reason: format!("expected a JSON object of options, found {}", json_kind(&other)),
        }),
    }
}

/// Converts an [`OptionMap`] into a JSON object.
#[must_use]
pub fn option_map_to_json(options: &OptionMap) -> Value {
    Value::Object(
        options
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    )
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_json_once() {
        assert_eq!(SettingValue::from(json!(3)).kind(), "scalar");
        assert_eq!(SettingValue::from(json!([1, 2])).kind(), "sequence");
        assert_eq!(SettingValue::from(json!({"a": 1})).kind(), "mapping");
        assert_eq!(SettingValue::from(json!(null)), SettingValue::null());
    }

    #[test]
    fn mapping_merges_over_mapping_base() {
        let base = SettingValue::from(json!({"level": 5, "muted": false}));
        let overlay = SettingValue::from(json!({"level": 8}));

        let merged = overlay.merged_over(&base);
        assert_eq!(merged.to_json(), json!({"level": 8, "muted": false}));

        let empty = SettingValue::from(json!({}));
        assert_eq!(empty.merged_over(&base), base);
    }

    #[test]
    fn non_mappings_ignore_base() {
        let base = SettingValue::from(json!({"level": 5}));
        let list = SettingValue::from(json!([1]));
        assert_eq!(list.merged_over(&base), list);

        let scalar = SettingValue::from("blue");
        assert_eq!(scalar.merged_over(&base), scalar);
    }

    #[test]
    fn serde_is_plain_json() {
        let value: SettingValue = serde_json::from_str(r#"{"level":5}"#).unwrap();
        assert!(value.is_mapping());
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"level":5}"#);
    }

    #[test]
    fn option_map_requires_object() {
        let map = option_map_from_json(json!({"color": "blue"})).unwrap();
        assert_eq!(map["color"].as_str(), Some("blue"));
        assert_eq!(option_map_to_json(&map), json!({"color": "blue"}));

        let err = option_map_from_json(json!([1])).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }
}
