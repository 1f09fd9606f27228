//! Data identifiers: the key/value sets that name one frame or calibration
//! product (`visit`, `ccd`, `filter`, `date`, `expTime`, `object`, ...).
//!
//! A `DataId` is owned by the host and handed to mapper hooks; the only hook
//! that produces a modified copy is `validate`, which coerces `visit` to an
//! integer. Values are typed so a mapper never has to guess whether `visit`
//! arrived as text or as a number.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ButlerError, Result};

/// One value in a data identifier.
///
/// Untagged on the wire so registry files read naturally
/// (`{"visit": 1234, "filter": "r"}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataIdValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for DataIdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIdValue::Int(v) => write!(f, "{v}"),
            DataIdValue::Float(v) => write!(f, "{v}"),
            DataIdValue::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for DataIdValue {
    fn from(v: i64) -> Self {
        DataIdValue::Int(v)
    }
}

impl From<i32> for DataIdValue {
    fn from(v: i32) -> Self {
        DataIdValue::Int(i64::from(v))
    }
}

impl From<f64> for DataIdValue {
    fn from(v: f64) -> Self {
        DataIdValue::Float(v)
    }
}

impl From<&str> for DataIdValue {
    fn from(v: &str) -> Self {
        DataIdValue::Str(v.to_string())
    }
}

impl From<String> for DataIdValue {
    fn from(v: String) -> Self {
        DataIdValue::Str(v)
    }
}

/// Key/value set uniquely identifying one exposure or calibration frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataId {
    values: BTreeMap<String, DataIdValue>,
}

impl DataId {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<DataIdValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<DataIdValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&DataIdValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataIdValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Required integer key. Errors if the key is absent or not an integer.
    pub fn int(&self, key: &str) -> Result<i64> {
        match self.values.get(key) {
            Some(DataIdValue::Int(v)) => Ok(*v),
            Some(other) => Err(ButlerError::InvalidDataId(format!(
                "key '{key}' is not an integer (got {other})"
            ))),
            None => Err(ButlerError::InvalidDataId(format!("missing key '{key}'"))),
        }
    }

    /// Required float key; integers widen losslessly.
    pub fn float(&self, key: &str) -> Result<f64> {
        match self.values.get(key) {
            Some(DataIdValue::Float(v)) => Ok(*v),
            Some(DataIdValue::Int(v)) => Ok(*v as f64),
            Some(other) => Err(ButlerError::InvalidDataId(format!(
                "key '{key}' is not numeric (got {other})"
            ))),
            None => Err(ButlerError::InvalidDataId(format!("missing key '{key}'"))),
        }
    }

    /// Required string key.
    pub fn text(&self, key: &str) -> Result<&str> {
        match self.values.get(key) {
            Some(DataIdValue::Str(v)) => Ok(v.as_str()),
            Some(other) => Err(ButlerError::InvalidDataId(format!(
                "key '{key}' is not a string (got {other})"
            ))),
            None => Err(ButlerError::InvalidDataId(format!("missing key '{key}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let id = DataId::new()
            .with("visit", 1234)
            .with("filter", "r")
            .with("expTime", 30.0);
        assert_eq!(id.int("visit").unwrap(), 1234);
        assert_eq!(id.text("filter").unwrap(), "r");
        assert_eq!(id.float("expTime").unwrap(), 30.0);
        // Int widens to float, not the other way around
        assert_eq!(id.float("visit").unwrap(), 1234.0);
        assert!(id.int("expTime").is_err());
    }

    #[test]
    fn test_missing_key_errors() {
        let id = DataId::new();
        assert!(matches!(
            id.int("visit"),
            Err(ButlerError::InvalidDataId(_))
        ));
    }

    #[test]
    fn test_json_shape() {
        let id = DataId::new().with("visit", 7).with("filter", "g");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#"{"filter":"g","visit":7}"#);
        let back: DataId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
