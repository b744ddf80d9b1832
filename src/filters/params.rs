//! Filter parameter parsing.

use crate::error::{FeedError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field name -> term uuids, per `"{type}:{bundle}"` key.
pub type FieldTermMap = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Parameters of a replication filter, as received with the request.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FilterParameters {
    values: Map<String, Value>,
}

impl FilterParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A list of strings.
    ///
    /// Accepts a JSON array of strings or an object whose keys are taken.
    /// Absent keys yield an empty list.
    pub fn string_list(&self, key: &str) -> Result<Vec<String>> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => string_list(key, value),
        }
    }

    /// Like [`string_list`](Self::string_list), but `None` when the key is absent.
    pub fn optional_string_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => string_list(key, value).map(Some),
        }
    }

    /// The nested `{"type:bundle": {"field": [uuid, ...]}}` map.
    pub fn field_terms(&self, key: &str) -> Result<FieldTermMap> {
        let mut parsed = FieldTermMap::new();
        let object = match self.values.get(key) {
            None | Some(Value::Null) => return Ok(parsed),
            Some(Value::Object(object)) => object,
            Some(_) => return Err(FeedError::invalid_parameter(key, "expected an object")),
        };

        for (type_bundle, fields) in object {
            let fields = match fields {
                Value::Object(fields) => fields,
                // Some clients encode an empty map as an empty list.
                Value::Array(items) if items.is_empty() => {
                    parsed.insert(type_bundle.clone(), BTreeMap::new());
                    continue;
                }
                _ => {
                    return Err(FeedError::invalid_parameter(
                        format!("{key}.{type_bundle}"),
                        "expected an object of field names",
                    ))
                }
            };

            let mut by_field = BTreeMap::new();
            for (field, uuids) in fields {
                let uuids = string_list(&format!("{key}.{type_bundle}.{field}"), uuids)?;
                by_field.insert(field.clone(), uuids);
            }
            parsed.insert(type_bundle.clone(), by_field);
        }

        Ok(parsed)
    }
}

impl From<Map<String, Value>> for FilterParameters {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl TryFrom<Value> for FilterParameters {
    type Error = FeedError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            _ => Err(FeedError::invalid_parameter(
                "parameters",
                "expected an object",
            )),
        }
    }
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(FeedError::invalid_parameter(key, "expected a list of strings")),
            })
            .collect(),
        Value::Object(object) => Ok(object.keys().cloned().collect()),
        Value::String(s) => Ok(vec![s.clone()]),
        _ => Err(FeedError::invalid_parameter(
            key,
            "expected a list of strings or an object",
        )),
    }
}
