//! Core types shared by the deserializer, coordinator and reconciler.

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pointer::PointerPath;

/// Media type of JSON:API documents.
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

/// Name of the bulk extension.
pub const BULK_EXTENSION: &str = "bulk";

/// Flattened attributes of one resource, keyed by target key.
pub type FlatParams = Map<String, Value>;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Target key to the pointer of the source member it was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReverseMapping(BTreeMap<String, PointerPath>);

impl ReverseMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PointerPath> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, pointer: PointerPath) -> Option<PointerPath> {
        self.0.insert(key.into(), pointer)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, PointerPath> {
        self.0.iter()
    }
}

impl FromIterator<(String, PointerPath)> for ReverseMapping {
    fn from_iter<I: IntoIterator<Item = (String, PointerPath)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ReverseMapping {
    type Item = (&'a String, &'a PointerPath);
    type IntoIter = btree_map::Iter<'a, String, PointerPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of deserializing a single resource object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeserializedResource {
    pub params: FlatParams,
    pub pointers: ReverseMapping,
}

/// Deserialization mode negotiated for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Single,
    Bulk,
}

impl Mode {
    pub fn is_bulk(&self) -> bool {
        matches!(self, Mode::Bulk)
    }
}

/// Deserialized parameters: one mapping, or one per submitted resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Single(FlatParams),
    Bulk(Vec<FlatParams>),
}

impl Params {
    /// Convert into a plain JSON value (object or array of objects).
    pub fn into_value(self) -> Value {
        match self {
            Params::Single(params) => Value::Object(params),
            Params::Bulk(list) => Value::Array(list.into_iter().map(Value::Object).collect()),
        }
    }
}

/// Recorded pointers: one reverse mapping, or one per submitted resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pointers {
    Single(ReverseMapping),
    Bulk(Vec<ReverseMapping>),
}

impl Pointers {
    pub fn mode(&self) -> Mode {
        match self {
            Pointers::Single(_) => Mode::Single,
            Pointers::Bulk(_) => Mode::Bulk,
        }
    }
}
