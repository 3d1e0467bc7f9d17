//! Declarative field mappings.
//!
//! A [`FieldMapping`] is a table of rules keyed by field kind and source name.
//! Each rule turns one source member into one or more `(target key, value)`
//! pairs. Members without an explicit rule fall back to a default rule:
//! `type` and `id` always, attributes and relationships only while
//! passthrough is enabled.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::DocumentError;

/// Where a rule reads its value from within a resource object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    Type,
    Id,
    Attribute,
    Relationship,
}

/// Turns a source value into `(target key, value)` pairs.
pub type Transform = Arc<dyn Fn(&Value) -> Vec<(String, Value)> + Send + Sync>;

/// Formatting applied to keys derived by default rules.
#[derive(Clone, Default)]
pub enum KeyFormat {
    #[default]
    Identity,
    /// `name` -> `Name`
    Capitalize,
    /// `firstName`, `first-name` -> `first_name`
    Underscore,
    /// `first_name`, `first-name` -> `firstName`
    Camelize,
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl KeyFormat {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        KeyFormat::Custom(Arc::new(f))
    }

    /// Parse a named key format.
    ///
    /// Returns `None` for unknown names (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "identity" => Some(KeyFormat::Identity),
            "capitalize" => Some(KeyFormat::Capitalize),
            "underscore" => Some(KeyFormat::Underscore),
            "camelize" => Some(KeyFormat::Camelize),
            _ => None,
        }
    }

    pub fn apply(&self, key: &str) -> String {
        match self {
            KeyFormat::Identity => key.to_string(),
            KeyFormat::Capitalize => capitalize(key),
            KeyFormat::Underscore => underscore(key),
            KeyFormat::Camelize => camelize(key),
            KeyFormat::Custom(f) => f(key),
        }
    }
}

impl fmt::Debug for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFormat::Identity => f.write_str("Identity"),
            KeyFormat::Capitalize => f.write_str("Capitalize"),
            KeyFormat::Underscore => f.write_str("Underscore"),
            KeyFormat::Camelize => f.write_str("Camelize"),
            KeyFormat::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Outcome of looking up the rule for a source member.
pub enum ResolvedRule<'a> {
    Explicit(&'a Transform),
    Default,
}

/// Rule table describing how a resource object becomes flat params.
#[derive(Clone)]
pub struct FieldMapping {
    rules: BTreeMap<(FieldKind, String), Transform>,
    key_format: KeyFormat,
    passthrough: bool,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            rules: BTreeMap::new(),
            key_format: KeyFormat::Identity,
            passthrough: true,
        }
    }
}

impl fmt::Debug for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMapping")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .field("key_format", &self.key_format)
            .field("passthrough", &self.passthrough)
            .finish()
    }
}

impl FieldMapping {
    /// A mapping with no explicit rules: every member passes through unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rule for one source member.
    pub fn rule<F>(mut self, kind: FieldKind, source: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Value) -> Vec<(String, Value)> + Send + Sync + 'static,
    {
        self.rules.insert((kind, source.into()), Arc::new(transform));
        self
    }

    pub fn type_rule<F>(self, transform: F) -> Self
    where
        F: Fn(&Value) -> Vec<(String, Value)> + Send + Sync + 'static,
    {
        self.rule(FieldKind::Type, "type", transform)
    }

    pub fn id_rule<F>(self, transform: F) -> Self
    where
        F: Fn(&Value) -> Vec<(String, Value)> + Send + Sync + 'static,
    {
        self.rule(FieldKind::Id, "id", transform)
    }

    pub fn attribute<F>(self, name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Value) -> Vec<(String, Value)> + Send + Sync + 'static,
    {
        self.rule(FieldKind::Attribute, name, transform)
    }

    /// The transform receives the whole relationship object.
    pub fn relationship<F>(self, name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Value) -> Vec<(String, Value)> + Send + Sync + 'static,
    {
        self.rule(FieldKind::Relationship, name, transform)
    }

    /// Copy an attribute's value to each of `keys`.
    pub fn attribute_keys<I, K>(self, name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.attribute(name, move |value| {
            keys.iter().map(|k| (k.clone(), value.clone())).collect()
        })
    }

    /// Derive relationship keys from `prefix` instead of the relationship name.
    pub fn relationship_prefix(self, name: impl Into<String>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.relationship(name, move |rel| default_relationship_pairs(&prefix, rel))
    }

    pub fn key_format(mut self, key_format: KeyFormat) -> Self {
        self.key_format = key_format;
        self
    }

    /// Whether attributes and relationships without a rule are kept.
    pub fn passthrough(mut self, passthrough: bool) -> Self {
        self.passthrough = passthrough;
        self
    }

    /// Look up the rule for a source member.
    ///
    /// Returns `None` when the member has no rule and passthrough is disabled.
    pub fn resolve(&self, kind: FieldKind, source: &str) -> Option<ResolvedRule<'_>> {
        if let Some(transform) = self.rules.get(&(kind, source.to_string())) {
            return Some(ResolvedRule::Explicit(transform));
        }
        match kind {
            FieldKind::Type | FieldKind::Id => Some(ResolvedRule::Default),
            FieldKind::Attribute | FieldKind::Relationship if self.passthrough => {
                Some(ResolvedRule::Default)
            }
            _ => None,
        }
    }

    /// Apply the resolved rule for a source member to its value.
    pub fn apply(&self, kind: FieldKind, source: &str, value: &Value) -> Vec<(String, Value)> {
        match self.resolve(kind, source) {
            Some(ResolvedRule::Explicit(transform)) => transform(value),
            Some(ResolvedRule::Default) => self.default_pairs(kind, source, value),
            None => Vec::new(),
        }
    }

    fn default_pairs(&self, kind: FieldKind, source: &str, value: &Value) -> Vec<(String, Value)> {
        match kind {
            FieldKind::Type | FieldKind::Id => vec![(source.to_string(), value.clone())],
            FieldKind::Attribute => vec![(self.key_format.apply(source), value.clone())],
            FieldKind::Relationship => {
                default_relationship_pairs(&self.key_format.apply(source), value)
            }
        }
    }
}

/// To-one linkage becomes `{prefix}_id` / `{prefix}_type`,
/// to-many linkage becomes `{prefix}_ids` / `{prefix}_types`.
fn default_relationship_pairs(prefix: &str, relationship: &Value) -> Vec<(String, Value)> {
    match relationship.get("data") {
        Some(Value::Array(items)) => {
            let ids = items.iter().map(|i| linkage_member(i, "id")).collect();
            let types = items.iter().map(|i| linkage_member(i, "type")).collect();
            vec![
                (format!("{prefix}_ids"), Value::Array(ids)),
                (format!("{prefix}_types"), Value::Array(types)),
            ]
        }
        Some(linkage) => vec![
            (format!("{prefix}_id"), linkage_member(linkage, "id")),
            (format!("{prefix}_type"), linkage_member(linkage, "type")),
        ],
        None => Vec::new(),
    }
}

fn linkage_member(linkage: &Value, member: &str) -> Value {
    linkage.get(member).cloned().unwrap_or(Value::Null)
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn underscore(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for c in key.chars() {
        if c == '-' || c == ' ' {
            out.push('_');
            prev_lower = false;
        } else if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

fn camelize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' || c == '-' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

// --- Declarative form ---

/// Target key(s) for a renamed attribute.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TargetKeys {
    One(String),
    Many(Vec<String>),
}

impl TargetKeys {
    fn into_vec(self) -> Vec<String> {
        match self {
            TargetKeys::One(key) => vec![key],
            TargetKeys::Many(keys) => keys,
        }
    }
}

/// Serde-loadable description of a [`FieldMapping`].
///
/// ```json
/// {
///   "attributes": { "name": "first_name", "email": ["email", "login"] },
///   "relationships": { "author": "writer" },
///   "key_format": "underscore",
///   "passthrough": true
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingSpec {
    /// Target key for the resource type.
    #[serde(rename = "type")]
    pub type_key: Option<String>,
    /// Target key for the resource id.
    pub id: Option<String>,
    pub attributes: BTreeMap<String, TargetKeys>,
    /// Relationship name to key prefix.
    pub relationships: BTreeMap<String, String>,
    pub key_format: String,
    pub passthrough: bool,
}

impl Default for MappingSpec {
    fn default() -> Self {
        Self {
            type_key: None,
            id: None,
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            key_format: "identity".to_string(),
            passthrough: true,
        }
    }
}

impl MappingSpec {
    /// Build the rule table.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::InvalidMapping` if `key_format` is not recognised.
    pub fn into_mapping(self) -> Result<FieldMapping, DocumentError> {
        let key_format =
            KeyFormat::parse(&self.key_format).ok_or_else(|| DocumentError::InvalidMapping {
                message: format!(
                    "unknown key format \"{}\": expected identity, capitalize, underscore, or camelize",
                    self.key_format
                ),
            })?;

        let mut mapping = FieldMapping::new()
            .key_format(key_format)
            .passthrough(self.passthrough);

        if let Some(key) = self.type_key {
            mapping = mapping.type_rule(move |v| vec![(key.clone(), v.clone())]);
        }
        if let Some(key) = self.id {
            mapping = mapping.id_rule(move |v| vec![(key.clone(), v.clone())]);
        }
        for (name, keys) in self.attributes {
            mapping = mapping.attribute_keys(name, keys.into_vec());
        }
        for (name, prefix) in self.relationships {
            mapping = mapping.relationship_prefix(name, prefix);
        }
        Ok(mapping)
    }
}
