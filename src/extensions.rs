//! JSON:API extension negotiation.
//!
//! Clients declare extensions with the `ext` media type parameter:
//!
//! ```text
//! Content-Type: application/vnd.api+json; ext="bulk,jsonpatch"
//! ```
//!
//! An extension is active for a request only if it is both requested and
//! supported. Responses advertise `supported-ext` and the extensions the
//! handler delivered.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::MEDIA_TYPE;

/// Ordered set of extension names. Duplicates and empty names are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExtensionSet(Vec<String>);

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into().trim().to_string();
        if name.is_empty() || self.contains(&name) {
            return false;
        }
        self.0.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Names in `self` that are also in `other`, in `self`'s order.
    pub fn intersection(&self, other: &ExtensionSet) -> ExtensionSet {
        self.iter().filter(|n| other.contains(n)).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ExtensionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ExtensionSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl From<Vec<String>> for ExtensionSet {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

impl From<ExtensionSet> for Vec<String> {
    fn from(set: ExtensionSet) -> Self {
        set.0
    }
}

/// Parses a comma-separated list such as `bulk,jsonpatch`.
impl FromStr for ExtensionSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split(',').collect())
    }
}

impl fmt::Display for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// Extensions requested by the `ext` parameter of a `Content-Type` header.
///
/// Returns an empty set if the header is missing, has no `ext` parameter,
/// or the parameter is empty.
pub fn parse_requested(content_type: Option<&str>) -> ExtensionSet {
    let Some(header) = content_type else {
        return ExtensionSet::new();
    };

    header
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("ext"))
        .map(|(_, value)| unquote(value.trim()).parse().unwrap_or_default())
        .unwrap_or_default()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// True iff `name` is both requested and supported.
pub fn is_extension_active(name: &str, requested: &ExtensionSet, supported: &ExtensionSet) -> bool {
    supported.contains(name) && requested.contains(name)
}

/// Requested extensions that are supported.
///
/// Unsupported requests are not an error; they are left inactive.
pub fn active_extensions(requested: &ExtensionSet, supported: &ExtensionSet) -> ExtensionSet {
    for name in requested.iter().filter(|n| !supported.contains(n)) {
        tracing::debug!(extension = name, "requested extension is not supported");
    }
    requested.intersection(supported)
}

/// Media type parameters for a response.
///
/// Produces `supported-ext="..."` followed by `ext="..."`, joined with `; `.
/// `delivered` is emitted as given, even if an extension is not in
/// `supported`. Empty lists are omitted; returns `None` if both are empty.
pub fn negotiate_response_extensions(
    delivered: &ExtensionSet,
    supported: &ExtensionSet,
) -> Option<String> {
    let mut params = Vec::new();
    if !supported.is_empty() {
        params.push(format!("supported-ext=\"{}\"", supported));
    }
    if !delivered.is_empty() {
        params.push(format!("ext=\"{}\"", delivered));
    }

    if params.is_empty() {
        None
    } else {
        Some(params.join("; "))
    }
}

/// Full `Content-Type` value for a response.
pub fn response_content_type(delivered: &ExtensionSet, supported: &ExtensionSet) -> String {
    match negotiate_response_extensions(delivered, supported) {
        Some(params) => format!("{}; {}", MEDIA_TYPE, params),
        None => MEDIA_TYPE.to_string(),
    }
}
