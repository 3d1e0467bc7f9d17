//! JSON Pointers into an inbound JSON:API document.
//!
//! Every pointer is rooted at `/data`. Bulk documents qualify the root with
//! the resource's position in the submitted array (`/data/{i}`).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const DATA: &str = "data";

/// An RFC 6901 JSON Pointer rooted at the primary data of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerPath {
    segments: Vec<String>,
}

impl PointerPath {
    /// The pointer to the primary data, `/data`.
    pub fn root() -> Self {
        Self {
            segments: vec![DATA.to_string()],
        }
    }

    /// Parse a pointer string such as `/data/0/attributes/name`.
    ///
    /// Returns `None` if the string is not rooted at `/data`.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix('/')?;
        let segments: Vec<String> = rest.split('/').map(unescape_segment).collect();
        if segments.first().map(String::as_str) != Some(DATA) {
            return None;
        }
        Some(Self { segments })
    }

    /// `{self}/type`
    pub fn type_pointer(&self) -> Self {
        self.child("type")
    }

    /// `{self}/id`
    pub fn id_pointer(&self) -> Self {
        self.child("id")
    }

    /// `{self}/attributes/{name}`
    pub fn attribute(&self, name: &str) -> Self {
        self.child("attributes").child(name)
    }

    /// `{self}/relationships/{name}`
    pub fn relationship(&self, name: &str) -> Self {
        self.child("relationships").child(name)
    }

    /// `{self}/relationships/{name}/data`
    pub fn relationship_data(&self, name: &str) -> Self {
        self.relationship(name).child("data")
    }

    /// `{self}/relationships/{name}/data/{index}`, for to-many linkage.
    pub fn relationship_data_at(&self, name: &str, index: usize) -> Self {
        self.relationship_data(name).child(&index.to_string())
    }

    /// Qualify the pointer with a bulk index: `/data/...` becomes `/data/{index}/...`.
    pub fn with_index(&self, index: usize) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(DATA.to_string());
        segments.push(index.to_string());
        segments.extend(self.segments.iter().skip(1).cloned());
        Self { segments }
    }

    /// Unescaped path segments, starting with `data`.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub(crate) fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }
}

impl Default for PointerPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for PointerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", escape_segment(segment))?;
        }
        Ok(())
    }
}

impl PartialEq<str> for PointerPath {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for PointerPath {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl Serialize for PointerPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PointerPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PointerPath::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("pointer not rooted at /data: {s}")))
    }
}

// ~ -> ~0, / -> ~1
fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_pointers() {
        let root = PointerPath::root();
        assert_eq!(root.to_string(), "/data");
        assert_eq!(root.type_pointer().to_string(), "/data/type");
        assert_eq!(root.id_pointer().to_string(), "/data/id");
        assert_eq!(root.attribute("name").to_string(), "/data/attributes/name");
    }

    #[test]
    fn relationship_pointers() {
        let root = PointerPath::root();
        assert_eq!(
            root.relationship_data("author").to_string(),
            "/data/relationships/author/data"
        );
        assert_eq!(
            root.relationship_data_at("tags", 2).to_string(),
            "/data/relationships/tags/data/2"
        );
    }

    #[test]
    fn index_qualified_pointers() {
        let root = PointerPath::root().with_index(3);
        assert_eq!(root.to_string(), "/data/3");
        assert_eq!(root.attribute("email").to_string(), "/data/3/attributes/email");

        let attr = PointerPath::root().attribute("name").with_index(0);
        assert_eq!(attr.to_string(), "/data/0/attributes/name");
    }

    #[test]
    fn escapes_special_characters() {
        let pointer = PointerPath::root().attribute("a/b~c");
        assert_eq!(pointer.to_string(), "/data/attributes/a~1b~0c");
        assert_eq!(PointerPath::parse(&pointer.to_string()), Some(pointer));
    }

    #[test]
    fn parse_requires_data_root() {
        assert!(PointerPath::parse("/data/attributes/name").is_some());
        assert!(PointerPath::parse("/errors/0").is_none());
        assert!(PointerPath::parse("data/type").is_none());
        assert!(PointerPath::parse("").is_none());
    }

    #[test]
    fn compares_with_strings() {
        assert_eq!(PointerPath::root().type_pointer(), "/data/type");
    }

    #[test]
    fn serializes_as_string() {
        let pointer = PointerPath::root().with_index(1).attribute("name");
        let json = serde_json::to_value(&pointer).unwrap();
        assert_eq!(json, serde_json::json!("/data/1/attributes/name"));

        let back: PointerPath = serde_json::from_value(json).unwrap();
        assert_eq!(back, pointer);
    }
}
