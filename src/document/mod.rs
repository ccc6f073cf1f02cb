//! Content document model
//!
//! The whole editable site lives in one tree of [`Node`]s. Records and lists
//! sit behind `Arc`, so cloning a document is cheap and every edit can share
//! the subtrees it did not touch with the version it was derived from.

mod node;
pub mod path;

pub use node::{Node, NodeKind};
pub use path::{ParsePathError, Path, Step};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::engine::{self, PathError};

/// Field holding the stable identifier of a collection entry
pub const ID_FIELD: &str = "id";

/// Stable identifier of one entry inside a collection
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh identifier that cannot collide with any existing entry
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `id` can be written in a path: non-empty, without `.`, `[`
    /// or `]`
    pub fn is_valid(id: &str) -> bool {
        !id.is_empty() && !id.contains(['.', '[', ']'])
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The site content document.
///
/// The root is always a record of named sections. Equality is structural.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Build a document from its top-level sections
    pub fn from_sections(sections: BTreeMap<String, Node>) -> Self {
        Self {
            root: Node::Record(Arc::new(sections)),
        }
    }

    /// Wrap a root node, which must be a record
    pub(crate) fn from_root(root: Node) -> Option<Self> {
        match root {
            Node::Record(_) => Some(Self { root }),
            _ => None,
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Get a top-level section by name
    pub fn section(&self, name: &str) -> Option<&Node> {
        self.root.get(name)
    }

    /// Names of the top-level sections, in key order
    pub fn section_names(&self) -> Vec<&str> {
        self.root
            .as_record()
            .map(|fields| fields.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Resolve a path to the node it addresses
    pub fn get(&self, path: &Path) -> Result<&Node, PathError> {
        engine::get(self, path)
    }

    /// Whether both documents are the very same version (not just equal)
    pub fn ptr_eq(&self, other: &Document) -> bool {
        self.root.shares_with(&other.root)
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.root.to_json()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let root = Node::deserialize(deserializer)?;
        Document::from_root(root)
            .ok_or_else(|| serde::de::Error::custom("document root must be an object"))
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self.root) {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_rejects_non_object_root() {
        let result: Result<Document, _> = serde_json::from_str("[1, 2, 3]");
        assert!(result.is_err());

        let doc: Document = serde_json::from_str(r#"{"site": {"name": "X"}}"#).unwrap();
        assert_eq!(doc.section_names(), vec!["site"]);
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = EntryId::generate();
        let b = EntryId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
        assert!(EntryId::is_valid(a.as_str()));
    }

    #[test]
    fn test_id_validity_matches_path_syntax() {
        for id in ["faq-1", "course_web", "7"] {
            assert!(EntryId::is_valid(id));
            let path = Path::root().field("faqs").entry("list", id);
            assert_eq!(path.to_string().parse::<Path>().unwrap(), path);
        }
        for id in ["", "a.b", "x]", "[y"] {
            assert!(!EntryId::is_valid(id));
        }
    }

    #[test]
    fn test_clone_is_same_version() {
        let doc: Document = serde_json::from_str(r#"{"faqs": {"list": []}}"#).unwrap();
        let copy = doc.clone();
        assert!(doc.ptr_eq(&copy));

        let rebuilt: Document = serde_json::from_str(r#"{"faqs": {"list": []}}"#).unwrap();
        assert_eq!(doc, rebuilt);
        assert!(!doc.ptr_eq(&rebuilt));
    }
}
