//! Reconcile stored snapshots against the schema baseline
//!
//! Stored content may come from an older version of the editor, may be
//! partial, or may be damaged. Loading never fails: whatever cannot be used is
//! replaced by the baseline, section by section, and the problem is logged.

use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

use super::{Store, StoreError};
use crate::document::{Document, EntryId, Node, ID_FIELD};
use crate::schema;

/// Why a stored snapshot could not be used at all
#[derive(Error, Debug)]
enum LoadError {
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("snapshot root is {0}, expected an object")]
    NotAnObject(&'static str),
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse(raw: &str) -> Result<Map<String, Value>, LoadError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(LoadError::NotAnObject(describe(&other))),
    }
}

/// Turn raw stored text into a document of the baseline shape.
///
/// Absent or unusable snapshots yield [`schema::defaults`].
pub fn reconcile(raw: Option<&str>) -> Document {
    let baseline = schema::defaults();
    let Some(raw) = raw else {
        debug!("No stored content, starting from defaults");
        return baseline;
    };

    match parse(raw) {
        Ok(stored) => merge_sections(&baseline, &stored),
        Err(e) => {
            warn!("Discarding stored content: {}", e);
            baseline
        }
    }
}

/// Read the slot `key` from `store` and reconcile it.
///
/// A failed read is logged and treated as an empty slot.
pub fn load_from<S: Store + ?Sized>(store: &S, key: &str) -> Document {
    match store.read(key) {
        Ok(raw) => reconcile(raw.as_deref()),
        Err(e) => {
            warn!("Failed to read stored content '{}': {}", key, e);
            reconcile(None)
        }
    }
}

/// Serialize a document for storage
pub fn serialize(doc: &Document) -> Result<String, StoreError> {
    Ok(serde_json::to_string(doc)?)
}

fn merge_sections(baseline: &Document, stored: &Map<String, Value>) -> Document {
    let Some(sections) = baseline.root().as_record() else {
        return baseline.clone();
    };

    for name in stored.keys().filter(|k| !sections.contains_key(*k)) {
        debug!("Dropping unknown section '{}'", name);
    }

    let merged = sections
        .iter()
        .map(|(name, base)| {
            let node = match stored.get(name) {
                Some(value) => merge_node(base, value, name),
                None => {
                    debug!("Section '{}' missing from stored content, using defaults", name);
                    base.clone()
                }
            };
            (name.clone(), node)
        })
        .collect();

    Document::from_sections(merged)
}

fn merge_node(base: &Node, stored: &Value, at: &str) -> Node {
    match (base, stored) {
        (Node::Record(fields), Value::Object(obj)) => {
            for name in obj.keys().filter(|k| !fields.contains_key(*k)) {
                debug!("Dropping unknown field '{}.{}'", at, name);
            }
            Node::Record(Arc::new(
                fields
                    .iter()
                    .map(|(name, child)| {
                        let node = match obj.get(name) {
                            Some(value) => merge_node(child, value, &format!("{}.{}", at, name)),
                            None => child.clone(),
                        };
                        (name.clone(), node)
                    })
                    .collect(),
            ))
        }
        (Node::List(_), Value::Array(items)) => load_list(items, at),
        (Node::Record(_), other) | (Node::List(_), other) => {
            warn!(
                "Stored '{}' is {}, keeping the default {}",
                at,
                describe(other),
                if matches!(base, Node::List(_)) { "list" } else { "record" }
            );
            base.clone()
        }
        (_, Value::Object(_)) | (_, Value::Array(_)) => {
            warn!(
                "Stored '{}' is {}, keeping the default value",
                at,
                describe(stored)
            );
            base.clone()
        }
        (_, scalar) => Node::from(scalar),
    }
}

/// Collections replace the baseline list wholesale.
fn load_list(items: &[Value], at: &str) -> Node {
    let nodes = items.iter().map(Node::from).collect::<Vec<_>>();
    repair_list(&nodes, at)
}

/// Entries that are records get an id if they lack a usable one, and
/// duplicated ids are re-keyed. Collections nested in entries get the same
/// treatment.
fn repair_list(items: &[Node], at: &str) -> Node {
    let mut seen = HashSet::new();
    let nodes = items
        .iter()
        .map(|node| {
            let Node::Record(fields) = node else {
                return node.clone();
            };
            let mut fields = repair_fields(fields, at);
            let existing = node.entry_id().map(str::to_string);
            if let Some(id) = existing.as_deref().filter(|id| EntryId::is_valid(id)) {
                if seen.insert(id.to_string()) {
                    return Node::Record(Arc::new(fields));
                }
            }

            let id = EntryId::generate();
            match existing {
                Some(old) if EntryId::is_valid(&old) => {
                    warn!("Duplicate id '{}' in '{}', re-keyed as '{}'", old, at, id)
                }
                Some(old) => warn!("Unusable id '{}' in '{}', re-keyed as '{}'", old, at, id),
                None => warn!("Entry without id in '{}', assigned '{}'", at, id),
            }
            seen.insert(id.to_string());
            fields.insert(ID_FIELD.to_string(), Node::text(id.as_str()));
            Node::Record(Arc::new(fields))
        })
        .collect::<Vec<_>>();
    Node::List(Arc::new(nodes))
}

fn repair_fields(fields: &BTreeMap<String, Node>, at: &str) -> BTreeMap<String, Node> {
    fields
        .iter()
        .map(|(name, child)| {
            let child = match child {
                Node::List(items) => repair_list(items, &format!("{}.{}", at, name)),
                Node::Record(inner) => {
                    Node::Record(Arc::new(repair_fields(inner, &format!("{}.{}", at, name))))
                }
                other => other.clone(),
            };
            (name.clone(), child)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{NodeKind, Path};
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn at<'a>(doc: &'a Document, path: &str) -> &'a Node {
        doc.get(&path.parse::<Path>().unwrap()).unwrap()
    }

    /// Same sections, same record fields, same kinds at every record field
    fn same_shape(a: &Node, b: &Node) -> bool {
        match (a, b) {
            (Node::Record(x), Node::Record(y)) => {
                x.len() == y.len()
                    && x.iter()
                        .all(|(k, v)| y.get(k).is_some_and(|w| same_shape(v, w)))
            }
            _ => a.kind() == b.kind(),
        }
    }

    #[test]
    fn test_missing_or_malformed_snapshots_yield_defaults() {
        let defaults = schema::defaults();
        for raw in [
            None,
            Some(""),
            Some("{not json"),
            Some("null"),
            Some("42"),
            Some("\"text\""),
            Some("[1, 2]"),
        ] {
            let doc = reconcile(raw);
            assert_eq!(doc, defaults, "input {:?}", raw);
        }
    }

    #[test]
    fn test_courses_only_snapshot_keeps_other_defaults() {
        let defaults = schema::defaults();
        let doc = reconcile(Some(r#"{"courses":{"list":[]}}"#));

        assert_eq!(at(&doc, "courses.list").as_list().map(|l| l.len()), Some(0));
        assert_eq!(at(&doc, "courses.title"), at(&defaults, "courses.title"));
        assert_eq!(
            at(&doc, "site.name").as_str(),
            Some(schema::INSTITUTE_NAME)
        );
        for section in schema::SECTIONS.iter().filter(|s| **s != "courses") {
            assert_eq!(doc.section(section), defaults.section(section));
        }
    }

    #[test]
    fn test_partial_snapshot_fills_only_missing_section() {
        let mut stored = serde_json::to_value(schema::defaults()).unwrap();
        stored["site"]["name"] = json!("Harbourview College");
        stored["faqs"]["list"] = json!([{"id": "only", "question": "Q", "answer": "A"}]);
        stored.as_object_mut().unwrap().remove("legal");

        let doc = reconcile(Some(&stored.to_string()));

        assert_eq!(at(&doc, "site.name").as_str(), Some("Harbourview College"));
        assert_eq!(at(&doc, "faqs.list").as_list().unwrap().len(), 1);
        assert_eq!(doc.section("legal"), schema::defaults().section("legal"));
        assert!(same_shape(doc.root(), schema::defaults().root()));
    }

    #[test]
    fn test_damaged_section_does_not_affect_siblings() {
        let raw = json!({
            "legal": "corrupted",
            "home": {"hero": {"title": "Welcome", "visible": false}, "about": []},
            "site": {"name": "Kept", "socials": {"facebook": {"nested": true}}}
        });
        let doc = reconcile(Some(&raw.to_string()));
        let defaults = schema::defaults();

        assert_eq!(doc.section("legal"), defaults.section("legal"));
        assert_eq!(at(&doc, "home.hero.title").as_str(), Some("Welcome"));
        assert_eq!(at(&doc, "home.hero.visible").as_bool(), Some(false));
        assert_eq!(at(&doc, "home.hero.subtitle"), at(&defaults, "home.hero.subtitle"));
        assert_eq!(at(&doc, "home.about"), at(&defaults, "home.about"));
        assert_eq!(at(&doc, "site.name").as_str(), Some("Kept"));
        assert_eq!(
            at(&doc, "site.socials.facebook"),
            at(&defaults, "site.socials.facebook")
        );
        assert!(same_shape(doc.root(), defaults.root()));
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let raw = json!({"site": {"name": "X", "legacy_banner": "old.png"}, "shop": {}});
        let doc = reconcile(Some(&raw.to_string()));

        assert!(doc.section("shop").is_none());
        assert!(doc.section("site").unwrap().get("legacy_banner").is_none());
        assert_eq!(at(&doc, "site.name").kind(), NodeKind::Scalar);
    }

    #[test]
    fn test_collection_ids_are_repaired() {
        let raw = json!({
            "faqs": {"list": [
                {"id": "a", "question": "first"},
                {"question": "no id"},
                {"id": "a", "question": "duplicate"},
                {"id": 5, "question": "numeric id"}
            ]}
        });
        let doc = reconcile(Some(&raw.to_string()));
        let list = at(&doc, "faqs.list").as_list().unwrap();

        assert_eq!(list.len(), 4);
        assert_eq!(list[0].entry_id(), Some("a"));
        let ids: HashSet<_> = list.iter().map(|e| e.entry_id().unwrap()).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(list[2].get("question").and_then(Node::as_str), Some("duplicate"));
    }

    #[test]
    fn test_unaddressable_ids_are_rekeyed() {
        let raw = json!({
            "faqs": {"list": [
                {"id": "", "question": "empty"},
                {"id": "faq.2", "question": "dotted"},
                {"id": "faq-3", "question": "fine"}
            ]}
        });
        let doc = reconcile(Some(&raw.to_string()));
        let list = at(&doc, "faqs.list").as_list().unwrap();

        assert!(list.iter().all(|e| EntryId::is_valid(e.entry_id().unwrap())));
        assert_eq!(list[2].entry_id(), Some("faq-3"));
    }

    #[test]
    fn test_nested_collection_ids_are_repaired() {
        let raw = json!({
            "pages": {"list": [{
                "id": "page-about",
                "title": "About",
                "sections": [
                    {"id": "s", "heading": "History"},
                    {"id": "s", "heading": "Team"},
                    {"heading": "Contact"}
                ]
            }]}
        });
        let doc = reconcile(Some(&raw.to_string()));
        let sections = at(&doc, "pages.list[page-about].sections").as_list().unwrap();

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].entry_id(), Some("s"));
        let ids: HashSet<_> = sections.iter().map(|e| e.entry_id().unwrap()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(sections[1].get("heading").and_then(Node::as_str), Some("Team"));
    }

    #[test]
    fn test_plain_lists_are_left_alone() {
        let raw = json!({"gallery": {"categories": ["Labs", "Sports"]}});
        let doc = reconcile(Some(&raw.to_string()));
        assert_eq!(
            at(&doc, "gallery.categories"),
            &Node::list([Node::text("Labs"), Node::text("Sports")])
        );
    }

    #[test]
    fn test_serialize_round_trip() {
        let doc = schema::defaults();
        let text = serialize(&doc).unwrap();
        assert_eq!(reconcile(Some(&text)), doc);
    }

    #[test]
    fn test_load_from_store() {
        let store = MemoryStore::new();
        assert_eq!(load_from(&store, "content"), schema::defaults());

        store
            .write("content", r#"{"site": {"tagline": "Learn by doing"}}"#)
            .unwrap();
        let doc = load_from(&store, "content");
        assert_eq!(at(&doc, "site.tagline").as_str(), Some("Learn by doing"));
    }
}
