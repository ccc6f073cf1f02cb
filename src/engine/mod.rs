//! Path-addressed mutation engine
//!
//! Every operation is pure: it takes a document and returns a new one. The
//! walk down a path copies only the records and lists it steps through; all
//! other subtrees stay shared with the input document.
//!
//! Section records have a fixed shape, so writing a field they do not have is
//! an error. Collection entries are open records and accept new fields.

mod collection;
mod shape;

pub use collection::{insert, remove, reorder};

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::document::{Document, EntryId, Node, Path, Step, ID_FIELD};

/// Error types for path resolution and mutation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path not found: {path}")]
    NotFound { path: String },

    #[error("not a record: {path}")]
    NotARecord { path: String },

    #[error("not a collection: {path}")]
    NotACollection { path: String },

    #[error("entry ids cannot be changed: {path}")]
    ImmutableId { path: String },

    #[error("duplicate entry id: {id}")]
    DuplicateId { id: EntryId },

    #[error("entry id cannot be used in a path: '{id}'")]
    InvalidId { id: String },

    #[error("collections change only by insert, remove and reorder: {path}")]
    CollectionReplaced { path: String },

    #[error("value has the wrong shape for {path}")]
    ShapeMismatch { path: String },

    #[error("the document root cannot be replaced")]
    EmptyPath,
}

impl PathError {
    fn not_found(path: &Path) -> Self {
        PathError::NotFound {
            path: path.to_string(),
        }
    }

    /// Error for stepping into `node`, which is not a record
    fn cannot_descend(node: &Node, path: &Path) -> Self {
        match node {
            Node::List(_) => PathError::NotARecord {
                path: path.to_string(),
            },
            _ => PathError::not_found(path),
        }
    }
}

/// Resolve a path to the node it addresses
pub fn get<'a>(doc: &'a Document, path: &Path) -> Result<&'a Node, PathError> {
    let mut node = doc.root();
    for step in path.steps() {
        let fields = node
            .as_record()
            .ok_or_else(|| PathError::cannot_descend(node, path))?;
        node = match step {
            Step::Field(name) => fields.get(name).ok_or_else(|| PathError::not_found(path))?,
            Step::Entry { collection, id } => {
                let items = fields
                    .get(collection)
                    .ok_or_else(|| PathError::not_found(path))?
                    .as_list()
                    .ok_or_else(|| PathError::NotACollection {
                        path: path.to_string(),
                    })?;
                find_entry(items, id)
                    .map(|(_, entry)| entry)
                    .ok_or_else(|| PathError::not_found(path))?
            }
        };
    }
    Ok(node)
}

/// Replace the value at `path`, returning the new document.
///
/// The value must have the shape of what it replaces: same kind, the same
/// fields for section records, and any collection inside it left as it is.
pub fn set(doc: &Document, path: &Path, value: Node) -> Result<Document, PathError> {
    update(doc, path, |current, open| {
        match current {
            Some(current) => shape::check_replacement(current, &value, open, path)?,
            None => shape::check_new_value(&value, path)?,
        }
        Ok(value)
    })
}

/// A single edit, as issued by an editor panel
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Set { path: Path, value: Node },
    Insert { collection: Path, entry: Node },
    Remove { collection: Path, id: EntryId },
    Reorder { collection: Path, from: usize, to: usize },
}

/// Result of applying a [`Mutation`]
#[derive(Clone, Debug)]
pub struct Applied {
    pub document: Document,

    /// Id assigned to an inserted entry
    pub inserted: Option<EntryId>,
}

impl Mutation {
    /// The path this mutation targets
    pub fn target(&self) -> &Path {
        match self {
            Mutation::Set { path, .. } => path,
            Mutation::Insert { collection, .. } => collection,
            Mutation::Remove { collection, .. } => collection,
            Mutation::Reorder { collection, .. } => collection,
        }
    }

    pub fn apply(&self, doc: &Document) -> Result<Applied, PathError> {
        let (document, inserted) = match self {
            Mutation::Set { path, value } => (set(doc, path, value.clone())?, None),
            Mutation::Insert { collection, entry } => {
                let (document, id) = insert(doc, collection, entry.clone())?;
                (document, Some(id))
            }
            Mutation::Remove { collection, id } => (remove(doc, collection, id)?, None),
            Mutation::Reorder {
                collection,
                from,
                to,
            } => (reorder(doc, collection, *from, *to)?, None),
        };
        Ok(Applied { document, inserted })
    }
}

/// Rebuild the document with the node at `path` replaced by
/// `f(current, open)`.
///
/// `f` receives `None` only when the path ends in a field that an open
/// record does not have yet. `open` tells whether the target sits inside a
/// collection entry.
pub(crate) fn update<F>(doc: &Document, path: &Path, f: F) -> Result<Document, PathError>
where
    F: FnOnce(Option<&Node>, bool) -> Result<Node, PathError>,
{
    if path.is_root() {
        return Err(PathError::EmptyPath);
    }
    let root = rewrite(doc.root(), path.steps(), Scope::SECTION, path, f)?;
    Document::from_root(root).ok_or(PathError::EmptyPath)
}

/// Where the walk currently is, relative to collection entries
#[derive(Clone, Copy)]
struct Scope {
    /// Inside a collection entry, where new fields may be created
    open: bool,

    /// The current node is itself a collection entry
    at_entry: bool,
}

impl Scope {
    const SECTION: Scope = Scope {
        open: false,
        at_entry: false,
    };
    const ENTRY: Scope = Scope {
        open: true,
        at_entry: true,
    };
}

fn rewrite<F>(node: &Node, steps: &[Step], scope: Scope, path: &Path, f: F) -> Result<Node, PathError>
where
    F: FnOnce(Option<&Node>, bool) -> Result<Node, PathError>,
{
    let Some((step, rest)) = steps.split_first() else {
        return f(Some(node), scope.open);
    };

    let fields = node
        .as_record()
        .ok_or_else(|| PathError::cannot_descend(node, path))?;

    match step {
        Step::Field(name) => {
            if scope.at_entry && name == ID_FIELD {
                return Err(PathError::ImmutableId {
                    path: path.to_string(),
                });
            }
            let child_scope = Scope {
                open: scope.open,
                at_entry: false,
            };
            let replacement = match fields.get(name) {
                Some(child) => rewrite(child, rest, child_scope, path, f)?,
                None if scope.open && rest.is_empty() => f(None, true)?,
                None => return Err(PathError::not_found(path)),
            };
            Ok(with_field(fields, name, replacement))
        }
        Step::Entry { collection, id } => {
            let items = fields
                .get(collection)
                .ok_or_else(|| PathError::not_found(path))?
                .as_list()
                .ok_or_else(|| PathError::NotACollection {
                    path: path.to_string(),
                })?;
            let (index, entry) = find_entry(items, id).ok_or_else(|| PathError::not_found(path))?;

            let replacement = rewrite(entry, rest, Scope::ENTRY, path, f)?;
            if replacement.entry_id() != Some(id.as_str()) {
                return Err(PathError::ImmutableId {
                    path: path.to_string(),
                });
            }

            let mut items = items.to_vec();
            items[index] = replacement;
            Ok(with_field(fields, collection, Node::List(Arc::new(items))))
        }
    }
}

/// Shallow copy of a record with one field replaced
fn with_field(fields: &BTreeMap<String, Node>, name: &str, value: Node) -> Node {
    let mut fields = fields.clone();
    fields.insert(name.to_string(), value);
    Node::Record(Arc::new(fields))
}

pub(crate) fn find_entry<'a>(items: &'a [Node], id: &EntryId) -> Option<(usize, &'a Node)> {
    items
        .iter()
        .enumerate()
        .find(|(_, entry)| entry.entry_id() == Some(id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[test]
    fn test_get_resolves_fields_and_entries() {
        let doc = schema::defaults();

        let name = get(&doc, &path("site.name")).unwrap();
        assert_eq!(name.as_str(), Some(schema::INSTITUTE_NAME));

        let question = get(&doc, &path("faqs.list[faq-2].question")).unwrap();
        assert!(question.as_str().is_some());

        assert_eq!(
            get(&doc, &path("site.nickname")),
            Err(PathError::NotFound {
                path: "site.nickname".into()
            })
        );
        assert!(matches!(
            get(&doc, &path("faqs.list[missing]")),
            Err(PathError::NotFound { .. })
        ));
        assert!(matches!(
            get(&doc, &path("site.name[x]")),
            Err(PathError::NotACollection { .. })
        ));
        assert!(matches!(
            get(&doc, &path("site.name.first")),
            Err(PathError::NotFound { .. })
        ));
        assert!(matches!(
            get(&doc, &path("faqs.list.first")),
            Err(PathError::NotARecord { .. })
        ));
    }

    #[test]
    fn test_set_shares_untouched_subtrees() {
        let doc = schema::defaults();
        let updated = set(&doc, &path("site.name"), Node::text("Riverside Academy")).unwrap();

        assert_eq!(
            get(&updated, &path("site.name")).unwrap().as_str(),
            Some("Riverside Academy")
        );
        // the original is untouched
        assert_eq!(
            get(&doc, &path("site.name")).unwrap().as_str(),
            Some(schema::INSTITUTE_NAME)
        );

        for section in ["courses", "faqs", "legal", "home"] {
            assert!(doc
                .section(section)
                .unwrap()
                .shares_with(updated.section(section).unwrap()));
        }
        assert!(!doc.section("site").unwrap().shares_with(updated.section("site").unwrap()));
        assert!(doc
            .section("site")
            .unwrap()
            .get("socials")
            .unwrap()
            .shares_with(updated.section("site").unwrap().get("socials").unwrap()));
    }

    #[test]
    fn test_set_then_restore_is_identity() {
        let doc = schema::defaults();
        let p = path("home.hero.title");
        let original = get(&doc, &p).unwrap().clone();

        let changed = set(&doc, &p, Node::text("Learn faster")).unwrap();
        assert_ne!(changed, doc);
        let restored = set(&changed, &p, original).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_set_inside_collection_entry() {
        let doc = schema::defaults();
        let p = path("faqs.list[faq-3].answer");
        let updated = set(&doc, &p, Node::text("Yes, on weekends.")).unwrap();

        assert_eq!(get(&updated, &p).unwrap().as_str(), Some("Yes, on weekends."));
        let before = get(&doc, &path("faqs.list")).unwrap().as_list().unwrap();
        let after = get(&updated, &path("faqs.list")).unwrap().as_list().unwrap();
        assert_eq!(before.len(), after.len());
        // sibling entries are shared, the edited one is a fresh copy
        assert!(before[0].shares_with(&after[0]));
        assert!(!before[2].shares_with(&after[2]));
    }

    #[test]
    fn test_closed_records_reject_unknown_fields() {
        let doc = schema::defaults();
        let result = set(&doc, &path("site.slogan"), Node::text("x"));
        assert_eq!(
            result,
            Err(PathError::NotFound {
                path: "site.slogan".into()
            })
        );
    }

    #[test]
    fn test_entries_accept_new_fields() {
        let doc = schema::defaults();
        let p = path("faqs.list[faq-1].highlighted");
        let updated = set(&doc, &p, Node::bool(true)).unwrap();
        assert_eq!(get(&updated, &p).unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_entry_ids_are_immutable() {
        let doc = schema::defaults();
        assert!(matches!(
            set(&doc, &path("faqs.list[faq-1].id"), Node::text("faq-99")),
            Err(PathError::ImmutableId { .. })
        ));

        let replacement = Node::record([("id", Node::text("other")), ("question", Node::text("Q"))]);
        assert!(matches!(
            set(&doc, &path("faqs.list[faq-1]"), replacement),
            Err(PathError::ImmutableId { .. })
        ));

        let same_id = Node::record([("id", Node::text("faq-1")), ("question", Node::text("Q"))]);
        let updated = set(&doc, &path("faqs.list[faq-1]"), same_id).unwrap();
        assert_eq!(
            get(&updated, &path("faqs.list[faq-1].question")).unwrap().as_str(),
            Some("Q")
        );
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let doc = schema::defaults();
        assert!(matches!(
            set(&doc, &path("home.hero"), Node::text("flat")),
            Err(PathError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            set(&doc, &path("faqs.list"), Node::record([("a", Node::Null)])),
            Err(PathError::ShapeMismatch { .. })
        ));
        // scalar kinds may replace each other
        assert!(set(&doc, &path("site.logo"), Node::Null).is_ok());
        assert_eq!(set(&doc, &Path::root(), Node::Null), Err(PathError::EmptyPath));
    }

    #[test]
    fn test_section_records_keep_their_fields() {
        let doc = schema::defaults();
        let result = set(&doc, &path("home.hero"), Node::record([("bogus", Node::int(1))]));
        assert!(matches!(result, Err(PathError::ShapeMismatch { .. })));

        // replacing the whole record with the same fields is fine
        let hero = get(&doc, &path("home.hero")).unwrap().as_record().unwrap();
        let mut fields = hero.clone();
        fields.insert("title".into(), Node::text("Start here"));
        let updated = set(&doc, &path("home.hero"), Node::Record(Arc::new(fields))).unwrap();
        assert_eq!(
            get(&updated, &path("home.hero.title")).unwrap().as_str(),
            Some("Start here")
        );
        assert!(set(&updated, &path("home.hero.subtitle"), Node::text("t")).is_ok());
    }

    #[test]
    fn test_collections_are_not_replaced_through_set() {
        let doc = schema::defaults();
        let entry = |id: &str| Node::record([("id", Node::text(id))]);

        let duplicated = Node::list([
            entry("a"),
            entry("a"),
            Node::record([("question", Node::text("no id"))]),
        ]);
        assert_eq!(
            set(&doc, &path("faqs.list"), duplicated),
            Err(PathError::CollectionReplaced {
                path: "faqs.list".into()
            })
        );

        let mut faqs = get(&doc, &path("faqs")).unwrap().as_record().unwrap().clone();
        faqs.insert("list".into(), Node::list([entry("faq-renamed")]));
        assert!(matches!(
            set(&doc, &path("faqs"), Node::Record(Arc::new(faqs))),
            Err(PathError::CollectionReplaced { .. })
        ));

        // a section may be rewritten when its collection is left alone
        let mut faqs = get(&doc, &path("faqs")).unwrap().as_record().unwrap().clone();
        faqs.insert("title".into(), Node::text("Questions"));
        assert!(set(&doc, &path("faqs"), Node::Record(Arc::new(faqs))).is_ok());
    }

    #[test]
    fn test_new_entry_fields_bring_valid_collections() {
        let doc = schema::defaults();
        let section = |id: &str| Node::record([("id", Node::text(id)), ("body", Node::text(""))]);

        let p = path("faqs.list[faq-1].links");
        assert!(matches!(
            set(&doc, &p, Node::list([section("s"), section("s")])),
            Err(PathError::DuplicateId { .. })
        ));
        let updated = set(&doc, &p, Node::list([section("s-1"), section("s-2")])).unwrap();
        assert!(get(&updated, &path("faqs.list[faq-1].links[s-2]")).is_ok());
    }

    #[test]
    fn test_mutation_apply_reports_inserted_id() {
        let doc = schema::defaults();
        let mutation = Mutation::Insert {
            collection: path("notices.list"),
            entry: Node::record([("title", Node::text("Exam dates"))]),
        };
        let applied = mutation.apply(&doc).unwrap();
        let id = applied.inserted.unwrap();
        assert_eq!(mutation.target(), &path("notices.list"));
        assert!(get(&applied.document, &Path::root().field("notices").entry("list", id)).is_ok());
    }
}
