//! Shape rules for values written by `set` and `insert`
//!
//! A value replacing a section record must have exactly that record's fields.
//! Collections are never replaced as a whole; their entries change through
//! `insert`, `remove` and `reorder`, or through entry paths. New values that
//! bring their own collections must carry a usable, unique id on every entry.

use std::collections::{BTreeMap, HashSet};

use super::PathError;
use crate::document::{EntryId, Node, Path, ID_FIELD};

fn mismatch(path: &Path) -> PathError {
    PathError::ShapeMismatch {
        path: path.to_string(),
    }
}

/// A list holding records is a collection
fn is_collection(items: &[Node]) -> bool {
    items.iter().any(|item| matches!(item, Node::Record(_)))
}

/// Check that `value` may replace `current`. `open` is false inside section
/// records and true inside collection entries.
pub(super) fn check_replacement(
    current: &Node,
    value: &Node,
    open: bool,
    path: &Path,
) -> Result<(), PathError> {
    if current.kind() != value.kind() {
        return Err(mismatch(path));
    }

    match (current, value) {
        (Node::Record(old), Node::Record(new)) => {
            if !open && !same_fields(old, new) {
                return Err(mismatch(path));
            }
            for (name, child) in new.iter() {
                match old.get(name) {
                    Some(previous) => check_replacement(previous, child, open, path)?,
                    None => check_new_value(child, path)?,
                }
            }
            Ok(())
        }
        (Node::List(old), Node::List(new)) => {
            if (is_collection(old) || is_collection(new)) && old != new {
                return Err(PathError::CollectionReplaced {
                    path: path.to_string(),
                });
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn same_fields(old: &BTreeMap<String, Node>, new: &BTreeMap<String, Node>) -> bool {
    old.len() == new.len() && old.keys().all(|name| new.contains_key(name))
}

/// Check a value that has no counterpart in the document yet
pub(super) fn check_new_value(value: &Node, path: &Path) -> Result<(), PathError> {
    match value {
        Node::Record(fields) => fields
            .values()
            .try_for_each(|child| check_new_value(child, path)),
        Node::List(items) if is_collection(items) => {
            let mut seen = HashSet::new();
            for item in items.iter() {
                let Node::Record(fields) = item else {
                    return Err(mismatch(path));
                };
                let id = check_entry_id(item, path)?;
                if !seen.insert(id.clone()) {
                    return Err(PathError::DuplicateId { id });
                }
                fields
                    .values()
                    .try_for_each(|child| check_new_value(child, path))?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// The entry's id, which must be text that a path can address
pub(super) fn check_entry_id(entry: &Node, path: &Path) -> Result<EntryId, PathError> {
    match entry.get(ID_FIELD) {
        Some(Node::Text(id)) if EntryId::is_valid(id) => Ok(EntryId::new(id.as_str())),
        Some(Node::Text(id)) => Err(PathError::InvalidId { id: id.clone() }),
        _ => Err(mismatch(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Path {
        Path::root().field("x")
    }

    fn entry(id: &str) -> Node {
        Node::record([("id", Node::text(id))])
    }

    #[test]
    fn test_closed_record_needs_same_fields() {
        let current = Node::record([("title", Node::text("a")), ("visible", Node::bool(true))]);
        let renamed = Node::record([("bogus", Node::int(1))]);
        let trimmed = Node::record([("title", Node::text("b"))]);
        let edited = Node::record([("title", Node::text("b")), ("visible", Node::bool(false))]);

        assert!(check_replacement(&current, &renamed, false, &here()).is_err());
        assert!(check_replacement(&current, &trimmed, false, &here()).is_err());
        assert!(check_replacement(&current, &edited, false, &here()).is_ok());
        // entries may gain or lose fields
        assert!(check_replacement(&current, &trimmed, true, &here()).is_ok());
    }

    #[test]
    fn test_collections_cannot_be_swapped() {
        let current = Node::list([entry("a"), entry("b")]);
        assert!(check_replacement(&current, &current.clone(), false, &here()).is_ok());
        assert_eq!(
            check_replacement(&current, &Node::list([entry("b"), entry("a")]), false, &here()),
            Err(PathError::CollectionReplaced { path: "x".into() })
        );

        let plain = Node::list([Node::text("Labs")]);
        assert!(check_replacement(&plain, &Node::list([Node::text("Sports")]), false, &here()).is_ok());
        assert!(check_replacement(&Node::empty_list(), &Node::list([entry("a")]), false, &here()).is_err());
    }

    #[test]
    fn test_new_collections_need_usable_ids() {
        assert!(check_new_value(&Node::list([entry("a"), entry("b")]), &here()).is_ok());
        assert_eq!(
            check_new_value(&Node::list([entry("a"), entry("a")]), &here()),
            Err(PathError::DuplicateId { id: EntryId::new("a") })
        );
        assert_eq!(
            check_new_value(&Node::list([entry("a.b")]), &here()),
            Err(PathError::InvalidId { id: "a.b".into() })
        );
        let nested = Node::record([(
            "sections",
            Node::list([Node::record([("heading", Node::text("no id"))])]),
        )]);
        assert!(matches!(
            check_new_value(&nested, &here()),
            Err(PathError::ShapeMismatch { .. })
        ));
    }
}
