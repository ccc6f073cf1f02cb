//! Collection operations: insert, remove and reorder entries by id

use std::sync::Arc;

use super::{find_entry, get, shape, update, PathError};
use crate::document::{Document, EntryId, Node, Path, ID_FIELD};

fn list_at<'a>(current: Option<&'a Node>, path: &Path) -> Result<&'a [Node], PathError> {
    current
        .and_then(Node::as_list)
        .ok_or_else(|| PathError::NotACollection {
            path: path.to_string(),
        })
}

/// Prepend `entry` to the collection at `collection`.
///
/// An entry without a text `id` gets a freshly generated one; a text `id` that
/// a path could not address is rejected. Returns the new document and the id
/// of the inserted entry.
pub fn insert(
    doc: &Document,
    collection: &Path,
    entry: Node,
) -> Result<(Document, EntryId), PathError> {
    let Node::Record(fields) = entry else {
        return Err(PathError::NotARecord {
            path: collection.to_string(),
        });
    };

    let (id, entry) = match fields.get(ID_FIELD).and_then(Node::as_str) {
        Some(id) if !EntryId::is_valid(id) => {
            return Err(PathError::InvalidId { id: id.to_string() })
        }
        Some(id) => (EntryId::new(id), Node::Record(fields)),
        None => {
            let id = EntryId::generate();
            let mut fields = (*fields).clone();
            fields.insert(ID_FIELD.to_string(), Node::text(id.as_str()));
            (id, Node::Record(Arc::new(fields)))
        }
    };

    shape::check_new_value(&entry, collection)?;

    let document = update(doc, collection, |current, _| {
        let items = list_at(current, collection)?;
        if find_entry(items, &id).is_some() {
            return Err(PathError::DuplicateId { id: id.clone() });
        }
        let mut next = Vec::with_capacity(items.len() + 1);
        next.push(entry);
        next.extend(items.iter().cloned());
        Ok(Node::List(Arc::new(next)))
    })?;

    Ok((document, id))
}

/// Remove the entry with `id` from the collection at `collection`
pub fn remove(doc: &Document, collection: &Path, id: &EntryId) -> Result<Document, PathError> {
    update(doc, collection, |current, _| {
        let items = list_at(current, collection)?;
        if find_entry(items, id).is_none() {
            return Err(PathError::NotFound {
                path: format!("{}[{}]", collection, id),
            });
        }
        let kept = items
            .iter()
            .filter(|entry| entry.entry_id() != Some(id.as_str()))
            .cloned()
            .collect();
        Ok(Node::List(Arc::new(kept)))
    })
}

/// Move the entry at index `from` to index `to`.
///
/// Out-of-range indices leave the document unchanged and return it as is.
pub fn reorder(
    doc: &Document,
    collection: &Path,
    from: usize,
    to: usize,
) -> Result<Document, PathError> {
    let len = get(doc, collection)?
        .as_list()
        .ok_or_else(|| PathError::NotACollection {
            path: collection.to_string(),
        })?
        .len();
    if from >= len || to >= len || from == to {
        return Ok(doc.clone());
    }

    update(doc, collection, |current, _| {
        let mut items = list_at(current, collection)?.to_vec();
        let moved = items.remove(from);
        items.insert(to, moved);
        Ok(Node::List(Arc::new(items)))
    })
}
