//! Tree nodes with shared, copy-on-write containers

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::ID_FIELD;

/// A value in the content tree
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Arc<Vec<Node>>),
    Record(Arc<BTreeMap<String, Node>>),
}

/// Structural kind of a node, used for shape checks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    List,
    Record,
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    pub fn int(n: i64) -> Self {
        Node::Number(n.into())
    }

    pub fn bool(b: bool) -> Self {
        Node::Bool(b)
    }

    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        Node::Record(Arc::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn list(items: impl IntoIterator<Item = Node>) -> Self {
        Node::List(Arc::new(items.into_iter().collect()))
    }

    pub fn empty_list() -> Self {
        Node::List(Arc::new(Vec::new()))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Record(_) => NodeKind::Record,
            Node::List(_) => NodeKind::List,
            _ => NodeKind::Scalar,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Record(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Field of a record node
    pub fn get(&self, field: &str) -> Option<&Node> {
        self.as_record().and_then(|fields| fields.get(field))
    }

    /// The `id` of a collection entry, if this node is one
    pub fn entry_id(&self) -> Option<&str> {
        self.get(ID_FIELD).and_then(Node::as_str)
    }

    /// True when both nodes are the same shared container.
    ///
    /// Scalars never share; they are compared by value instead.
    pub fn shares_with(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Record(a), Node::Record(b)) => Arc::ptr_eq(a, b),
            (Node::List(a), Node::List(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::Text(s) => Value::String(s.clone()),
            Node::List(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Node {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => Node::Number(n.clone()),
            Value::String(s) => Node::Text(s.clone()),
            Value::Array(items) => Node::List(Arc::new(items.iter().map(Node::from).collect())),
            Value::Object(fields) => Node::Record(Arc::new(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Node::from(v)))
                    .collect(),
            )),
        }
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        Node::from(&value)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Number(n) => n.serialize(serializer),
            Node::Text(s) => serializer.serialize_str(s),
            Node::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Node::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip_keeps_structure() {
        let value = json!({
            "title": "Courses",
            "list": [{"id": "c1", "fee": 1200, "featured": true, "image": null}]
        });
        let node = Node::from(&value);

        assert_eq!(node.kind(), NodeKind::Record);
        assert_eq!(node.get("title").and_then(Node::as_str), Some("Courses"));
        let list = node.get("list").and_then(Node::as_list).unwrap();
        assert_eq!(list[0].entry_id(), Some("c1"));
        assert_eq!(node.to_json(), value);
        assert_eq!(serde_json::to_value(&node).unwrap(), value);
    }

    #[test]
    fn test_entry_id_requires_text() {
        let numeric = Node::from(json!({"id": 7}));
        assert_eq!(numeric.entry_id(), None);
        assert_eq!(Node::text("id").entry_id(), None);
    }

    #[test]
    fn test_clones_share_containers() {
        let node = Node::record([("items", Node::list([Node::int(1)]))]);
        let copy = node.clone();
        assert!(node.shares_with(&copy));
        assert!(node.get("items").unwrap().shares_with(copy.get("items").unwrap()));
        assert!(!Node::int(1).shares_with(&Node::int(1)));
    }
}
