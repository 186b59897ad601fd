//! Document tree the filter engine evaluates against.
//!
//! A [`Node`] is a JSON-like tree with one addition: binary scalars, which
//! SCIM resources carry for attributes such as `x509Certificates.value`.
//! Documents are usually built from `serde_json::Value`; binary data is
//! rendered back to JSON as base64 text.
//!
//! ```rust
//! use scim_filter::document::Node;
//! use serde_json::json;
//!
//! let user = Node::from(json!({"userName": "bjensen", "emails": [{"value": "b@example.com"}]}));
//! assert_eq!(user.get("USERNAME").and_then(Node::as_str), Some("bjensen"));
//! ```

mod compare;
mod value;

pub(crate) use compare::{
    compare, equals, node_key, node_text, raw_equals, text_match, value_key, value_text,
};
pub use value::Value;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use std::fmt;

/// A node of a document tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    #[default]
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    Binary(Vec<u8>),
    Array(Vec<Node>),
    Object(Object),
}

impl Node {
    /// Name of the node type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Boolean(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Binary(_) => "binary",
            Node::Array(_) => "array",
            Node::Object(_) => "object",
        }
    }

    /// Whether the node counts as absent for presence and null-equality tests.
    ///
    /// Null is empty, and so is an array whose every element is empty.
    /// Every other node, including an empty object, is present.
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Null => true,
            Node::Array(items) => items.iter().all(Node::is_empty),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Node::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Node::Object(_))
    }

    /// Whether the node is a scalar (not an array or object).
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Node::Array(_) | Node::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Node::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Node::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Node::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Look up a member of an object node by attribute name.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.as_object().and_then(|object| object.get(name))
    }

    /// Parse a document from JSON text.
    pub fn from_json_str(json: &str) -> crate::error::FilterResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Ok(Node::from(value))
    }
}

/// Insertion-ordered attribute map of an object node.
///
/// Lookups try an exact name match first and fall back to an ASCII
/// case-insensitive match, since SCIM attribute names are case-insensitive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    members: Vec<(String, Node)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|(key, _)| key == name)
            .or_else(|| {
                self.members
                    .iter()
                    .position(|(key, _)| key.eq_ignore_ascii_case(name))
            })
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.position(name).map(|index| &self.members[index].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.position(name).map(|index| &mut self.members[index].1)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Insert a member, replacing an existing one with the same name.
    /// Returns the replaced node.
    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<Node>) -> Option<Node> {
        let name = name.into();
        let node = node.into();
        match self.members.iter().position(|(key, _)| *key == name) {
            Some(index) => Some(std::mem::replace(&mut self.members[index].1, node)),
            None => {
                self.members.push((name, node));
                None
            }
        }
    }

    /// Remove a member, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.position(name)
            .map(|index| self.members.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.members.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(key, _)| key.as_str())
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut object = Object::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Node::Null,
            serde_json::Value::Bool(b) => Node::Boolean(b),
            serde_json::Value::Number(n) => Node::Number(n),
            serde_json::Value::String(s) => Node::String(s),
            serde_json::Value::Array(items) => {
                Node::Array(items.into_iter().map(Node::from).collect())
            }
            serde_json::Value::Object(map) => Node::Object(map.into_iter().collect()),
        }
    }
}

impl From<Node> for serde_json::Value {
    fn from(node: Node) -> Self {
        match node {
            Node::Null => serde_json::Value::Null,
            Node::Boolean(b) => serde_json::Value::Bool(b),
            Node::Number(n) => serde_json::Value::Number(n),
            Node::String(s) => serde_json::Value::String(s),
            Node::Binary(bytes) => serde_json::Value::String(STANDARD.encode(bytes)),
            Node::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Node::Object(object) => serde_json::Value::Object(
                object
                    .members
                    .into_iter()
                    .map(|(key, node)| (key, serde_json::Value::from(node)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Boolean(b) => Node::Boolean(b),
            Value::Number(n) => Node::Number(n),
            Value::String(s) => Node::String(s),
            Value::Binary(bytes) => Node::Binary(bytes),
        }
    }
}

impl From<Object> for Node {
    fn from(object: Object) -> Self {
        Node::Object(object)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Array(items)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Boolean(b)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Number(n.into())
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Node::Number(n.into())
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Boolean(b) => serializer.serialize_bool(*b),
            Node::Number(n) => n.serialize(serializer),
            Node::String(s) => serializer.serialize_str(s),
            Node::Binary(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            Node::Array(items) => serializer.collect_seq(items),
            Node::Object(object) => serializer.collect_map(object.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Node::from)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
