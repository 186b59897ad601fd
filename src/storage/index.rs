//! Attribute index backing filtered searches.
//!
//! Every stored document is flattened into `(path, key)` entries for scalar
//! values and `path` entries for present attributes. Equality and presence
//! leaves translate into [`IndexQuery`] lookups; everything else is widened
//! and left to the evaluator.

use crate::document::{self, Node};
use crate::filter::{Filter, Operator};
use crate::translator::Translator;
use std::collections::{BTreeSet, HashMap};

/// A lookup the attribute index can answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexQuery {
    /// Some value at `path` has the equality key `key`
    Equals { path: String, key: String },
    /// Some value at `path` is not empty
    Present { path: String },
    /// Every query matches
    All(Vec<IndexQuery>),
}

impl IndexQuery {
    fn parts(self) -> Vec<IndexQuery> {
        match self {
            IndexQuery::All(parts) => parts,
            other => vec![other],
        }
    }
}

/// Translator from filters to index lookups: non-negated `eq` and `pr` on
/// plain attribute paths, joined by `and`.
pub(crate) fn index_translator() -> Translator<IndexQuery> {
    Translator::builder()
        .with_and(|lhs: &IndexQuery, rhs: &IndexQuery| {
            let mut parts = lhs.clone().parts();
            parts.extend(rhs.clone().parts());
            Some(IndexQuery::All(parts))
        })
        .with_leaf(Operator::Eq, |filter, not| {
            if not {
                return None;
            }
            let path = index_path(filter)?;
            let key = document::value_key(filter.value()?)?;
            Some(IndexQuery::Equals { path, key })
        })
        .with_leaf(Operator::Pr, |filter, not| {
            if not {
                return None;
            }
            Some(IndexQuery::Present {
                path: index_path(filter)?,
            })
        })
        .build()
}

/// Dotted lowercase path of a leaf, when it has no namespace and no value
/// filters.
fn index_path(filter: &Filter) -> Option<String> {
    let path = filter.path()?;
    if path.namespace().is_some() || path.is_root() {
        return None;
    }
    let mut names = Vec::with_capacity(path.len());
    for element in path {
        if element.filter().is_some() {
            return None;
        }
        names.push(element.attribute().to_ascii_lowercase());
    }
    Some(names.join("."))
}

/// Inverted index of one collection.
#[derive(Debug, Default)]
pub(crate) struct AttributeIndex {
    values: HashMap<(String, String), BTreeSet<String>>,
    present: HashMap<String, BTreeSet<String>>,
}

impl AttributeIndex {
    pub(crate) fn insert(&mut self, id: &str, document: &Node) {
        let mut entries = Entries::default();
        entries.walk(document, "");
        for path in entries.present {
            self.present.entry(path).or_default().insert(id.to_string());
        }
        for entry in entries.values {
            self.values.entry(entry).or_default().insert(id.to_string());
        }
    }

    pub(crate) fn remove(&mut self, id: &str, document: &Node) {
        let mut entries = Entries::default();
        entries.walk(document, "");
        for path in entries.present {
            if let Some(ids) = self.present.get_mut(&path) {
                ids.remove(id);
                if ids.is_empty() {
                    self.present.remove(&path);
                }
            }
        }
        for entry in entries.values {
            if let Some(ids) = self.values.get_mut(&entry) {
                ids.remove(id);
                if ids.is_empty() {
                    self.values.remove(&entry);
                }
            }
        }
    }

    /// Ids of the documents matching `query`.
    pub(crate) fn lookup(&self, query: &IndexQuery) -> BTreeSet<String> {
        match query {
            IndexQuery::Equals { path, key } => self
                .values
                .get(&(path.clone(), key.clone()))
                .cloned()
                .unwrap_or_default(),
            IndexQuery::Present { path } => self.present.get(path).cloned().unwrap_or_default(),
            IndexQuery::All(parts) => {
                let mut parts = parts.iter();
                let Some(first) = parts.next() else {
                    return BTreeSet::new();
                };
                let mut ids = self.lookup(first);
                for part in parts {
                    if ids.is_empty() {
                        break;
                    }
                    let other = self.lookup(part);
                    ids.retain(|id| other.contains(id));
                }
                ids
            }
        }
    }
}

/// Index entries of a single document. Mirrors how the evaluator resolves
/// candidates: arrays are searched one level deep and descended into their
/// object elements.
#[derive(Default)]
struct Entries {
    values: BTreeSet<(String, String)>,
    present: BTreeSet<String>,
}

impl Entries {
    fn walk(&mut self, node: &Node, prefix: &str) {
        let Some(object) = node.as_object() else {
            return;
        };
        for (name, child) in object.iter() {
            let path = if prefix.is_empty() {
                name.to_ascii_lowercase()
            } else {
                format!("{}.{}", prefix, name.to_ascii_lowercase())
            };
            match child {
                Node::Array(items) => {
                    for item in items {
                        self.candidate(&path, item);
                    }
                    for item in items.iter().filter(|item| item.is_object()) {
                        self.walk(item, &path);
                    }
                }
                other => {
                    self.candidate(&path, other);
                    if other.is_object() {
                        self.walk(other, &path);
                    }
                }
            }
        }
    }

    fn candidate(&mut self, path: &str, node: &Node) {
        if !node.is_empty() {
            self.present.insert(path.to_string());
        }
        if let Some(key) = document::node_key(node) {
            self.values.insert((path.to_string(), key));
        }
    }
}
