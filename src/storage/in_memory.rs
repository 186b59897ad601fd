//! In-memory document store with filtered search.
//!
//! # Features
//!
//! * Thread-safe access with `std::sync::RwLock`, cheap to clone
//! * Tenant isolation through hierarchical keys
//! * Consistent ordering by resource id for list and search
//! * Filtered search through an attribute index, re-checked by the evaluator
//!
//! # Example Usage
//!
//! ```rust
//! use scim_filter::storage::{InMemoryStorage, StorageKey};
//! use scim_filter::{Filter, Node};
//! use serde_json::json;
//!
//! let storage = InMemoryStorage::new();
//! let key = StorageKey::new("tenant1", "User", "user123");
//! storage
//!     .put(key.clone(), Node::from(json!({"userName": "john.doe", "active": true})))
//!     .unwrap();
//!
//! let prefix = StorageKey::prefix("tenant1", "User");
//! let filter = Filter::parse(r#"userName eq "JOHN.DOE" and active eq true"#).unwrap();
//! let found = storage.search(&prefix, Some(&filter)).unwrap();
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].0, key);
//! ```

use super::index::{AttributeIndex, IndexQuery, index_translator};
use super::{StorageKey, StoragePrefix};
use crate::document::Node;
use crate::error::{StorageError, StorageResult};
use crate::evaluator::Evaluator;
use crate::filter::Filter;
use crate::translator::Translator;
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Collection {
    documents: BTreeMap<String, Node>,
    index: AttributeIndex,
}

/// Thread-safe in-memory storage.
///
/// Documents are grouped per [`StoragePrefix`] (tenant and resource type),
/// each collection carrying its own attribute index.
#[derive(Clone)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<StoragePrefix, Collection>>>,
    translator: Arc<Translator<IndexQuery>>,
    evaluator: Evaluator,
}

impl InMemoryStorage {
    /// Create a new empty in-memory storage instance.
    pub fn new() -> Self {
        Self::with_evaluator(Evaluator::new())
    }

    /// Storage whose searches match with the given evaluator.
    pub fn with_evaluator(evaluator: Evaluator) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            translator: Arc::new(index_translator()),
            evaluator,
        }
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, HashMap<StoragePrefix, Collection>>> {
        self.data.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, HashMap<StoragePrefix, Collection>>> {
        self.data.write().map_err(|_| StorageError::LockPoisoned)
    }

    /// Store a document, replacing any previous one, and return it.
    ///
    /// Only objects are accepted: the attribute index keys documents by
    /// their members, so any other node is refused with
    /// [`StorageError::InvalidDocument`].
    pub fn put(&self, key: StorageKey, document: Node) -> StorageResult<Node> {
        if !document.is_object() {
            return Err(StorageError::InvalidDocument {
                found: document.type_name(),
            });
        }
        let mut data = self.write()?;
        let collection = data.entry(key.collection()).or_default();
        if let Some(previous) = collection.documents.remove(key.resource_id()) {
            collection.index.remove(key.resource_id(), &previous);
        }
        collection.index.insert(key.resource_id(), &document);
        collection
            .documents
            .insert(key.resource_id().to_string(), document.clone());
        Ok(document)
    }

    pub fn get(&self, key: &StorageKey) -> StorageResult<Option<Node>> {
        let data = self.read()?;
        Ok(data
            .get(&key.collection())
            .and_then(|collection| collection.documents.get(key.resource_id()))
            .cloned())
    }

    /// Delete a document. Returns whether it existed.
    pub fn delete(&self, key: &StorageKey) -> StorageResult<bool> {
        let mut data = self.write()?;
        let Some(collection) = data.get_mut(&key.collection()) else {
            return Ok(false);
        };
        match collection.documents.remove(key.resource_id()) {
            Some(previous) => {
                collection.index.remove(key.resource_id(), &previous);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn exists(&self, key: &StorageKey) -> StorageResult<bool> {
        let data = self.read()?;
        Ok(data
            .get(&key.collection())
            .is_some_and(|collection| collection.documents.contains_key(key.resource_id())))
    }

    pub fn count(&self, prefix: &StoragePrefix) -> StorageResult<usize> {
        let data = self.read()?;
        Ok(data.get(prefix).map_or(0, |collection| collection.documents.len()))
    }

    /// A page of documents ordered by resource id.
    pub fn list(
        &self,
        prefix: &StoragePrefix,
        offset: usize,
        limit: usize,
    ) -> StorageResult<Vec<(StorageKey, Node)>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let data = self.read()?;
        let Some(collection) = data.get(prefix) else {
            return Ok(Vec::new());
        };
        Ok(collection
            .documents
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(id, document)| (prefix.key(id), document.clone()))
            .collect())
    }

    /// Documents matching `filter`, ordered by resource id. `None` matches
    /// every document.
    ///
    /// The filter is translated into index lookups; their union is a superset
    /// of the result, which the evaluator then narrows down exactly.
    pub fn search(
        &self,
        prefix: &StoragePrefix,
        filter: Option<&Filter>,
    ) -> StorageResult<Vec<(StorageKey, Node)>> {
        let queries = self.translator.translate(filter)?;
        let data = self.read()?;
        let Some(collection) = data.get(prefix) else {
            return Ok(Vec::new());
        };

        let candidates: BTreeSet<String> = if queries.is_empty() {
            collection.documents.keys().cloned().collect()
        } else {
            queries
                .iter()
                .flat_map(|query| collection.index.lookup(query))
                .collect()
        };
        debug!(
            "search in {}: {} index quer(ies), {} of {} document(s) to check",
            prefix,
            queries.len(),
            candidates.len(),
            collection.documents.len()
        );

        let mut results = Vec::with_capacity(candidates.len());
        for id in candidates {
            let Some(document) = collection.documents.get(&id) else {
                continue;
            };
            let matched = match filter {
                Some(filter) => self.evaluator.evaluate(filter, document)?,
                None => true,
            };
            if matched {
                results.push((prefix.key(&id), document.clone()));
            }
        }
        Ok(results)
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStorage")
            .field("translator", &self.translator)
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}
