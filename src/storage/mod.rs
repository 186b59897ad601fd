//! Document storage searchable with filters.
//!
//! Documents live under hierarchical keys, `tenant_id` → `resource_type` →
//! `resource_id`. Searches translate a [`Filter`](crate::Filter) into lookups
//! against an attribute index (see [`IndexQuery`]) and confirm every
//! candidate with the [`Evaluator`](crate::Evaluator), so a search returns
//! exactly the documents the evaluator matches.
//!
//! # Example Usage
//!
//! ```rust
//! use scim_filter::storage::{InMemoryStorage, StorageKey};
//! use scim_filter::Node;
//! use serde_json::json;
//!
//! let storage = InMemoryStorage::new();
//!
//! // Put a document (works for both create and update)
//! let key = StorageKey::new("tenant1", "User", "123");
//! let user = Node::from(json!({"id": "123", "userName": "john.doe"}));
//! storage.put(key.clone(), user).unwrap();
//!
//! assert!(storage.get(&key).unwrap().is_some());
//! assert!(storage.delete(&key).unwrap());
//! ```

pub mod in_memory;
pub mod index;

pub use crate::error::{StorageError, StorageResult};
pub use in_memory::InMemoryStorage;
pub use index::IndexQuery;

use std::fmt;

/// A hierarchical key for identifying documents in storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    tenant_id: String,
    resource_type: String,
    resource_id: String,
}

impl StorageKey {
    pub fn new(
        tenant_id: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Create a prefix for listing documents of a type within a tenant.
    pub fn prefix(tenant_id: impl Into<String>, resource_type: impl Into<String>) -> StoragePrefix {
        StoragePrefix {
            tenant_id: tenant_id.into(),
            resource_type: resource_type.into(),
        }
    }

    /// The collection this key belongs to.
    pub(crate) fn collection(&self) -> StoragePrefix {
        StoragePrefix {
            tenant_id: self.tenant_id.clone(),
            resource_type: self.resource_type.clone(),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.tenant_id, self.resource_type, self.resource_id
        )
    }
}

/// A prefix for querying documents by tenant and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePrefix {
    tenant_id: String,
    resource_type: String,
}

impl StoragePrefix {
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Key of a document in this collection.
    pub fn key(&self, resource_id: impl Into<String>) -> StorageKey {
        StorageKey::new(
            self.tenant_id.clone(),
            self.resource_type.clone(),
            resource_id,
        )
    }
}

impl fmt::Display for StoragePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.resource_type)
    }
}
