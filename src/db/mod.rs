// src/db/mod.rs

use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::AppError;

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// A model persisted as one document in its own collection.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;
}

/// Parameters of a list query. Results are always newest first
/// (`createdAt` descending, then `_id` descending).
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Equality filter on stored field names.
    pub filter: Document,
    /// Dotted paths removed from every returned document.
    pub exclude: Vec<&'static str>,
    pub skip: u64,
    pub limit: Option<i64>,
}

/// A partial update: fields to `$set` and dotted paths to `$unset`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    pub set: Document,
    pub unset: Vec<&'static str>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }
}

/// Storage seam used by the controllers.
///
/// `update` applies `changes` (`$set`, then `$unset`) and returns the document
/// as it is after the write; `update` and `delete` return `None` for an unknown id.
#[async_trait]
pub trait Store<T: Resource>: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Vec<T>, AppError>;

    async fn count(&self, filter: &Document) -> Result<u64, AppError>;

    async fn get(&self, id: &ObjectId) -> Result<Option<T>, AppError>;

    async fn insert(&self, item: &T) -> Result<(), AppError>;

    async fn update(&self, id: &ObjectId, changes: Changes) -> Result<Option<T>, AppError>;

    async fn delete(&self, id: &ObjectId) -> Result<Option<T>, AppError>;
}
