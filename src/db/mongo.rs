// src/db/mongo.rs

use std::marker::PhantomData;

use async_trait::async_trait;
use bson::{Bson, Document, doc, from_document, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};

use super::{Changes, ListQuery, Resource, Store};
use crate::error::AppError;

/// `Store` over a MongoDB collection. Documents travel as raw bson so
/// projections can drop fields the model would otherwise require.
pub struct MongoStore<T> {
    collection: Collection<Document>,
    _model: PhantomData<fn() -> T>,
}

impl<T: Resource> MongoStore<T> {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(T::COLLECTION),
            _model: PhantomData,
        }
    }

    fn decode(document: Document) -> Result<T, AppError> {
        Ok(from_document(document)?)
    }
}

#[inline]
fn by_id(id: &ObjectId) -> Document {
    doc! { "_id": *id }
}

#[async_trait]
impl<T: Resource> Store<T> for MongoStore<T> {
    async fn list(&self, query: &ListQuery) -> Result<Vec<T>, AppError> {
        let mut options = FindOptions::default();
        options.sort = Some(doc! { "createdAt": -1, "_id": -1 });
        options.skip = Some(query.skip);
        options.limit = query.limit;
        if !query.exclude.is_empty() {
            options.projection = Some(
                query
                    .exclude
                    .iter()
                    .map(|path| (path.to_string(), Bson::Int32(0)))
                    .collect(),
            );
        }

        let documents: Vec<Document> = self
            .collection
            .find(query.filter.clone(), options)
            .await?
            .try_collect()
            .await?;

        let mut items = Vec::with_capacity(documents.len());
        for document in documents {
            match from_document::<T>(document) {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!("Skipping malformed {} document: {}", T::COLLECTION, e),
            }
        }

        Ok(items)
    }

    async fn count(&self, filter: &Document) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(filter.clone(), None).await?)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<T>, AppError> {
        self.collection
            .find_one(by_id(id), None)
            .await?
            .map(Self::decode)
            .transpose()
    }

    async fn insert(&self, item: &T) -> Result<(), AppError> {
        self.collection
            .insert_one(bson::to_document(item)?, None)
            .await?;
        Ok(())
    }

    async fn update(&self, id: &ObjectId, changes: Changes) -> Result<Option<T>, AppError> {
        // An empty update document is rejected by the server.
        if changes.is_empty() {
            return self.get(id).await;
        }

        let mut update = Document::new();
        if !changes.set.is_empty() {
            update.insert("$set", changes.set);
        }
        if !changes.unset.is_empty() {
            let unset: Document = changes
                .unset
                .iter()
                .map(|path| (path.to_string(), Bson::String(String::new())))
                .collect();
            update.insert("$unset", unset);
        }

        let mut options = FindOneAndUpdateOptions::default();
        options.return_document = Some(ReturnDocument::After);

        self.collection
            .find_one_and_update(by_id(id), update, options)
            .await?
            .map(Self::decode)
            .transpose()
    }

    async fn delete(&self, id: &ObjectId) -> Result<Option<T>, AppError> {
        self.collection
            .find_one_and_delete(by_id(id), None)
            .await?
            .map(Self::decode)
            .transpose()
    }
}
