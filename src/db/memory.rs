// src/db/memory.rs

use std::cmp::Ordering;
use std::marker::PhantomData;

use async_trait::async_trait;
use bson::{Bson, Document, from_document, oid::ObjectId};
use tokio::sync::RwLock;

use super::{Changes, ListQuery, Resource, Store};
use crate::error::AppError;

/// In-process `Store` holding documents as bson, in insertion order.
///
/// Mirrors the subset of MongoDB behaviour the controllers rely on:
/// equality filters, exclusion projections, newest-first ordering and `$set`.
pub struct MemoryStore<T> {
    documents: RwLock<Vec<Document>>,
    _model: PhantomData<fn() -> T>,
}

impl<T: Resource> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            _model: PhantomData,
        }
    }
}

/// Resolves a dotted path such as `quizPdf.data`.
fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = current.as_document()?.get(part)?;
    }
    Some(current)
}

fn remove_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = document.get_mut(head) {
                remove_path(inner, rest);
            }
        }
        None => {
            document.remove(path);
        }
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(path, expected)| lookup(document, path) == Some(expected))
}

fn id_of(document: &Document) -> Option<ObjectId> {
    document.get_object_id("_id").ok()
}

fn newest_first(a: &Document, b: &Document) -> Ordering {
    let created = |d: &Document| d.get_datetime("createdAt").ok().copied();
    created(b)
        .cmp(&created(a))
        .then_with(|| id_of(b).cmp(&id_of(a)))
}

#[async_trait]
impl<T: Resource> Store<T> for MemoryStore<T> {
    async fn list(&self, query: &ListQuery) -> Result<Vec<T>, AppError> {
        let documents = self.documents.read().await;

        let mut selected: Vec<&Document> = documents
            .iter()
            .filter(|d| matches(d, &query.filter))
            .collect();
        selected.sort_by(|a, b| newest_first(a, b));

        let limit = query
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        selected
            .into_iter()
            .skip(query.skip as usize)
            .take(limit)
            .map(|document| {
                let mut document = document.clone();
                for path in &query.exclude {
                    remove_path(&mut document, path);
                }
                from_document(document).map_err(AppError::from)
            })
            .collect()
    }

    async fn count(&self, filter: &Document) -> Result<u64, AppError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().filter(|d| matches(d, filter)).count() as u64)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<T>, AppError> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .find(|d| id_of(d).as_ref() == Some(id))
            .map(|d| from_document(d.clone()).map_err(AppError::from))
            .transpose()
    }

    async fn insert(&self, item: &T) -> Result<(), AppError> {
        let document = bson::to_document(item)?;
        let id = id_of(&document).ok_or_else(|| {
            AppError::InternalServerError(format!("{} document has no _id", T::COLLECTION))
        })?;

        let mut documents = self.documents.write().await;
        if documents.iter().any(|d| id_of(d) == Some(id)) {
            return Err(AppError::InternalServerError(format!(
                "Duplicate _id {} in {}",
                id,
                T::COLLECTION
            )));
        }
        documents.push(document);
        Ok(())
    }

    async fn update(&self, id: &ObjectId, changes: Changes) -> Result<Option<T>, AppError> {
        let mut documents = self.documents.write().await;
        let Some(slot) = documents.iter_mut().find(|d| id_of(d).as_ref() == Some(id)) else {
            return Ok(None);
        };

        let mut updated = slot.clone();
        for (key, value) in changes.set {
            updated.insert(key, value);
        }
        for path in &changes.unset {
            remove_path(&mut updated, path);
        }

        // Only committed once the result still reads back as a model.
        let item: T = from_document(updated.clone())?;
        *slot = updated;
        Ok(Some(item))
    }

    async fn delete(&self, id: &ObjectId) -> Result<Option<T>, AppError> {
        let mut documents = self.documents.write().await;
        match documents.iter().position(|d| id_of(d).as_ref() == Some(id)) {
            Some(index) => Ok(Some(from_document(documents.remove(index))?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{DateTime, doc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        #[serde(rename = "_id")]
        id: ObjectId,
        title: String,
        #[serde(default)]
        tag: String,
        #[serde(default)]
        attachment: Option<Attachment>,
        created_at: DateTime,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Attachment {
        #[serde(default)]
        data: Option<String>,
        name: String,
    }

    impl Resource for Note {
        const COLLECTION: &'static str = "notes";
    }

    fn note(title: &str, tag: &str, millis: i64) -> Note {
        Note {
            id: ObjectId::new(),
            title: title.to_string(),
            tag: tag.to_string(),
            attachment: Some(Attachment {
                data: Some("QUJD".to_string()),
                name: format!("{}.pdf", title),
            }),
            created_at: DateTime::from_millis(millis),
        }
    }

    #[tokio::test]
    async fn list_is_newest_first_filtered_and_projected() {
        let store = MemoryStore::<Note>::new();
        store.insert(&note("old", "a", 1_000)).await.unwrap();
        store.insert(&note("new", "a", 3_000)).await.unwrap();
        store.insert(&note("other", "b", 2_000)).await.unwrap();

        let query = ListQuery {
            filter: doc! { "tag": "a" },
            exclude: vec!["attachment.data"],
            ..Default::default()
        };
        let notes = store.list(&query).await.unwrap();

        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old"]);
        assert!(notes.iter().all(|n| n.attachment.as_ref().unwrap().data.is_none()));
        assert_eq!(store.count(&doc! {}).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn list_applies_skip_and_limit() {
        let store = MemoryStore::<Note>::new();
        for i in 0..5 {
            store.insert(&note(&format!("n{}", i), "a", i * 1_000)).await.unwrap();
        }

        let query = ListQuery {
            skip: 1,
            limit: Some(2),
            ..Default::default()
        };
        let titles: Vec<_> = store
            .list(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["n3", "n2"]);
    }

    fn set(fields: Document) -> Changes {
        Changes {
            set: fields,
            unset: Vec::new(),
        }
    }

    #[tokio::test]
    async fn update_unsets_nested_and_top_level_paths() {
        let store = MemoryStore::<Note>::new();
        let original = note("with file", "a", 1_000);
        store.insert(&original).await.unwrap();

        let updated = store
            .update(
                &original.id,
                Changes {
                    set: doc! { "tag": "b" },
                    unset: vec!["attachment"],
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.tag, "b");
        assert!(updated.attachment.is_none());

        let stored = store.get(&original.id).await.unwrap().unwrap();
        assert!(stored.attachment.is_none());
    }

    #[tokio::test]
    async fn update_sets_fields_and_rejects_invalid_shapes() {
        let store = MemoryStore::<Note>::new();
        let original = note("draft", "a", 1_000);
        store.insert(&original).await.unwrap();

        let updated = store
            .update(&original.id, set(doc! { "title": "final" }))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "final");
        assert_eq!(updated.tag, "a");

        assert!(store.update(&original.id, set(doc! { "title": 42 })).await.is_err());
        let stored = store.get(&original.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "final");

        assert!(store.update(&ObjectId::new(), set(doc! { "title": "x" })).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_returns_document_once() {
        let store = MemoryStore::<Note>::new();
        let n = note("gone", "a", 1_000);
        store.insert(&n).await.unwrap();

        assert_eq!(store.delete(&n.id).await.unwrap(), Some(n.clone()));
        assert_eq!(store.delete(&n.id).await.unwrap(), None);
        assert!(store.insert(&n).await.is_ok());
        assert!(store.insert(&n).await.is_err());
    }
}
