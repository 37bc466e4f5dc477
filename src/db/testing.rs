//! In-memory [`DocumentStore`] used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};

use crate::auth::visibility::DocumentFilter;
use crate::db::models::{fields, CollectionTarget, SearchOutcome, UpdateCounts};
use crate::db::repository::DocumentStore;
use crate::error::AppError;
use crate::search::pipeline::SearchPlan;

/// Collections kept in insertion order. Search matches a clause when the
/// clause's field contains the query, case-insensitively.
#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<HashMap<CollectionTarget, Vec<Document>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add documents directly, assigning an `_id` where missing.
    pub fn seed(&self, target: &CollectionTarget, documents: Vec<Document>) -> Vec<ObjectId> {
        let mut collections = self.collections.lock().unwrap();
        let collection = collections.entry(target.clone()).or_default();
        documents
            .into_iter()
            .map(|mut document| {
                let id = match document.get_object_id(fields::ID) {
                    Ok(id) => id,
                    Err(_) => {
                        let id = ObjectId::new();
                        document.insert(fields::ID, id);
                        id
                    }
                };
                collection.push(document);
                id
            })
            .collect()
    }

    pub fn all(&self, target: &CollectionTarget) -> Vec<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get(&self, target: &CollectionTarget, id: ObjectId) -> Option<Document> {
        self.all(target)
            .into_iter()
            .find(|d| d.get_object_id(fields::ID).ok() == Some(id))
    }
}

fn project(document: &Document, projection: &Document) -> Document {
    let mut projected = Document::new();
    if let Some(id) = document.get(fields::ID) {
        projected.insert(fields::ID, id.clone());
    }
    for (key, value) in document {
        if projection.get(key) == Some(&Bson::Int32(1)) {
            projected.insert(key.clone(), value.clone());
        }
    }
    projected
}

fn matches_clause(document: &Document, path: &str, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    document
        .get_str(path)
        .map(|value| value.to_lowercase().contains(&needle))
        .unwrap_or(false)
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn search(
        &self,
        target: &CollectionTarget,
        plan: &SearchPlan,
    ) -> Result<SearchOutcome, AppError> {
        let hits: Vec<Document> = self
            .all(target)
            .into_iter()
            .filter(|d| {
                plan.clauses
                    .iter()
                    .any(|c| matches_clause(d, c.path(), c.query()))
            })
            .filter(|d| plan.scope.admits(d))
            .collect();

        let projection = plan.projection();
        let results = hits
            .iter()
            .skip(plan.skip as usize)
            .take(plan.limit as usize)
            .map(|d| {
                let mut projected = project(d, &projection);
                projected.insert("score", 1.0);
                projected
            })
            .collect();

        Ok(SearchOutcome {
            results,
            total_count: hits.len() as u64,
        })
    }

    async fn find_one(
        &self,
        target: &CollectionTarget,
        filter: &DocumentFilter,
        projection: Option<Document>,
    ) -> Result<Option<Document>, AppError> {
        let found = self.all(target).into_iter().find(|d| filter.matches(d));
        Ok(match (found, projection) {
            (Some(d), Some(projection)) => Some(project(&d, &projection)),
            (found, None) => found,
            (None, Some(_)) => None,
        })
    }

    async fn insert_one(
        &self,
        target: &CollectionTarget,
        document: Document,
    ) -> Result<Bson, AppError> {
        let id = self.seed(target, vec![document])[0];
        Ok(Bson::ObjectId(id))
    }

    async fn update_one(
        &self,
        target: &CollectionTarget,
        filter: &DocumentFilter,
        changes: Document,
    ) -> Result<UpdateCounts, AppError> {
        let mut collections = self.collections.lock().unwrap();
        let Some(document) = collections
            .get_mut(target)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)))
        else {
            return Ok(UpdateCounts::default());
        };

        let before = document.clone();
        for (key, value) in changes {
            document.insert(key, value);
        }
        Ok(UpdateCounts {
            matched_count: 1,
            modified_count: u64::from(*document != before),
            upserted_id: None,
        })
    }

    async fn delete_one(
        &self,
        target: &CollectionTarget,
        filter: &DocumentFilter,
    ) -> Result<u64, AppError> {
        let mut collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get_mut(target) else {
            return Ok(0);
        };
        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
