use async_trait::async_trait;
use bson::{Bson, Document};

use crate::auth::visibility::DocumentFilter;
use crate::db::models::{CollectionTarget, SearchOutcome, UpdateCounts};
use crate::error::AppError;
use crate::search::pipeline::SearchPlan;

/// Store abstraction behind every document operation.
///
/// This trait allows mocking the database layer in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a full-text search and return one page plus the total hit count.
    async fn search(
        &self,
        target: &CollectionTarget,
        plan: &SearchPlan,
    ) -> Result<SearchOutcome, AppError>;

    /// Find the first document matching `filter`, optionally projected.
    async fn find_one(
        &self,
        target: &CollectionTarget,
        filter: &DocumentFilter,
        projection: Option<Document>,
    ) -> Result<Option<Document>, AppError>;

    /// Insert a document and return the store-generated `_id`.
    async fn insert_one(
        &self,
        target: &CollectionTarget,
        document: Document,
    ) -> Result<Bson, AppError>;

    /// `$set` the given fields on the first document matching `filter`.
    async fn update_one(
        &self,
        target: &CollectionTarget,
        filter: &DocumentFilter,
        changes: Document,
    ) -> Result<UpdateCounts, AppError>;

    /// Delete the first document matching `filter`, returning the count.
    async fn delete_one(
        &self,
        target: &CollectionTarget,
        filter: &DocumentFilter,
    ) -> Result<u64, AppError>;
}

/// MongoDB implementation of the DocumentStore.
///
/// This is only available when the `ssr` feature is enabled (i.e., server-side).
#[cfg(feature = "ssr")]
pub struct MongoDocumentStore {
    connection: std::sync::Arc<crate::db::connection::MongoConnection>,
}

#[cfg(feature = "ssr")]
impl MongoDocumentStore {
    pub fn new(connection: std::sync::Arc<crate::db::connection::MongoConnection>) -> Self {
        Self { connection }
    }

    async fn collection(
        &self,
        target: &CollectionTarget,
    ) -> Result<mongodb::Collection<Document>, AppError> {
        Ok(self
            .connection
            .database(&target.database)
            .await?
            .collection(&target.collection))
    }
}

#[cfg(feature = "ssr")]
fn store_error(operation: &str, target: &CollectionTarget, err: mongodb::error::Error) -> AppError {
    tracing::error!(%target, error = %err, "{operation} failed");
    AppError::Database(err.to_string())
}

#[cfg(feature = "ssr")]
#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn search(
        &self,
        target: &CollectionTarget,
        plan: &SearchPlan,
    ) -> Result<SearchOutcome, AppError> {
        use crate::search::pipeline::build_search_pipeline;
        use futures::TryStreamExt;

        let collection = self.collection(target).await?;
        let mut cursor = collection
            .aggregate(build_search_pipeline(plan))
            .await
            .map_err(|e| store_error("search", target, e))?;

        // The $facet stage always produces exactly one document.
        let Some(facet) = cursor
            .try_next()
            .await
            .map_err(|e| store_error("search", target, e))?
        else {
            return Ok(SearchOutcome::default());
        };

        let results = facet
            .get_array("results")
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_document().cloned())
                    .collect()
            })
            .unwrap_or_default();

        let total_count = match facet.get("totalCount") {
            Some(Bson::Int32(n)) => (*n).max(0) as u64,
            Some(Bson::Int64(n)) => (*n).max(0) as u64,
            _ => 0,
        };

        Ok(SearchOutcome {
            results,
            total_count,
        })
    }

    async fn find_one(
        &self,
        target: &CollectionTarget,
        filter: &DocumentFilter,
        projection: Option<Document>,
    ) -> Result<Option<Document>, AppError> {
        use mongodb::options::FindOneOptions;

        let collection = self.collection(target).await?;
        let options = FindOneOptions::builder().projection(projection).build();
        collection
            .find_one(filter.to_bson())
            .with_options(options)
            .await
            .map_err(|e| store_error("find_one", target, e))
    }

    async fn insert_one(
        &self,
        target: &CollectionTarget,
        document: Document,
    ) -> Result<Bson, AppError> {
        let collection = self.collection(target).await?;
        let result = collection
            .insert_one(document)
            .await
            .map_err(|e| store_error("insert_one", target, e))?;
        Ok(result.inserted_id)
    }

    async fn update_one(
        &self,
        target: &CollectionTarget,
        filter: &DocumentFilter,
        changes: Document,
    ) -> Result<UpdateCounts, AppError> {
        use mongodb::bson::doc;

        let collection = self.collection(target).await?;
        let result = collection
            .update_one(filter.to_bson(), doc! { "$set": changes })
            .await
            .map_err(|e| store_error("update_one", target, e))?;

        Ok(UpdateCounts {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete_one(
        &self,
        target: &CollectionTarget,
        filter: &DocumentFilter,
    ) -> Result<u64, AppError> {
        let collection = self.collection(target).await?;
        let result = collection
            .delete_one(filter.to_bson())
            .await
            .map_err(|e| store_error("delete_one", target, e))?;
        Ok(result.deleted_count)
    }
}
