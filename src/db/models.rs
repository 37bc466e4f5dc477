use std::fmt;

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// Reserved document keys maintained by the server.
pub mod fields {
    pub const ID: &str = "_id";
    pub const USER_ID: &str = "userId";
    pub const USER_EMAIL: &str = "userEmail";
    pub const IS_PUBLIC: &str = "isPublic";
    pub const PUBLIC_SLUG: &str = "publicSlug";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// A `database.collection` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionTarget {
    pub database: String,
    pub collection: String,
}

impl CollectionTarget {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for CollectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// One page of search hits plus the total hit count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<Document>,
    pub total_count: u64,
}

/// Counters reported by an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCounts {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Bson>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_target_display() {
        let target = CollectionTarget::new("sample_search", "princesofindia");
        assert_eq!(target.to_string(), "sample_search.princesofindia");
    }
}
