//! Translation of an index definition plus free text into an Atlas Search
//! aggregation.

use bson::{doc, Bson, Document};

use crate::auth::visibility::AccessScope;
use crate::models::search_config::{FieldType, IndexDefinition, SearchConfig};

const FUZZY_MAX_EDITS: i32 = 1;
const FUZZY_PREFIX_LENGTH: i32 = 3;

/// A single `compound.should` operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryClause {
    Autocomplete { query: String, path: String },
    Text { query: String, path: String },
}

impl QueryClause {
    pub fn path(&self) -> &str {
        match self {
            QueryClause::Autocomplete { path, .. } | QueryClause::Text { path, .. } => path,
        }
    }

    pub fn query(&self) -> &str {
        match self {
            QueryClause::Autocomplete { query, .. } | QueryClause::Text { query, .. } => query,
        }
    }

    pub fn to_bson(&self) -> Document {
        let fuzzy = doc! {
            "maxEdits": FUZZY_MAX_EDITS,
            "prefixLength": FUZZY_PREFIX_LENGTH,
        };
        match self {
            QueryClause::Autocomplete { query, path } => doc! {
                "autocomplete": {
                    "query": query,
                    "path": path,
                    "fuzzy": fuzzy,
                    "tokenOrder": "sequential",
                }
            },
            QueryClause::Text { query, path } => doc! {
                "text": {
                    "query": query,
                    "path": path,
                    "fuzzy": fuzzy,
                }
            },
        }
    }
}

/// Derive the search clauses for `query` from an index definition.
///
/// Fields are visited in declaration order and every descriptor of a field
/// yields its own clause. Unknown descriptor types contribute nothing. The
/// query is passed through untouched; a blank query yields no clauses.
pub fn generate_search_clauses(definition: &IndexDefinition, query: &str) -> Vec<QueryClause> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    definition
        .mappings
        .fields
        .iter()
        .flat_map(|(path, mapping)| {
            mapping
                .descriptors()
                .iter()
                .filter_map(move |descriptor| match descriptor {
                    FieldType::Autocomplete(_) => Some(QueryClause::Autocomplete {
                        query: query.to_string(),
                        path: path.to_string(),
                    }),
                    FieldType::String(_) => Some(QueryClause::Text {
                        query: query.to_string(),
                        path: path.to_string(),
                    }),
                    FieldType::Unknown(_) => None,
                })
        })
        .collect()
}

/// Everything the store needs to run one page of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub index: String,
    pub clauses: Vec<QueryClause>,
    pub scope: AccessScope,
    pub skip: u64,
    pub limit: u64,
    pub summary_fields: Vec<String>,
}

impl SearchPlan {
    pub fn new(
        config: &SearchConfig,
        clauses: Vec<QueryClause>,
        scope: AccessScope,
        page: u64,
        page_size: u64,
    ) -> Self {
        Self {
            index: config.index.clone(),
            clauses,
            scope,
            skip: page
                .saturating_sub(1)
                .saturating_mul(page_size)
                .min(i64::MAX as u64),
            limit: page_size,
            summary_fields: config.search_results_summary_fields.clone(),
        }
    }

    pub fn projection(&self) -> Document {
        let mut projection = doc! {
            "_id": 1,
            "userId": 1,
            "userEmail": 1,
            "isPublic": 1,
            "publicSlug": 1,
        };
        for field in &self.summary_fields {
            projection.insert(field.clone(), 1);
        }
        projection.insert("score", doc! { "$meta": "searchScore" });
        projection
    }
}

/// BSON has no unsigned integers; counts beyond `i64::MAX` clamp to it.
fn to_bson_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Render the full aggregation pipeline for a plan:
/// `$search` → visibility `$match` → `$facet` (page + count) → `$project`.
pub fn build_search_pipeline(plan: &SearchPlan) -> Vec<Document> {
    let should: Vec<Bson> = plan
        .clauses
        .iter()
        .map(|clause| Bson::Document(clause.to_bson()))
        .collect();

    vec![
        doc! {
            "$search": {
                "index": &plan.index,
                "compound": { "should": should },
            }
        },
        doc! { "$match": plan.scope.to_bson() },
        doc! {
            "$facet": {
                "results": [
                    { "$skip": to_bson_count(plan.skip) },
                    { "$limit": to_bson_count(plan.limit) },
                    { "$project": plan.projection() },
                ],
                "totalCount": [ { "$count": "count" } ],
            }
        },
        doc! {
            "$project": {
                "results": 1,
                "totalCount": { "$arrayElemAt": ["$totalCount.count", 0] },
            }
        },
    ]
}
