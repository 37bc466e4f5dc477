use serde::Deserialize;

use crate::auth::models::AuthenticatedUser;
use crate::auth::visibility::{build_visibility_predicate, strip_owner_fields};
use crate::db::repository::DocumentStore;
use crate::error::AppError;
use crate::models::document::document_to_json;
use crate::models::search::PaginatedResponse;
use crate::models::search_config::SearchConfig;
use crate::search::pipeline::{generate_search_clauses, SearchPlan};

/// Query string of `GET /api/search`. Numbers arrive as strings so a
/// malformed value can be reported as a 400 with a useful message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub config_type: Option<String>,
    pub public_only: Option<String>,
}

impl SearchParams {
    pub fn public_only(&self) -> bool {
        self.public_only.as_deref() == Some("true")
    }
}

fn parse_number(name: &str, raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{name} must be an integer, got '{value}'"))),
    }
}

/// Core search logic, separated from the HTTP layer for testability.
///
/// Clamps paging, derives the search clauses and only touches the store
/// when at least one clause was produced. Anonymous callers never see
/// owner fields.
pub async fn process_search(
    store: &dyn DocumentStore,
    config: &SearchConfig,
    query: &str,
    page: Option<i64>,
    page_size: Option<i64>,
    user: Option<&AuthenticatedUser>,
) -> Result<PaginatedResponse, AppError> {
    let page = page.unwrap_or(1).max(1) as u64;
    let page_size = config.clamp_page_size(page_size);

    let clauses = generate_search_clauses(&config.index_definition, query);
    if clauses.is_empty() {
        tracing::debug!(collection = %config.collection, "search produced no clauses");
        return Ok(PaginatedResponse::empty(page, page_size));
    }

    let scope = build_visibility_predicate(user);
    let anonymous = scope.is_anonymous();
    let plan = SearchPlan::new(config, clauses, scope, page, page_size);

    tracing::debug!(
        collection = %config.collection,
        index = %config.index,
        page,
        page_size,
        anonymous,
        "running search"
    );
    let outcome = store.search(&config.target(), &plan).await?;

    if outcome.total_count == 0 {
        return Ok(PaginatedResponse::empty(page, page_size));
    }

    let results = outcome
        .results
        .into_iter()
        .map(|mut document| {
            if anonymous {
                strip_owner_fields(&mut document);
            }
            document_to_json(document)
        })
        .collect();

    Ok(PaginatedResponse {
        results,
        total_count: outcome.total_count,
        current_page: page,
        total_pages: outcome.total_count.div_ceil(page_size),
        page_size,
    })
}

/// Axum handler for `GET /api/search`.
///
/// Only available when the `ssr` feature is enabled.
#[cfg(feature = "ssr")]
pub async fn search_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    crate::auth::middleware::MaybeUser(user): crate::auth::middleware::MaybeUser,
    axum::extract::Query(params): axum::extract::Query<SearchParams>,
) -> Result<axum::Json<PaginatedResponse>, AppError> {
    let query = params
        .q
        .as_deref()
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Query and configType are required".into()))?;
    let config_type = params
        .config_type
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Query and configType are required".into()))?;

    let config = state
        .registry
        .get(config_type)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid configType: {config_type}")))?;

    let page = parse_number("page", params.page.as_deref())?;
    let page_size = parse_number("pageSize", params.page_size.as_deref())?;
    let user = if params.public_only() { None } else { user };

    let response = process_search(
        state.store.as_ref(),
        config,
        query,
        page,
        page_size,
        user.as_ref(),
    )
    .await?;

    Ok(axum::Json(response))
}
