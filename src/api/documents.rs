use std::sync::LazyLock;

use bson::{Bson, Document};
use regex::Regex;
use serde_json::Value;

use crate::auth::models::AuthenticatedUser;
use crate::auth::visibility::{
    build_visibility_predicate, owner_of, strip_owner_fields, AccessScope, DocumentFilter,
    IdSelector,
};
use crate::db::models::fields;
use crate::db::repository::DocumentStore;
use crate::db::slug::generate_unique_slug;
use crate::error::AppError;
use crate::models::document::{
    bson_to_json, coerce_public, document_from_json, DeleteResult, InsertResult, UpdateResult,
};
use crate::models::search_config::SearchConfig;

static COPY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(Copy (\d+)\)$").expect("static regex"));

const UNTITLED: &str = "Untitled";

/// Title for the next copy: `Report` → `Report (Copy 1)`,
/// `Report (Copy 1)` → `Report (Copy 2)`. Only a numbered suffix counts.
pub fn next_copy_title(title: &str) -> String {
    if let Some(caps) = COPY_SUFFIX.captures(title) {
        if let (Some(whole), Ok(n)) = (caps.get(0), caps[1].parse::<u64>()) {
            return format!("{}(Copy {})", &title[..whole.start()], n + 1);
        }
    }
    format!("{title} (Copy 1)")
}

fn require_user(user: Option<&AuthenticatedUser>) -> Result<&AuthenticatedUser, AppError> {
    user.ok_or_else(|| AppError::Auth("Unauthorized".into()))
}

fn not_found() -> AppError {
    AppError::NotFound("Document not found or you don't have permission to access it".into())
}

/// Projection for detail reads: requested fields restricted to the config's
/// detail fields, or all detail fields when none were requested.
pub fn detail_projection(config: &SearchConfig, requested: Option<&[String]>) -> Document {
    let mut projection = Document::new();
    projection.insert(fields::ID, 1);
    projection.insert(config.id_field.clone(), 1);

    let allowed = &config.find_one_detail_fields;
    match requested {
        Some(requested) => {
            for field in requested.iter().filter(|f| allowed.contains(f)) {
                projection.insert(field.clone(), 1);
            }
        }
        None => {
            for field in allowed {
                projection.insert(field.clone(), 1);
            }
        }
    }
    projection
}

/// Read one document visible to the caller.
pub async fn process_find_one(
    store: &dyn DocumentStore,
    config: &SearchConfig,
    raw_id: &str,
    user: Option<&AuthenticatedUser>,
    requested_fields: Option<&[String]>,
) -> Result<Document, AppError> {
    let selector = IdSelector::for_config(config, raw_id)?;
    let scope = build_visibility_predicate(user);
    let anonymous = scope.is_anonymous();
    let filter = DocumentFilter::by_id(selector).within(scope);

    tracing::debug!(collection = %config.collection, id = raw_id, anonymous, "find one");
    let mut document = store
        .find_one(
            &config.target(),
            &filter,
            Some(detail_projection(config, requested_fields)),
        )
        .await?
        .ok_or_else(not_found)?;

    if anonymous {
        strip_owner_fields(&mut document);
    }
    Ok(document)
}

/// Read a public document by its slug.
pub async fn process_find_by_slug(
    store: &dyn DocumentStore,
    config: &SearchConfig,
    slug: &str,
) -> Result<Document, AppError> {
    let filter = DocumentFilter::by_slug(slug).within(AccessScope::PublicOnly);
    let mut document = store
        .find_one(&config.target(), &filter, Some(detail_projection(config, None)))
        .await?
        .ok_or_else(not_found)?;
    strip_owner_fields(&mut document);
    Ok(document)
}

/// Insert a new document owned by the caller.
pub async fn process_create(
    store: &dyn DocumentStore,
    config: &SearchConfig,
    user: Option<&AuthenticatedUser>,
    body: Value,
) -> Result<InsertResult, AppError> {
    let user = require_user(user)?;
    let mut document = document_from_json(body)?;
    let target = config.target();

    document.remove(fields::ID);
    document.remove(fields::PUBLIC_SLUG);

    let is_public = coerce_public(document.get(fields::IS_PUBLIC));
    let now = bson::DateTime::now();
    document.insert(fields::USER_ID, user.user_id.as_str());
    document.insert(fields::USER_EMAIL, user.email.as_str());
    document.insert(fields::IS_PUBLIC, is_public);
    document.insert(fields::CREATED_AT, now);
    document.insert(fields::UPDATED_AT, now);

    if is_public {
        let title = document
            .get_str(config.title_field())
            .unwrap_or_default()
            .to_string();
        let slug = generate_unique_slug(store, &target, &title).await?;
        document.insert(fields::PUBLIC_SLUG, slug);
    }

    let inserted_id = store.insert_one(&target, document).await?;
    tracing::debug!(collection = %config.collection, user = %user.user_id, "document created");

    Ok(InsertResult {
        acknowledged: true,
        inserted_id: bson_to_json(inserted_id),
    })
}

/// Apply a partial update to a document the caller owns.
///
/// Visibility is recomputed on every update: a missing `isPublic` in the
/// patch makes the document private.
pub async fn process_update(
    store: &dyn DocumentStore,
    config: &SearchConfig,
    user: Option<&AuthenticatedUser>,
    raw_id: &str,
    patch: Value,
) -> Result<UpdateResult, AppError> {
    let user = require_user(user)?;
    let selector = IdSelector::for_config(config, raw_id)?;
    let mut changes = document_from_json(patch)?;
    let target = config.target();
    let owned = DocumentFilter::by_id(selector).within(AccessScope::owner(user));

    let existing = store.find_one(&target, &owned, None).await?.ok_or_else(|| {
        tracing::info!(id = raw_id, user = %user.user_id, "update rejected: not owned or missing");
        not_found()
    })?;

    changes.remove(fields::ID);
    changes.remove(fields::PUBLIC_SLUG);
    changes.remove(fields::CREATED_AT);
    changes.remove(fields::UPDATED_AT);

    let is_public = coerce_public(changes.get(fields::IS_PUBLIC));
    if is_public {
        let has_slug = existing
            .get_str(fields::PUBLIC_SLUG)
            .is_ok_and(|slug| !slug.is_empty());
        if !has_slug {
            let title = changes
                .get_str(config.title_field())
                .or_else(|_| existing.get_str(config.title_field()))
                .unwrap_or_default()
                .to_string();
            let slug = generate_unique_slug(store, &target, &title).await?;
            changes.insert(fields::PUBLIC_SLUG, slug);
        }
    } else {
        changes.insert(fields::PUBLIC_SLUG, Bson::Null);
    }

    changes.insert(fields::USER_ID, user.user_id.as_str());
    changes.insert(fields::IS_PUBLIC, is_public);
    changes.insert(fields::UPDATED_AT, bson::DateTime::now());

    let counts = store.update_one(&target, &owned, changes).await?;
    tracing::debug!(
        collection = %config.collection,
        id = raw_id,
        matched = counts.matched_count,
        modified = counts.modified_count,
        "document updated"
    );
    Ok(counts.into())
}

/// Delete a document the caller owns.
///
/// A visible but foreign (public) document is `Forbidden`; an invisible one
/// is `NotFound`.
pub async fn process_delete(
    store: &dyn DocumentStore,
    config: &SearchConfig,
    user: Option<&AuthenticatedUser>,
    raw_id: &str,
) -> Result<DeleteResult, AppError> {
    let user = require_user(user)?;
    let selector = IdSelector::for_config(config, raw_id)?;
    let target = config.target();

    let visible = DocumentFilter::by_id(selector.clone()).within(build_visibility_predicate(Some(user)));
    let existing = store
        .find_one(&target, &visible, None)
        .await?
        .ok_or_else(not_found)?;

    if !user.owns(owner_of(&existing)) {
        tracing::info!(id = raw_id, user = %user.user_id, "delete rejected: not the owner");
        return Err(AppError::Forbidden(
            "You don't have permission to delete this document".into(),
        ));
    }

    let owned = DocumentFilter::by_id(selector).within(AccessScope::owner(user));
    let deleted_count = store.delete_one(&target, &owned).await?;
    if deleted_count == 0 {
        return Err(not_found());
    }

    tracing::debug!(collection = %config.collection, id = raw_id, "document deleted");
    Ok(DeleteResult {
        acknowledged: true,
        deleted_count,
    })
}

/// Copy a document the caller owns into a new private document.
pub async fn process_duplicate(
    store: &dyn DocumentStore,
    config: &SearchConfig,
    user: Option<&AuthenticatedUser>,
    raw_id: &str,
) -> Result<Document, AppError> {
    let user = require_user(user)?;
    let selector = IdSelector::for_config(config, raw_id)?;
    let target = config.target();
    let owned = DocumentFilter::by_id(selector).within(AccessScope::owner(user));

    let mut copy = store
        .find_one(&target, &owned, None)
        .await?
        .ok_or_else(not_found)?;

    copy.remove(fields::ID);
    copy.remove(fields::PUBLIC_SLUG);

    let title_field = config.title_field();
    let title = copy.get_str(title_field).unwrap_or(UNTITLED).to_string();
    let now = bson::DateTime::now();
    copy.insert(title_field, next_copy_title(&title));
    copy.insert(fields::USER_ID, user.user_id.as_str());
    copy.insert(fields::USER_EMAIL, user.email.as_str());
    copy.insert(fields::IS_PUBLIC, false);
    copy.insert(fields::CREATED_AT, now);
    copy.insert(fields::UPDATED_AT, now);

    let new_id = store.insert_one(&target, copy).await?;
    tracing::debug!(collection = %config.collection, source = raw_id, "document duplicated");

    store
        .find_one(&target, &DocumentFilter::by_id(IdSelector::native(new_id)), None)
        .await?
        .ok_or_else(|| AppError::Internal("Duplicated document could not be read back".into()))
}

#[cfg(feature = "ssr")]
mod handlers {
    use std::sync::Arc;

    use axum::body::Bytes;
    use axum::extract::{Path, Query, State};
    use axum::Json;
    use serde::de::DeserializeOwned;
    use serde_json::Value;

    use super::*;
    use crate::app::AppState;
    use crate::auth::middleware::MaybeUser;
    use crate::models::document::{
        document_to_json, CreateRequest, DocumentEnvelope, DuplicateRequest, FindOneParams,
        TargetParams, UpdateRequest,
    };

    type JsonResult<T> = Result<Json<DocumentEnvelope<T>>, AppError>;

    fn envelope<T>(result: T) -> Json<DocumentEnvelope<T>> {
        Json(DocumentEnvelope { result })
    }

    fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
        serde_json::from_value(body)
            .map_err(|e| AppError::BadRequest(format!("Missing required parameters: {e}")))
    }

    fn resolve(state: &AppState, target: &TargetParams) -> Result<Arc<SearchConfig>, AppError> {
        state
            .registry
            .resolve(
                target.config_type.as_deref(),
                target.selected_database.as_deref(),
                target.collection.as_deref(),
            )
            .cloned()
    }

    /// `GET /api/documents/{id}`
    pub async fn find_one_handler(
        State(state): State<AppState>,
        MaybeUser(user): MaybeUser,
        Path(id): Path<String>,
        Query(params): Query<FindOneParams>,
    ) -> JsonResult<Value> {
        let config = resolve(&state, &params.target())?;
        if let Some(id_field) = params.id_field.as_deref() {
            if id_field != config.id_field {
                return Err(AppError::BadRequest(format!(
                    "idField '{id_field}' does not match the configured '{}'",
                    config.id_field
                )));
            }
        }
        let user = if params.public_only == Some(true) { None } else { user };
        let requested = params.projection_fields();

        let document = process_find_one(
            state.store.as_ref(),
            &config,
            &id,
            user.as_ref(),
            requested.as_deref(),
        )
        .await?;
        Ok(envelope(document_to_json(document)))
    }

    /// `GET /api/public/{slug}`
    pub async fn find_by_slug_handler(
        State(state): State<AppState>,
        Path(slug): Path<String>,
        Query(params): Query<TargetParams>,
    ) -> JsonResult<Value> {
        let config = resolve(&state, &params)?;
        let document = process_find_by_slug(state.store.as_ref(), &config, &slug).await?;
        Ok(envelope(document_to_json(document)))
    }

    /// `POST /api/documents`
    pub async fn create_handler(
        State(state): State<AppState>,
        MaybeUser(user): MaybeUser,
        Json(body): Json<Value>,
    ) -> JsonResult<InsertResult> {
        let request: CreateRequest = parse_body(body)?;
        let config = resolve(&state, &request.target)?;
        let result =
            process_create(state.store.as_ref(), &config, user.as_ref(), request.document).await?;
        Ok(envelope(result))
    }

    /// `PUT /api/documents/{id}`
    pub async fn update_handler(
        State(state): State<AppState>,
        MaybeUser(user): MaybeUser,
        Path(id): Path<String>,
        Json(body): Json<Value>,
    ) -> JsonResult<UpdateResult> {
        let request: UpdateRequest = parse_body(body)?;
        let config = resolve(&state, &request.target)?;
        let result = process_update(
            state.store.as_ref(),
            &config,
            user.as_ref(),
            &id,
            request.update,
        )
        .await?;
        Ok(envelope(result))
    }

    /// `DELETE /api/documents/{id}`; the target may come from the query
    /// string or from a JSON body.
    pub async fn delete_handler(
        State(state): State<AppState>,
        MaybeUser(user): MaybeUser,
        Path(id): Path<String>,
        Query(query): Query<TargetParams>,
        body: Bytes,
    ) -> JsonResult<DeleteResult> {
        let target = if query.collection.is_some() || query.config_type.is_some() || body.is_empty() {
            query
        } else {
            serde_json::from_slice(&body)
                .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?
        };
        let config = resolve(&state, &target)?;
        let result = process_delete(state.store.as_ref(), &config, user.as_ref(), &id).await?;
        Ok(envelope(result))
    }

    /// `POST /api/documents/{id}`
    pub async fn duplicate_handler(
        State(state): State<AppState>,
        MaybeUser(user): MaybeUser,
        Path(id): Path<String>,
        Json(body): Json<Value>,
    ) -> JsonResult<Value> {
        let request: DuplicateRequest = parse_body(body)?;
        let config = resolve(&state, &request.resolved_target())?;
        let document =
            process_duplicate(state.store.as_ref(), &config, user.as_ref(), &id).await?;
        Ok(envelope(document_to_json(document)))
    }
}

#[cfg(feature = "ssr")]
pub use handlers::*;
