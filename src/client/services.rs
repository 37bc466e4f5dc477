//! Browser-side wrappers around the JSON API.
//!
//! Requests only go out from the hydrated client. Server-side rendering
//! never calls the API over HTTP, so outside the `hydrate` build every call
//! resolves to [`ClientError::Unavailable`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::configs::ConfigList;
use crate::auth::demo_auth::{LoginRequest, LoginResponse};
use crate::auth::models::AuthenticatedUser;
use crate::models::document::{DeleteResult, DocumentEnvelope, InsertResult, UpdateResult};
use crate::models::search::PaginatedResponse;
use crate::models::search_config::SearchConfig;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error body.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Request failed: {0}")]
    Network(String),
    #[error("Not available outside the browser")]
    Unavailable,
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }
}

#[derive(Clone, Copy)]
enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[cfg(feature = "hydrate")]
async fn request<T: DeserializeOwned>(
    method: Method,
    url: &str,
    query: &[(&str, String)],
    body: Option<Value>,
) -> Result<T, ClientError> {
    use gloo_net::http::RequestBuilder;

    let builder = match method {
        Method::Get => RequestBuilder::new(url).method(gloo_net::http::Method::GET),
        Method::Post => RequestBuilder::new(url).method(gloo_net::http::Method::POST),
        Method::Put => RequestBuilder::new(url).method(gloo_net::http::Method::PUT),
        Method::Delete => RequestBuilder::new(url).method(gloo_net::http::Method::DELETE),
    }
    .query(query.iter().map(|(k, v)| (*k, v.as_str())));

    let response = match body {
        Some(body) => builder
            .json(&body)
            .map_err(|e| ClientError::Network(e.to_string()))?
            .send()
            .await,
        None => builder.send().await,
    }
    .map_err(|e| ClientError::Network(e.to_string()))?;

    if response.ok() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Network(e.to_string()));
    }

    let status = response.status();
    let fallback = response.status_text();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(fallback);
    Err(ClientError::Api { status, message })
}

#[cfg(not(feature = "hydrate"))]
async fn request<T: DeserializeOwned>(
    _method: Method,
    _url: &str,
    _query: &[(&str, String)],
    _body: Option<Value>,
) -> Result<T, ClientError> {
    Err(ClientError::Unavailable)
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, ClientError> {
    serde_json::to_value(value).map_err(|e| ClientError::Network(e.to_string()))
}

fn target_body(config: &SearchConfig, config_type: &str) -> serde_json::Map<String, Value> {
    let mut body = serde_json::Map::new();
    body.insert("selectedDatabase".into(), Value::String(config.database.clone()));
    body.insert("collection".into(), Value::String(config.collection.clone()));
    body.insert("configType".into(), Value::String(config_type.to_string()));
    body
}

fn document_url(id: &str) -> String {
    format!("/api/documents/{}", urlencoding::encode(id))
}

pub async fn search_documents(
    config_type: &str,
    query: &str,
    page: u64,
    page_size: u64,
) -> Result<PaginatedResponse, ClientError> {
    request(
        Method::Get,
        "/api/search",
        &[
            ("q", query.to_string()),
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
            ("configType", config_type.to_string()),
        ],
        None,
    )
    .await
}

/// Suggestion entries `(id, label)` for the search bar.
pub async fn fetch_suggestions(
    config_type: &str,
    config: &SearchConfig,
    query: &str,
) -> Result<Vec<(String, String)>, ClientError> {
    let page = search_documents(config_type, query, 1, config.max_suggestions as u64).await?;
    Ok(suggestion_labels(&page, config))
}

pub fn suggestion_labels(page: &PaginatedResponse, config: &SearchConfig) -> Vec<(String, String)> {
    page.results
        .iter()
        .filter_map(|hit| {
            let id = hit.get(&config.id_field).map(display_value)?;
            let label = hit
                .get(&config.search_results_suggestions_field)
                .map(display_value)
                .unwrap_or_default();
            Some((id, label))
        })
        .take(config.max_suggestions)
        .collect()
}

pub async fn get_document(
    config_type: &str,
    config: &SearchConfig,
    id: &str,
) -> Result<Value, ClientError> {
    let envelope: DocumentEnvelope<Value> = request(
        Method::Get,
        &document_url(id),
        &[
            ("configType", config_type.to_string()),
            ("idField", config.id_field.clone()),
            ("projection", config.find_one_detail_fields.join(",")),
        ],
        None,
    )
    .await?;
    Ok(envelope.result)
}

pub async fn create_document(
    config_type: &str,
    config: &SearchConfig,
    document: Value,
) -> Result<InsertResult, ClientError> {
    let mut body = target_body(config, config_type);
    body.insert("document".into(), document);
    let envelope: DocumentEnvelope<InsertResult> =
        request(Method::Post, "/api/documents", &[], Some(Value::Object(body))).await?;
    Ok(envelope.result)
}

pub async fn update_document(
    config_type: &str,
    config: &SearchConfig,
    id: &str,
    update: Value,
) -> Result<UpdateResult, ClientError> {
    let mut body = target_body(config, config_type);
    body.insert("update".into(), update);
    let envelope: DocumentEnvelope<UpdateResult> =
        request(Method::Put, &document_url(id), &[], Some(Value::Object(body))).await?;
    Ok(envelope.result)
}

pub async fn delete_document(
    config_type: &str,
    config: &SearchConfig,
    id: &str,
) -> Result<DeleteResult, ClientError> {
    let envelope: DocumentEnvelope<DeleteResult> = request(
        Method::Delete,
        &document_url(id),
        &[
            ("selectedDatabase", config.database.clone()),
            ("collection", config.collection.clone()),
            ("configType", config_type.to_string()),
        ],
        None,
    )
    .await?;
    Ok(envelope.result)
}

pub async fn duplicate_document(
    config_type: &str,
    config: &SearchConfig,
    id: &str,
) -> Result<Value, ClientError> {
    let mut body = target_body(config, config_type);
    body.insert(
        "config".into(),
        serde_json::json!({ "searchResultsSuggestionsField": config.search_results_suggestions_field }),
    );
    let envelope: DocumentEnvelope<Value> =
        request(Method::Post, &document_url(id), &[], Some(Value::Object(body))).await?;
    Ok(envelope.result)
}

pub async fn fetch_configs() -> Result<ConfigList, ClientError> {
    request(Method::Get, "/api/configs", &[], None).await
}

pub async fn current_user() -> Result<Option<AuthenticatedUser>, ClientError> {
    match request::<AuthenticatedUser>(Method::Get, "/api/auth/me", &[], None).await {
        Ok(user) => Ok(Some(user)),
        Err(e) if e.is_unauthorized() => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn login(username: String, password: String) -> Result<LoginResponse, ClientError> {
    let body = to_body(&LoginRequest { username, password })?;
    request(Method::Post, "/api/auth/login", &[], Some(body)).await
}

pub async fn logout() -> Result<(), ClientError> {
    // The endpoint answers with an empty body.
    match request::<Value>(Method::Post, "/api/auth/logout", &[], None).await {
        Ok(_) | Err(ClientError::Network(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Wait out the typing pause before firing a suggestion lookup.
pub async fn debounce(millis: u32) {
    #[cfg(feature = "hydrate")]
    gloo_timers::future::TimeoutFuture::new(millis).await;
    #[cfg(not(feature = "hydrate"))]
    let _ = millis;
}

/// Native confirmation dialog. Declines when no window is available.
pub fn confirm(message: &str) -> bool {
    #[cfg(feature = "hydrate")]
    {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = message;
        false
    }
}

/// `/result?q=...&page=...&configType=...`
pub fn results_href(config: &SearchConfig, config_type: &str, query: &str, page: u64) -> String {
    format!(
        "{}?{}={}&page={}&configType={}",
        config.search_results_paginated_page,
        config.search_query_param,
        urlencoding::encode(query),
        page,
        urlencoding::encode(config_type)
    )
}

pub fn detail_href(config: &SearchConfig, config_type: &str, id: &str) -> String {
    format!(
        "{}?configType={}",
        config.detail_path(id),
        urlencoding::encode(config_type)
    )
}

/// Render a scalar for display; strings lose their JSON quotes.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Format an RFC 3339 timestamp with a `yyyy-MM-dd`-style pattern.
/// Values that are not timestamps are returned unchanged.
pub fn format_date(value: &str, date_format: &str) -> String {
    let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(value) else {
        return value.to_string();
    };
    let pattern = date_format
        .replace("yyyy", "%Y")
        .replace("MM", "%m")
        .replace("dd", "%d")
        .replace("HH", "%H")
        .replace("mm", "%M")
        .replace("ss", "%S");
    parsed.format(&pattern).to_string()
}
