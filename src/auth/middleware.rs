use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::auth::models::AuthenticatedUser;
use crate::error::AppError;

/// Name of the cookie carrying the session.
pub const SESSION_COOKIE: &str = "dossier_session";

/// Roles the application knows about. Anything else in the claims is ignored.
const KNOWN_ROLES: &[&str] = &["admin", "editor"];

/// Normalize identity-provider groups into application roles.
///
/// Matching is case-insensitive; unknown groups are dropped and duplicates
/// collapsed.
pub fn roles_from_claims(groups: &[String]) -> Vec<String> {
    let mut roles: Vec<String> = groups
        .iter()
        .map(|g| g.trim().to_lowercase())
        .filter(|g| KNOWN_ROLES.contains(&g.as_str()))
        .collect();
    roles.sort();
    roles.dedup();
    roles
}

/// Build an `AuthenticatedUser` from identity claims.
pub fn build_authenticated_user(
    user_id: String,
    email: String,
    groups: &[String],
) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id,
        email,
        roles: roles_from_claims(groups),
    }
}

/// Serialize a user into a cookie-safe session value.
pub fn encode_session(user: &AuthenticatedUser) -> Result<String, AppError> {
    let json = serde_json::to_vec(user)
        .map_err(|e| AppError::Internal(format!("Failed to serialize session: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a session value. Garbage means "no session".
pub fn decode_session(value: &str) -> Option<AuthenticatedUser> {
    let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
    let user: AuthenticatedUser = serde_json::from_slice(&bytes).ok()?;
    (!user.user_id.is_empty()).then_some(user)
}

/// Optional caller identity, read from the signed session cookie.
///
/// Never rejects: a missing, garbled or unsigned cookie yields
/// `MaybeUser(None)`, and each operation decides whether identity is
/// required. Sessions only exist while demo mode is on.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

/// Read the session from request headers. The cookie must carry a valid
/// signature for `key`.
#[cfg(feature = "ssr")]
pub fn session_from_headers(
    headers: &axum::http::HeaderMap,
    key: &axum_extra::extract::cookie::Key,
) -> Option<AuthenticatedUser> {
    let jar = axum_extra::extract::SignedCookieJar::from_headers(headers, key.clone());
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| decode_session(cookie.value()))
}

#[cfg(feature = "ssr")]
impl axum::extract::FromRequestParts<crate::app::AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &crate::app::AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.demo_mode {
            return Ok(MaybeUser(None));
        }
        Ok(MaybeUser(session_from_headers(&parts.headers, &state.session_key)))
    }
}
