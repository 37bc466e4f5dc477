use serde::{Deserialize, Serialize};

use crate::auth::middleware::build_authenticated_user;
use crate::auth::models::AuthenticatedUser;
use crate::error::AppError;

/// Built-in demo user definition.
#[derive(Debug, Clone)]
struct DemoUser {
    username: &'static str,
    password: &'static str,
    groups: &'static [&'static str],
    email: &'static str,
}

/// The hard-coded demo users available in demo mode.
const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        username: "reader",
        password: "reader",
        groups: &[],
        email: "reader@demo.dossier.dev",
    },
    DemoUser {
        username: "editor",
        password: "editor",
        groups: &["editor"],
        email: "editor@demo.dossier.dev",
    },
    DemoUser {
        username: "admin",
        password: "admin",
        groups: &["admin"],
        email: "admin@demo.dossier.dev",
    },
];

/// Owner of the seeded sample documents.
pub const DEMO_OWNER: &str = "editor";

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: AuthenticatedUser,
}

/// Validate demo credentials and return the corresponding user.
pub fn authenticate_demo_user(username: &str, password: &str) -> Result<AuthenticatedUser, AppError> {
    DEMO_USERS
        .iter()
        .find(|u| u.username == username && u.password == password)
        .map(demo_identity)
        .ok_or_else(|| AppError::Auth("Invalid username or password".into()))
}

/// Identity of a demo user by name, without credentials.
pub fn demo_user(username: &str) -> Option<AuthenticatedUser> {
    DEMO_USERS
        .iter()
        .find(|u| u.username == username)
        .map(demo_identity)
}

fn demo_identity(user: &DemoUser) -> AuthenticatedUser {
    let groups: Vec<String> = user.groups.iter().map(|g| g.to_string()).collect();
    build_authenticated_user(
        format!("demo-{}", user.username),
        user.email.to_string(),
        &groups,
    )
}

#[cfg(feature = "ssr")]
fn session_cookie(value: String) -> axum_extra::extract::cookie::Cookie<'static> {
    axum_extra::extract::cookie::Cookie::build((crate::auth::middleware::SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(axum_extra::extract::cookie::SameSite::Lax)
        .max_age(time::Duration::hours(12))
        .build()
}

/// `POST /api/auth/login`: Demo login handler.
///
/// Validates credentials against the built-in user table.
/// On success, sets the session cookie and returns the user info.
#[cfg(feature = "ssr")]
pub async fn login_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    jar: axum_extra::extract::SignedCookieJar,
    axum::Json(req): axum::Json<LoginRequest>,
) -> Result<(axum_extra::extract::SignedCookieJar, axum::Json<LoginResponse>), AppError> {
    if !state.demo_mode {
        return Err(AppError::NotFound("Demo login is disabled".into()));
    }

    let user = authenticate_demo_user(&req.username, &req.password).inspect_err(|_| {
        tracing::info!(username = %req.username, "demo login rejected");
    })?;
    let jar = jar.add(session_cookie(crate::auth::middleware::encode_session(&user)?));
    tracing::info!(user = %user.user_id, "demo login");

    Ok((
        jar,
        axum::Json(LoginResponse {
            message: "Login successful".to_string(),
            user,
        }),
    ))
}

/// `GET /api/auth/me`: Returns the current user from the session cookie.
#[cfg(feature = "ssr")]
pub async fn me_handler(
    crate::auth::middleware::MaybeUser(user): crate::auth::middleware::MaybeUser,
) -> Result<axum::Json<AuthenticatedUser>, AppError> {
    user.map(axum::Json)
        .ok_or_else(|| AppError::Auth("Not logged in".into()))
}

/// `POST /api/auth/logout`: Clears the session cookie.
#[cfg(feature = "ssr")]
pub async fn logout_handler(
    jar: axum_extra::extract::SignedCookieJar,
) -> axum_extra::extract::SignedCookieJar {
    let cookie = axum_extra::extract::cookie::Cookie::build((crate::auth::middleware::SESSION_COOKIE, ""))
        .path("/")
        .removal()
        .build();

    jar.remove(cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_editor() {
        let user = authenticate_demo_user("editor", "editor").unwrap();
        assert_eq!(user.user_id, "demo-editor");
        assert_eq!(user.roles, vec!["editor"]);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_authenticate_admin() {
        let user = authenticate_demo_user("admin", "admin").unwrap();
        assert_eq!(user.user_id, "demo-admin");
        assert!(user.is_admin());
    }

    #[test]
    fn test_authenticate_reader() {
        let user = authenticate_demo_user("reader", "reader").unwrap();
        assert!(user.roles.is_empty());
    }

    #[test]
    fn test_wrong_password() {
        let result = authenticate_demo_user("editor", "wrong");
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[test]
    fn test_unknown_user() {
        assert!(authenticate_demo_user("nobody", "nothing").is_err());
        assert!(demo_user("nobody").is_none());
    }

    #[test]
    fn test_demo_owner_exists() {
        assert_eq!(demo_user(DEMO_OWNER).unwrap().user_id, "demo-editor");
    }
}
