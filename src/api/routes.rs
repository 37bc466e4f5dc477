use axum::routing::{get, post};
use axum::Router;

use crate::api::{configs, documents, search};
use crate::app::AppState;
use crate::auth::demo_auth;

/// All JSON endpoints. Shared by the server binary and the integration tests.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(search::search_handler))
        .route("/api/documents", post(documents::create_handler))
        .route(
            "/api/documents/{id}",
            get(documents::find_one_handler)
                .put(documents::update_handler)
                .delete(documents::delete_handler)
                .post(documents::duplicate_handler),
        )
        .route("/api/public/{slug}", get(documents::find_by_slug_handler))
        .route("/api/configs", get(configs::list_configs_handler))
        .route("/api/configs/{config_type}", get(configs::get_config_handler))
        .route("/api/auth/login", post(demo_auth::login_handler))
        .route("/api/auth/me", get(demo_auth::me_handler))
        .route("/api/auth/logout", post(demo_auth::logout_handler))
}
