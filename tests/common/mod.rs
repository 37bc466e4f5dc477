use std::sync::Arc;

use axum::Router;
use serde_json::{json, Value};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

use dossier::api::routes::api_routes;
use dossier::app::AppState;
use dossier::db::connection::MongoConnection;
use dossier::db::repository::{DocumentStore, MongoDocumentStore};
use dossier::search::registry::SearchConfigRegistry;

/// Config type used by most integration tests.
pub const CONFIG_TYPE: &str = "declarativeDocuments";

/// Holds the running MongoDB container and the API router wired to it.
///
/// The container is kept alive for as long as this struct lives.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    pub router: Router,
    pub store: Arc<dyn DocumentStore>,
    pub connection: Arc<MongoConnection>,
    state: AppState,
}

impl TestEnv {
    pub async fn start() -> Self {
        Self::start_with_demo_mode(true).await
    }

    pub async fn start_with_demo_mode(demo_mode: bool) -> Self {
        let mongo_container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);

        let connection = Arc::new(MongoConnection::new(mongo_uri));
        let store: Arc<dyn DocumentStore> = Arc::new(MongoDocumentStore::new(connection.clone()));

        let leptos_options = leptos::prelude::LeptosOptions::builder()
            .output_name("dossier")
            .build();

        let app_state = AppState {
            store: store.clone(),
            registry: Arc::new(SearchConfigRegistry::builtin().clone()),
            leptos_options,
            demo_mode,
            default_config_type: CONFIG_TYPE.to_string(),
            session_key: axum_extra::extract::cookie::Key::generate(),
        };

        // API routes only, no Leptos SSR.
        let router = api_routes().with_state(app_state.clone());

        Self {
            _mongo: mongo_container,
            router,
            store,
            connection,
            state: app_state,
        }
    }

    /// A permissive server over the same database and signing key, with
    /// demo mode switched to `demo_mode`.
    pub fn server_with_demo_mode(&self, demo_mode: bool) -> axum_test::TestServer {
        let state = AppState {
            demo_mode,
            ..self.state.clone()
        };
        axum_test::TestServer::builder()
            .build(api_routes().with_state(state))
    }

    /// A server that saves cookies and expects every response to succeed.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// A server that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .build(self.router.clone())
    }
}

/// Log `server` in as one of the demo users (password equals the name).
pub async fn login(server: &axum_test::TestServer, username: &str) {
    server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": username }))
        .expect_success()
        .await;
}

/// Create a document through the API and return its id.
pub async fn create(server: &axum_test::TestServer, title: &str, is_public: bool) -> String {
    let response = server
        .post("/api/documents")
        .json(&json!({
            "selectedDatabase": "sample_search",
            "collection": CONFIG_TYPE,
            "document": {
                "title": title,
                "Content": format!("Body of {title}"),
                "isPublic": is_public,
            }
        }))
        .expect_success()
        .await;
    let body: Value = response.json();
    body["result"]["insertedId"]
        .as_str()
        .expect("insertedId should be a hex string")
        .to_string()
}

/// Fetch a document as the current session sees it.
pub async fn find(server: &axum_test::TestServer, id: &str) -> axum_test::TestResponse {
    server
        .get(&format!("/api/documents/{id}"))
        .add_query_param("configType", CONFIG_TYPE)
        .await
}
