#[cfg(feature = "ssr")]
#[derive(clap::Parser, Debug)]
#[command(name = "dossier", version, about = "Configuration-driven document search server")]
struct Cli {
    /// Path to a TOML configuration file (defaults to config/dossier.toml if present).
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Insert sample documents into empty collections before serving.
    #[arg(long)]
    seed_demo: bool,
}

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use clap::Parser;
    use dossier::api::routes::api_routes;
    use dossier::app::{shell, App, AppState};
    use dossier::config::AppConfig;
    use dossier::db::connection::{redact_uri, MongoConnection};
    use dossier::db::repository::{DocumentStore, MongoDocumentStore};
    use dossier::search::registry::SearchConfigRegistry;
    use leptos::prelude::*;
    use leptos_axum::{generate_route_list, LeptosRoutes};
    use std::sync::Arc;
    use tower_http::services::ServeDir;
    use tower_http::trace::TraceLayer;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dossier=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    tracing::info!(environment = ?config.environment, "Starting Dossier server...");

    let conf = get_configuration(None).context("Failed to read Leptos options")?;
    let leptos_options = conf.leptos_options;
    let addr = leptos_options.site_addr;
    let site_root = leptos_options.site_root.to_string();

    let registry = SearchConfigRegistry::builtin();
    tracing::info!(configs = ?registry.config_types(), "Search configs loaded");

    let connection = Arc::new(MongoConnection::new(config.mongodb_uri.clone()));
    tracing::info!("MongoDB configured at {}", redact_uri(&config.mongodb_uri));
    let store: Arc<dyn DocumentStore> = Arc::new(MongoDocumentStore::new(connection.clone()));

    if config.ensure_search_indexes {
        let created = dossier::db::indexes::ensure_search_indexes(&connection, registry).await;
        tracing::info!("{created} of {} search indexes created", registry.len());
    }

    if config.seed_demo_data || cli.seed_demo {
        if let Err(e) = dossier::demo_seeder::seed_demo_data(store.as_ref(), registry).await {
            tracing::error!("Demo data seeding failed: {e}");
        }
    }

    if config.demo_mode && config.is_production() {
        tracing::warn!("Demo login is enabled in production");
    }

    let app_state = AppState {
        store,
        registry: Arc::new(registry.clone()),
        leptos_options: leptos_options.clone(),
        demo_mode: config.demo_mode,
        default_config_type: config.default_config_type.clone(),
        session_key: config.session_key()?,
    };

    let routes = generate_route_list(App);

    let app = api_routes()
        .leptos_routes(&app_state, routes, {
            let leptos_options = leptos_options.clone();
            move || shell(leptos_options.clone())
        })
        .fallback_service(ServeDir::new(&site_root))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// When compiled for WASM (client-side), there's no main function.
// The hydrate() function in lib.rs handles client-side initialization.
#[cfg(not(feature = "ssr"))]
fn main() {}
