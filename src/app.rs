use leptos::prelude::*;
use leptos_meta::{provide_meta_context, MetaTags, Stylesheet, Title};
use leptos_router::components::*;
use leptos_router::hooks::use_navigate;
use leptos_router::path;

use crate::client::services::{create_document, current_user, detail_href, display_value, fetch_configs, logout};
use crate::components::document_view::DocumentView;
use crate::components::login::LoginPage;
use crate::components::search_bar::SearchBar;
use crate::components::search_results::SearchResults;
use crate::search::registry::SearchConfigRegistry;

/// Shared server state handed to every axum handler.
#[cfg(feature = "ssr")]
#[derive(Clone)]
pub struct AppState {
    pub store: std::sync::Arc<dyn crate::db::repository::DocumentStore>,
    pub registry: std::sync::Arc<SearchConfigRegistry>,
    pub leptos_options: LeptosOptions,
    /// Enables `/api/auth/login` with the built-in demo accounts.
    pub demo_mode: bool,
    pub default_config_type: String,
    /// Signs the session cookie.
    pub session_key: axum_extra::extract::cookie::Key,
}

#[cfg(feature = "ssr")]
impl axum::extract::FromRef<AppState> for LeptosOptions {
    fn from_ref(state: &AppState) -> Self {
        state.leptos_options.clone()
    }
}

#[cfg(feature = "ssr")]
impl axum::extract::FromRef<AppState> for axum_extra::extract::cookie::Key {
    fn from_ref(state: &AppState) -> Self {
        state.session_key.clone()
    }
}

pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Stylesheet id="leptos" href="/pkg/dossier.css"/>
        <Title text="Dossier"/>

        <Router>
            <nav class="top-nav">
                <a class="logo" href="/">"Dossier"</a>
                <UserMenu/>
            </nav>
            <main>
                <Routes fallback=|| view! { "Page not found." }.into_view()>
                    <Route path=path!("/") view=HomePage/>
                    <Route path=path!("/result") view=SearchResults/>
                    <Route path=path!("/result/:id") view=DocumentView/>
                    <Route path=path!("/login") view=LoginPage/>
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn UserMenu() -> impl IntoView {
    let user = LocalResource::new(|| async { current_user().await.ok().flatten() });
    let sign_out = Action::new_local(move |_: &()| async move {
        if logout().await.is_ok() {
            user.refetch();
        }
    });

    view! {
        <Transition fallback=|| ()>
            {move || user.get().map(|user| match user {
                Some(user) => view! {
                    <div class="user-menu">
                        <span>{user.email}</span>
                        <button on:click=move |_| { sign_out.dispatch(()); }>"Sign out"</button>
                    </div>
                }.into_any(),
                None => view! { <a class="user-menu" href="/login">"Sign in"</a> }.into_any(),
            })}
        </Transition>
    }
}

#[component]
fn HomePage() -> impl IntoView {
    let configs = LocalResource::new(|| async { fetch_configs().await.map_err(|e| e.to_string()) });
    let user = LocalResource::new(|| async { current_user().await.ok().flatten() });
    let selected = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);
    let navigate = use_navigate();

    let config_type = Signal::derive(move || {
        let chosen = selected.get();
        if !chosen.is_empty() {
            return chosen;
        }
        configs
            .get()
            .and_then(Result::ok)
            .map(|list| list.default_config_type)
            .unwrap_or_default()
    });

    let create = Action::new_local(move |_: &()| {
        let config_type = config_type.get_untracked();
        let navigate = navigate.clone();
        async move {
            let Some(config) = SearchConfigRegistry::builtin().get(&config_type).cloned() else {
                return;
            };
            let mut draft = serde_json::Map::new();
            draft.insert(config.title_field().to_string(), "Untitled".into());
            draft.insert("isPublic".to_string(), false.into());
            let draft = serde_json::Value::Object(draft);
            match create_document(&config_type, &config, draft).await {
                Ok(inserted) => {
                    let id = display_value(&inserted.inserted_id);
                    navigate(&detail_href(&config, &config_type, &id), Default::default());
                }
                Err(e) => error.set(Some(e.to_string())),
            }
        }
    });

    view! {
        <section class="home">
            <h1>"Dossier"</h1>
            {move || error.get().map(|e| view! { <div class="error-banner">{e}</div> })}
            <Transition fallback=|| view! { <p>"Loading..."</p> }>
                {move || configs.get().map(|res| match res {
                    Ok(list) => view! {
                        <select
                            class="config-select"
                            on:change=move |ev| selected.set(event_target_value(&ev))
                            prop:value=move || config_type.get()
                        >
                            {list.configs.into_iter().map(|entry| {
                                let value = entry.config_type.clone();
                                view! { <option value=value>{entry.config_type}</option> }
                            }).collect_view()}
                        </select>
                    }.into_any(),
                    Err(e) => view! { <p class="error">{e}</p> }.into_any(),
                })}
            </Transition>
            <SearchBar config_type=config_type/>
            <Transition fallback=|| ()>
                {move || user.get().flatten().map(|_| view! {
                    <button class="new-document" on:click=move |_| { create.dispatch(()); }>
                        "New document"
                    </button>
                })}
            </Transition>
        </section>
    }
}
