pub mod app;
pub mod error;
#[cfg(feature = "ssr")]
pub mod config;
pub mod demo_seeder;
pub mod models {
    pub mod document;
    pub mod search;
    pub mod search_config;
}
pub mod search {
    pub mod pipeline;
    pub mod registry;
}
pub mod auth {
    pub mod demo_auth;
    pub mod middleware;
    pub mod models;
    pub mod visibility;
}
pub mod db {
    #[cfg(feature = "ssr")]
    pub mod connection;
    #[cfg(feature = "ssr")]
    pub mod indexes;
    pub mod models;
    pub mod repository;
    pub mod slug;
    #[cfg(test)]
    pub mod testing;
}
pub mod api {
    pub mod configs;
    pub mod documents;
    pub mod errors;
    #[cfg(feature = "ssr")]
    pub mod routes;
    pub mod search;
}
pub mod client {
    pub mod services;
}
pub mod components {
    pub mod document_view;
    pub mod login;
    pub mod search_bar;
    pub mod search_results;
}

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(app::App);
}
