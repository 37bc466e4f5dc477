use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::client::services::{debounce, detail_href, fetch_suggestions, results_href};
use crate::search::registry::SearchConfigRegistry;

/// Free-text input with debounced suggestions. Enter opens the results page.
#[component]
pub fn SearchBar(#[prop(into)] config_type: Signal<String>) -> impl IntoView {
    let (query, set_query) = signal(String::new());
    let navigate = use_navigate();

    let config = move || SearchConfigRegistry::builtin().get(&config_type.get()).cloned();

    let suggestions = LocalResource::new(move || {
        let q = query.get();
        let config_type = config_type.get();
        let config = config();
        async move {
            let Some(config) = config else {
                return Ok(Vec::new());
            };
            if q.trim().chars().count() < config.min_search_length {
                return Ok(Vec::new());
            }
            debounce(config.debounce_time).await;
            if query.get_untracked() != q {
                return Ok(Vec::new());
            }
            fetch_suggestions(&config_type, &config, &q).await
        }
    });

    let on_keydown = move |ev: leptos::ev::KeyboardEvent| {
        if ev.key() != "Enter" {
            return;
        }
        let q = query.get_untracked();
        if q.trim().is_empty() {
            return;
        }
        if let Some(config) = config() {
            navigate(
                &results_href(&config, &config_type.get_untracked(), &q, 1),
                Default::default(),
            );
        }
    };

    view! {
        <div class="search-container">
            <input
                type="search"
                placeholder="Search..."
                on:input=move |ev| set_query.set(event_target_value(&ev))
                on:keydown=on_keydown
                prop:value=query
            />
            <Transition fallback=|| ()>
                {move || suggestions.get().map(|res| match res {
                    Ok(items) if items.is_empty() => ().into_any(),
                    Ok(items) => {
                        let config_type = config_type.get_untracked();
                        let config = config();
                        view! {
                            <ul class="suggestions">
                                {items.into_iter().map(|(id, label)| {
                                    let href = config
                                        .as_ref()
                                        .map(|c| detail_href(c, &config_type, &id))
                                        .unwrap_or_default();
                                    view! { <li><a href=href>{label}</a></li> }
                                }).collect_view()}
                            </ul>
                        }.into_any()
                    }
                    Err(e) => view! { <p class="error">"Search error: " {e.to_string()}</p> }.into_any(),
                })}
            </Transition>
        </div>
    }
}
