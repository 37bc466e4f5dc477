use leptos::prelude::*;
use leptos_router::hooks::use_query_map;

use crate::client::services::{detail_href, display_value, results_href, search_documents};
use crate::search::registry::SearchConfigRegistry;

/// Paginated result list for `/result?q&page&configType`.
#[component]
pub fn SearchResults() -> impl IntoView {
    let query_map = use_query_map();

    let config_type = move || query_map.read().get("configType").unwrap_or_default();
    let config = move || SearchConfigRegistry::builtin().get(&config_type()).cloned();
    let query = move || {
        config()
            .and_then(|c| query_map.read().get(&c.search_query_param))
            .unwrap_or_default()
    };
    let page = move || {
        query_map
            .read()
            .get("page")
            .and_then(|p| p.parse::<u64>().ok())
            .unwrap_or(1)
            .max(1)
    };

    let results = LocalResource::new(move || {
        let config_type = config_type();
        let config = config();
        let q = query();
        let page = page();
        async move {
            let Some(config) = config else {
                return Err(format!("Unknown configType '{config_type}'"));
            };
            search_documents(&config_type, &q, page, config.default_page_size)
                .await
                .map_err(|e| e.to_string())
        }
    });

    view! {
        <section class="results">
            <h1>"Results for “" {query} "”"</h1>
            <Suspense fallback=|| view! { <p>"Searching..."</p> }>
                {move || results.get().map(|res| match (res, config()) {
                    (Ok(page), Some(config)) => {
                        let config_type = config_type();
                        let q = query();
                        if page.results.is_empty() {
                            return view! { <p>"No results found."</p> }.into_any();
                        }
                        let prev = page.has_previous().then(|| results_href(&config, &config_type, &q, page.current_page - 1));
                        let next = page.has_next().then(|| results_href(&config, &config_type, &q, page.current_page + 1));
                        let title_field = config.summary_title_field().to_string();
                        let extra_fields: Vec<String> = config.search_results_summary_fields.iter().skip(1).cloned().collect();
                        view! {
                            <p class="result-count">{page.total_count} " documents"</p>
                            <ul class="result-list">
                                {page.results.into_iter().map(|hit| {
                                    let id = hit.get(&config.id_field).map(display_value).unwrap_or_default();
                                    let title = hit.get(&title_field).map(display_value).unwrap_or_else(|| id.clone());
                                    let href = detail_href(&config, &config_type, &id);
                                    let details = extra_fields.iter()
                                        .filter_map(|f| hit.get(f).map(display_value))
                                        .filter(|v| !v.is_empty())
                                        .map(|v| view! { <span class="summary-field">{v}</span> })
                                        .collect_view();
                                    view! {
                                        <li>
                                            <a href=href>{title}</a>
                                            {details}
                                        </li>
                                    }
                                }).collect_view()}
                            </ul>
                            <nav class="pager">
                                {prev.map(|href| view! { <a href=href>"Previous"</a> })}
                                <span>"Page " {page.current_page} " of " {page.total_pages}</span>
                                {next.map(|href| view! { <a href=href>"Next"</a> })}
                            </nav>
                        }.into_any()
                    }
                    (Ok(_), None) => view! { <p class="error">"Unknown configuration."</p> }.into_any(),
                    (Err(e), _) => view! { <p class="error">"Search error: " {e}</p> }.into_any(),
                })}
            </Suspense>
        </section>
    }
}
