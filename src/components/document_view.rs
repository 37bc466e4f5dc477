use leptos::prelude::*;
use leptos_router::hooks::{use_navigate, use_params_map, use_query_map};
use serde_json::{Map, Value};

use crate::auth::models::AuthenticatedUser;
use crate::client::services::{
    confirm, current_user, delete_document, detail_href, display_value, duplicate_document,
    format_date, get_document, update_document,
};
use crate::db::models::fields;
use crate::models::search_config::SearchConfig;
use crate::search::registry::SearchConfigRegistry;

/// Keys maintained by the server; shown read-only and never sent back.
const SERVER_FIELDS: &[&str] = &[
    fields::ID,
    fields::USER_ID,
    fields::USER_EMAIL,
    fields::IS_PUBLIC,
    fields::PUBLIC_SLUG,
    fields::CREATED_AT,
    fields::UPDATED_AT,
];

/// Editable fields of `config`, in detail-field order.
pub fn editable_fields(config: &SearchConfig) -> Vec<String> {
    config
        .find_one_detail_fields
        .iter()
        .filter(|f| !SERVER_FIELDS.contains(&f.as_str()) && **f != config.id_field)
        .cloned()
        .collect()
}

/// Turn edited text back into JSON. Fields that held non-string values are
/// parsed as JSON when possible so numbers and booleans keep their type.
pub fn build_patch(original: &Value, edits: &[(String, String)], is_public: bool) -> Value {
    let mut patch = Map::new();
    for (field, text) in edits {
        let value = match original.get(field) {
            Some(Value::String(_)) | None | Some(Value::Null) => Value::String(text.clone()),
            Some(_) => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone())),
        };
        patch.insert(field.clone(), value);
    }
    patch.insert(fields::IS_PUBLIC.to_string(), Value::Bool(is_public));
    Value::Object(patch)
}

/// Detail page for `/result/:id?configType`: view, edit, publish, copy and
/// delete.
#[component]
pub fn DocumentView() -> impl IntoView {
    let params = use_params_map();
    let query_map = use_query_map();
    let navigate = use_navigate();

    let id = move || params.read().get("id").unwrap_or_default();
    let config_type = move || query_map.read().get("configType").unwrap_or_default();
    let config = move || SearchConfigRegistry::builtin().get(&config_type()).cloned();

    let error = RwSignal::new(None::<String>);
    let editing = RwSignal::new(false);

    let document = LocalResource::new(move || {
        let id = id();
        let config_type = config_type();
        let config = config();
        async move {
            let config = config.ok_or_else(|| format!("Unknown configType '{config_type}'"))?;
            get_document(&config_type, &config, &id)
                .await
                .map_err(|e| e.to_string())
        }
    });

    let user = LocalResource::new(|| async { current_user().await.ok().flatten() });

    let save = Action::new_local(move |patch: &Value| {
        let patch = patch.clone();
        let id = id();
        let config_type = config_type();
        let config = config();
        async move {
            let Some(config) = config else { return };
            match update_document(&config_type, &config, &id, patch).await {
                Ok(_) => {
                    error.set(None);
                    editing.set(false);
                    document.refetch();
                }
                Err(e) => error.set(Some(e.to_string())),
            }
        }
    });

    let copy = {
        let navigate = navigate.clone();
        Action::new_local(move |_: &()| {
            let id = id();
            let config_type = config_type();
            let config = config();
            let navigate = navigate.clone();
            async move {
                let Some(config) = config else { return };
                match duplicate_document(&config_type, &config, &id).await {
                    Ok(created) => {
                        let new_id = created.get(&config.id_field).map(display_value).unwrap_or_default();
                        navigate(&detail_href(&config, &config_type, &new_id), Default::default());
                    }
                    Err(e) => error.set(Some(e.to_string())),
                }
            }
        })
    };

    let remove = Action::new_local(move |_: &()| {
        let id = id();
        let config_type = config_type();
        let config = config();
        let navigate = navigate.clone();
        async move {
            let Some(config) = config else { return };
            match delete_document(&config_type, &config, &id).await {
                Ok(_) => navigate("/", Default::default()),
                Err(e) => error.set(Some(e.to_string())),
            }
        }
    });

    view! {
        <section class="document">
            {move || error.get().map(|e| view! { <div class="error-banner">{e}</div> })}
            <Suspense fallback=|| view! { <p>"Loading..."</p> }>
                {move || document.get().map(|res| match (res, config()) {
                    (Ok(doc), Some(config)) => {
                        let user = user.get().flatten();
                        view! {
                            <DocumentBody
                                doc=doc
                                config=(*config).clone()
                                config_type=config_type()
                                user=user
                                editing=editing
                                on_save=Callback::new(move |patch: Value| { save.dispatch(patch); })
                                on_copy=Callback::new(move |_: ()| { copy.dispatch(()); })
                                on_delete=Callback::new(move |_: ()| {
                                    if confirm("Delete this document?") {
                                        remove.dispatch(());
                                    }
                                })
                            />
                        }.into_any()
                    }
                    (Ok(_), None) => view! { <p class="error">"Unknown configuration."</p> }.into_any(),
                    (Err(e), _) => view! { <p class="error">{e}</p> }.into_any(),
                })}
            </Suspense>
        </section>
    }
}

#[component]
fn DocumentBody(
    doc: Value,
    config: SearchConfig,
    config_type: String,
    user: Option<AuthenticatedUser>,
    editing: RwSignal<bool>,
    on_save: Callback<Value>,
    on_copy: Callback<()>,
    on_delete: Callback<()>,
) -> impl IntoView {
    let owner = doc.get(fields::USER_ID).and_then(Value::as_str).map(str::to_string);
    let can_manage = user
        .as_ref()
        .is_some_and(|u| u.can_manage(owner.as_deref()));
    let title = doc
        .get(config.title_field())
        .map(display_value)
        .unwrap_or_else(|| "Untitled".to_string());
    let is_public = RwSignal::new(doc.get(fields::IS_PUBLIC) == Some(&Value::Bool(true)));
    let slug = doc.get(fields::PUBLIC_SLUG).and_then(Value::as_str).map(str::to_string);

    let drafts: Vec<(String, RwSignal<String>)> = editable_fields(&config)
        .into_iter()
        .map(|field| {
            let text = doc.get(&field).map(display_value).unwrap_or_default();
            (field, RwSignal::new(text))
        })
        .collect();

    let rows: Vec<(String, String)> = config
        .find_one_detail_fields
        .iter()
        .filter_map(|field| {
            let value = doc.get(field)?;
            let text = match field.as_str() {
                fields::CREATED_AT | fields::UPDATED_AT => {
                    format_date(&display_value(value), &config.date_format)
                }
                _ => display_value(value),
            };
            Some((field.clone(), text))
        })
        .collect();

    let save = {
        let drafts = drafts.clone();
        let doc = doc.clone();
        move |_: leptos::ev::MouseEvent| {
            let edits: Vec<(String, String)> = drafts
                .iter()
                .map(|(field, text)| (field.clone(), text.get_untracked()))
                .collect();
            on_save.run(build_patch(&doc, &edits, is_public.get_untracked()));
        }
    };

    view! {
        <h1>{title}</h1>
        {slug.map(|s| {
            let href = format!(
                "/api/public/{}?configType={}",
                urlencoding::encode(&s),
                urlencoding::encode(&config_type)
            );
            view! { <p class="public-link">"Public link: " <a href=href.clone()><code>{href.clone()}</code></a></p> }
        })}
        <Show
            when=move || editing.get()
            fallback=move || {
                let rows = rows.clone();
                view! {
                    <table class="fields">
                        {rows.into_iter().map(|(field, text)| view! {
                            <tr><th>{field}</th><td>{text}</td></tr>
                        }).collect_view()}
                    </table>
                }
            }
        >
            <form class="editor" on:submit=|ev| ev.prevent_default()>
                {drafts.clone().into_iter().map(|(field, text)| view! {
                    <label>
                        <span>{field}</span>
                        <textarea
                            prop:value=move || text.get()
                            on:input=move |ev| text.set(event_target_value(&ev))
                        />
                    </label>
                }).collect_view()}
                <label class="toggle">
                    <input
                        type="checkbox"
                        prop:checked=move || is_public.get()
                        on:change=move |ev| is_public.set(event_target_checked(&ev))
                    />
                    "Public"
                </label>
                <button type="button" on:click=save.clone()>"Save"</button>
                <button type="button" on:click=move |_| editing.set(false)>"Cancel"</button>
            </form>
        </Show>
        <Show when=move || can_manage && !editing.get()>
            <div class="controls">
                <button on:click=move |_| editing.set(true)>"Edit"</button>
                <button on:click=move |_| on_copy.run(())>"Copy"</button>
                <button class="danger" on:click=move |_| on_delete.run(())>"Delete"</button>
            </div>
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editable_fields_skip_server_keys() {
        let config = SearchConfigRegistry::builtin()
            .get("declarativeDocuments")
            .unwrap();
        assert_eq!(editable_fields(config), vec!["title", "Content"]);
    }

    #[test]
    fn test_build_patch_keeps_types() {
        let original = serde_json::json!({ "title": "Old", "year": 1556, "tags": ["a"] });
        let edits = vec![
            ("title".to_string(), "New".to_string()),
            ("year".to_string(), "1605".to_string()),
            ("tags".to_string(), "not json".to_string()),
            ("bio".to_string(), "fresh".to_string()),
        ];
        let patch = build_patch(&original, &edits, true);
        assert_eq!(
            patch,
            serde_json::json!({
                "title": "New",
                "year": 1605,
                "tags": "not json",
                "bio": "fresh",
                "isPublic": true,
            })
        );
    }
}
