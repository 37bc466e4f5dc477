use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::client::services::login;

#[component]
pub fn LoginPage() -> impl IntoView {
    let (username, set_username) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let error = RwSignal::new(None::<String>);
    let navigate = use_navigate();

    let submit = Action::new_local(move |_: &()| {
        let username = username.get_untracked();
        let password = password.get_untracked();
        let navigate = navigate.clone();
        async move {
            match login(username, password).await {
                Ok(_) => navigate("/", Default::default()),
                Err(e) if e.is_unauthorized() => error.set(Some("Invalid credentials".into())),
                Err(e) => error.set(Some(e.to_string())),
            }
        }
    });

    view! {
        <section class="login">
            <h1>"Sign in"</h1>
            {move || error.get().map(|e| view! { <div class="error-banner">{e}</div> })}
            <form on:submit=move |ev| {
                ev.prevent_default();
                submit.dispatch(());
            }>
                <label>
                    <span>"Username"</span>
                    <input
                        type="text"
                        autocomplete="username"
                        on:input=move |ev| set_username.set(event_target_value(&ev))
                        prop:value=username
                    />
                </label>
                <label>
                    <span>"Password"</span>
                    <input
                        type="password"
                        autocomplete="current-password"
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                        prop:value=password
                    />
                </label>
                <button type="submit" disabled=move || submit.pending().get()>"Sign in"</button>
            </form>
            <p class="hint">"Demo accounts: reader/reader, editor/editor, admin/admin"</p>
        </section>
    }
}
