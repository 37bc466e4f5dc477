#![cfg(feature = "ssr")]

mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn login_returns_user_info() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": "editor", "password": "editor" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["user_id"], "demo-editor");
    assert_eq!(body["user"]["email"], "editor@demo.dossier.dev");
    assert_eq!(body["user"]["roles"], json!(["editor"]));
}

#[tokio::test]
async fn login_invalid_credentials() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    server
        .post("/api/auth/login")
        .json(&json!({ "username": "editor", "password": "wrong" }))
        .await
        .assert_status_unauthorized();

    server.get("/api/auth/me").await.assert_status_unauthorized();
}

#[tokio::test]
async fn login_is_unavailable_outside_demo_mode() {
    let env = common::TestEnv::start_with_demo_mode(false).await;
    let server = env.server_permissive();

    server
        .post("/api/auth/login")
        .json(&json!({ "username": "admin", "password": "admin" }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn me_with_valid_cookie() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    common::login(&server, "admin").await;

    let user: Value = server.get("/api/auth/me").await.json();
    assert_eq!(user["user_id"], "demo-admin");
    assert_eq!(user["roles"], json!(["admin"]));
}

#[tokio::test]
async fn garbled_cookie_counts_as_no_session() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    server
        .get("/api/auth/me")
        .add_cookie(axum_extra::extract::cookie::Cookie::new("dossier_session", "%%not-base64%%"))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn logout_clears_the_session() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();
    common::login(&server, "reader").await;

    server.get("/api/auth/me").await.assert_status_ok();
    server.post("/api/auth/logout").expect_success().await;
    server.get("/api/auth/me").await.assert_status_unauthorized();

    // Identity-required routes now refuse the caller.
    server
        .post("/api/documents")
        .json(&json!({
            "configType": common::CONFIG_TYPE,
            "document": { "title": "After logout" }
        }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn unsigned_session_cookie_cannot_touch_documents() {
    let env = common::TestEnv::start().await;
    let owner = env.server();
    common::login(&owner, "editor").await;
    let id = common::create(&owner, "Owned Page", true).await;

    let forged_user = dossier::auth::middleware::build_authenticated_user(
        "demo-editor".into(),
        "x@evil".into(),
        &["admin".into()],
    );
    let forged = axum_extra::extract::cookie::Cookie::new(
        "dossier_session",
        dossier::auth::middleware::encode_session(&forged_user).unwrap(),
    );

    let attacker = env.server_permissive();
    attacker
        .get("/api/auth/me")
        .add_cookie(forged.clone())
        .await
        .assert_status_unauthorized();
    attacker
        .put(&format!("/api/documents/{id}"))
        .add_cookie(forged.clone())
        .json(&json!({
            "configType": common::CONFIG_TYPE,
            "update": { "title": "Hijacked", "isPublic": true }
        }))
        .await
        .assert_status_unauthorized();
    attacker
        .delete(&format!("/api/documents/{id}"))
        .add_cookie(forged)
        .add_query_param("configType", common::CONFIG_TYPE)
        .await
        .assert_status_unauthorized();

    let body: Value = common::find(&owner, &id).await.json();
    assert_eq!(body["result"]["title"], "Owned Page");
}

#[tokio::test]
async fn signed_session_is_ignored_outside_demo_mode() {
    let env = common::TestEnv::start().await;
    let owner = env.server();
    let session = owner
        .post("/api/auth/login")
        .json(&json!({ "username": "editor", "password": "editor" }))
        .await
        .cookie("dossier_session");
    let id = common::create(&owner, "Locked Page", true).await;

    let locked = env.server_with_demo_mode(false);
    locked
        .get("/api/auth/me")
        .add_cookie(session.clone())
        .await
        .assert_status_unauthorized();
    locked
        .delete(&format!("/api/documents/{id}"))
        .add_cookie(session.clone())
        .add_query_param("configType", common::CONFIG_TYPE)
        .await
        .assert_status_unauthorized();

    // The same cookie is still honoured while demo mode is on.
    let demo = env.server_with_demo_mode(true);
    let user: Value = demo
        .get("/api/auth/me")
        .add_cookie(session)
        .await
        .json();
    assert_eq!(user["user_id"], "demo-editor");
}
