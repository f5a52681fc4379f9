mod common;

use axum::http::StatusCode;
use common::{PASSWORD, TestApp, id_of};
use community_platform::AppConfig;
use community_platform::integrations::MockIntegrationProbe;
use community_platform::storage::MockStorageService;
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_guest_join_and_me() {
    let app = TestApp::new();
    let guest = app.join_guest().await;

    let (status, me) = app.get("/me", Some(&guest.access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "guest");
    assert_eq!(id_of(&me), guest.id);
    assert!(me.get("email").is_none());
}

#[tokio::test]
async fn test_member_join_normalizes_and_rejects_duplicates() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/auth/member/join",
            None,
            json!({
                "email": "  Alice@Example.COM ",
                "username": "Alice_1",
                "password": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["member"]["email"], "alice@example.com");
    assert_eq!(body["member"]["username"], "alice_1");
    assert!(body["member"].get("password_hash").is_none());

    let (status, body) = app
        .post(
            "/auth/member/join",
            None,
            json!({ "email": "alice@example.com", "username": "other", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = app
        .post(
            "/auth/member/join",
            None,
            json!({ "email": "new@example.com", "username": "ALICE_1", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_member_join_validation() {
    let app = TestApp::new();
    let cases = [
        json!({ "email": "not-an-email", "username": "valid", "password": PASSWORD }),
        json!({ "email": "a@b.c", "username": "no spaces", "password": PASSWORD }),
        json!({ "email": "a@b.c", "username": "ab", "password": PASSWORD }),
        json!({ "email": "a@b.c", "username": "valid", "password": "short" }),
    ];
    for payload in cases {
        let (status, body) = app.post("/auth/member/join", None, payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload} -> {body}");
        assert_eq!(body["error"], "validation_error");
    }
}

#[tokio::test]
async fn test_member_login_success_and_uniform_failure() {
    let app = TestApp::new();
    app.join_member("bob").await;

    let (status, body) = app
        .post(
            "/auth/member/login",
            None,
            json!({ "email": "BOB@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["member"]["username"], "bob");
    assert!(body["token"]["access_token"].is_string());

    let (wrong_pw, wrong_pw_body) = app
        .post(
            "/auth/member/login",
            None,
            json!({ "email": "bob@example.com", "password": "incorrect-password" }),
        )
        .await;
    let (unknown, unknown_body) = app
        .post(
            "/auth/member/login",
            None,
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, unknown_body);
}

#[tokio::test]
async fn test_missing_or_garbage_token_is_401() {
    let app = TestApp::new();
    let (status, body) = app.get("/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = app.get("/me", Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_cannot_be_used_as_access_token() {
    let app = TestApp::new();
    let member = app.join_member("carol").await;
    let (status, _) = app.get("/me", Some(&member.refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let app = TestApp::new();
    let member = app.join_member("dave").await;

    let (status, pair) = app
        .post(
            "/auth/member/refresh",
            None,
            json!({ "refresh_token": member.refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{pair}");
    let new_refresh = pair["refresh_token"].as_str().unwrap().to_string();
    let new_access = pair["access_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, member.refresh);

    // The old refresh token is spent.
    let (status, _) = app
        .post(
            "/auth/member/refresh",
            None,
            json!({ "refresh_token": member.refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The rotated pair works.
    let (status, _) = app.get("/me", Some(&new_access)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post(
            "/auth/member/refresh",
            None,
            json!({ "refresh_token": new_refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_requires_matching_role_route() {
    let app = TestApp::new();
    let guest = app.join_guest().await;

    let (status, _) = app
        .post(
            "/auth/member/refresh",
            None,
            json!({ "refresh_token": guest.refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/auth/guest/refresh",
            None,
            json!({ "refresh_token": guest.refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let app = TestApp::new();
    let member = app.join_member("erin").await;

    let (status, _) = app.post("/auth/logout", Some(&member.access), json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/me", Some(&member.access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .post(
            "/auth/member/refresh",
            None,
            json!({ "refresh_token": member.refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sessions_list_and_revoke_other_device() {
    let app = TestApp::new();
    let first = app.join_member("frank").await;
    let (status, second) = app
        .post(
            "/auth/member/login",
            None,
            json!({ "email": "frank@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let second_access = second["token"]["access_token"].as_str().unwrap().to_string();

    let (status, sessions) = app.get("/me/sessions", Some(&first.access)).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = sessions.as_array().unwrap().clone();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.get("refresh_jti").is_none()));

    // Newest first: the login session is at the head.
    let newest = sessions[0]["id"].as_str().unwrap();
    let (status, _) = app
        .delete(&format!("/me/sessions/{newest}"), Some(&first.access))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/me", Some(&second_access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/me", Some(&first.access)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .delete(&format!("/me/sessions/{newest}"), Some(&first.access))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_update_and_account_deletion() {
    let app = TestApp::new();
    let member = app.join_member("gina").await;

    let (status, updated) = app
        .put(
            "/me/profile",
            Some(&member.access),
            json!({ "display_name": "  Gina G  " }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["display_name"], "Gina G");

    let (status, _) = app.delete("/me", Some(&member.access)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/me", Some(&member.access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .post(
            "/auth/member/login",
            None,
            json!({ "email": "gina@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The username is free again once the account is gone.
    app.join_member("gina").await;
}

#[tokio::test]
async fn test_guest_cannot_use_member_routes() {
    let app = TestApp::new();
    let guest = app.join_guest().await;
    let (status, body) = app
        .put("/me/profile", Some(&guest.access), json!({ "display_name": "x" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_admin_bootstrap_then_join_key() {
    let config = AppConfig {
        admin_join_key: Some("let-me-in".to_string()),
        ..AppConfig::default()
    };
    let app = TestApp::with(
        MockStorageService::new(),
        MockIntegrationProbe::new(200),
        config,
    );

    let first = app.join_admin("root@example.com", None).await;
    let (status, me) = app.get("/me", Some(&first.access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "admin");

    let payload = |key: Option<&str>| {
        json!({
            "email": "second@example.com",
            "password": PASSWORD,
            "display_name": "Second",
            "join_key": key,
        })
    };
    let (status, _) = app.post("/auth/admin/join", None, payload(None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .post("/auth/admin/join", None, payload(Some("wrong")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .post("/auth/admin/join", None, payload(Some("let-me-in")))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(
            "/auth/admin/login",
            None,
            json!({ "email": "second@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admin"]["display_name"], "Second");
}

#[tokio::test]
async fn test_admin_join_closed_without_configured_key() {
    let app = TestApp::new();
    app.join_admin("root@example.com", None).await;
    let (status, _) = app
        .post(
            "/auth/admin/join",
            None,
            json!({
                "email": "late@example.com",
                "password": PASSWORD,
                "display_name": "Late",
                "join_key": "anything",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_routes_reject_members() {
    let app = TestApp::new();
    let member = app.join_member("henry").await;

    let (status, _) = app.get("/admin/stats", Some(&member.access)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/admin/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
