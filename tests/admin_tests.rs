mod common;

use axum::http::StatusCode;
use common::{TestApp, id_of, str_id};
use community_platform::{AppConfig, MockIntegrationProbe, MockStorageService};
use serde_json::json;

#[tokio::test]
async fn test_configurations_crud() {
    let app = TestApp::new();
    let admin = app.join_admin("root@example.com", None).await;

    let (status, created) = app
        .post(
            "/admin/configurations",
            Some(&admin.access),
            json!({ "key": "site.name", "value": "Arena", "description": "Shown in the header" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let id = str_id(&created);

    let (status, _) = app
        .post(
            "/admin/configurations",
            Some(&admin.access),
            json!({ "key": "site.name", "value": "Other" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    for bad in ["Site.Name", "has space", ""] {
        let (status, _) = app
            .post(
                "/admin/configurations",
                Some(&admin.access),
                json!({ "key": bad, "value": "x" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
    }

    let (status, updated) = app
        .put(
            &format!("/admin/configurations/{id}"),
            Some(&admin.access),
            json!({ "value": "Arena Communities" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["value"], "Arena Communities");
    assert_eq!(updated["description"], "Shown in the header");

    app.post(
        "/admin/configurations",
        Some(&admin.access),
        json!({ "key": "a.first", "value": "1" }),
    )
    .await;
    let (_, listed) = app.get("/admin/configurations", Some(&admin.access)).await;
    assert_eq!(listed["pagination"]["records"], 2);
    assert_eq!(listed["data"][0]["key"], "a.first");

    let (status, _) = app
        .delete(&format!("/admin/configurations/{id}"), Some(&admin.access))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .get(&format!("/admin/configurations/{id}"), Some(&admin.access))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The key is free again after deletion.
    let (status, _) = app
        .post(
            "/admin/configurations",
            Some(&admin.access),
            json!({ "key": "site.name", "value": "Arena" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_integrations_crud() {
    let app = TestApp::new();
    let admin = app.join_admin("root@example.com", None).await;

    let (status, created) = app
        .post(
            "/admin/integrations",
            Some(&admin.access),
            json!({
                "name": " alerts ",
                "kind": "slack",
                "endpoint_url": "https://hooks.example.com/notify",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["name"], "alerts");
    assert_eq!(created["enabled"], true);
    let id = str_id(&created);

    let (status, _) = app
        .post(
            "/admin/integrations",
            Some(&admin.access),
            json!({ "name": "alerts", "kind": "webhook", "endpoint_url": "https://a.example.com/x" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    for url in ["not a url", "ftp://files.example.com/drop"] {
        let (status, _) = app
            .post(
                "/admin/integrations",
                Some(&admin.access),
                json!({ "name": "broken", "kind": "webhook", "endpoint_url": url }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{url}");
    }

    let (_, other) = app
        .post(
            "/admin/integrations",
            Some(&admin.access),
            json!({ "name": "audit", "kind": "discord", "endpoint_url": "https://discord.example.com/hook" }),
        )
        .await;
    let (status, _) = app
        .put(
            &format!("/admin/integrations/{}", str_id(&other)),
            Some(&admin.access),
            json!({ "name": "alerts" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Renaming to its own name is not a conflict.
    let (status, updated) = app
        .put(
            &format!("/admin/integrations/{id}"),
            Some(&admin.access),
            json!({ "name": "alerts", "enabled": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["enabled"], false);

    let (_, listed) = app.get("/admin/integrations", Some(&admin.access)).await;
    assert_eq!(listed["pagination"]["records"], 2);
    assert_eq!(listed["data"][0]["name"], "alerts");

    let (status, _) = app
        .delete(&format!("/admin/integrations/{id}"), Some(&admin.access))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .get(&format!("/admin/integrations/{id}"), Some(&admin.access))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn register(app: &TestApp, token: &str, enabled: bool) -> String {
    let (status, created) = app
        .post(
            "/admin/integrations",
            Some(token),
            json!({
                "name": "ops",
                "kind": "webhook",
                "endpoint_url": "http://127.0.0.1:9/hook",
                "enabled": enabled,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    str_id(&created)
}

#[tokio::test]
async fn test_ping_reports_endpoint_status() {
    let app = TestApp::new();
    let admin = app.join_admin("root@example.com", None).await;
    let id = register(&app, &admin.access, true).await;

    let (status, result) = app
        .post(
            &format!("/admin/integrations/{id}/ping"),
            Some(&admin.access),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{result}");
    assert_eq!(result["status_code"], 200);
    assert_eq!(result["success"], true);
    assert_eq!(result["integration_id"], id);
    assert_eq!(app.probe.pinged(), vec![id.parse::<uuid::Uuid>().unwrap()]);
}

#[tokio::test]
async fn test_ping_non_success_status_is_not_an_error() {
    let app = TestApp::with(
        MockStorageService::new(),
        MockIntegrationProbe::new(503),
        AppConfig::default(),
    );
    let admin = app.join_admin("root@example.com", None).await;
    let id = register(&app, &admin.access, true).await;

    let (status, result) = app
        .post(
            &format!("/admin/integrations/{id}/ping"),
            Some(&admin.access),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["status_code"], 503);
    assert_eq!(result["success"], false);
}

#[tokio::test]
async fn test_ping_unreachable_is_bad_gateway() {
    let app = TestApp::with(
        MockStorageService::new(),
        MockIntegrationProbe::unreachable(),
        AppConfig::default(),
    );
    let admin = app.join_admin("root@example.com", None).await;
    let id = register(&app, &admin.access, true).await;

    let (status, body) = app
        .post(
            &format!("/admin/integrations/{id}/ping"),
            Some(&admin.access),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "bad_gateway");
}

#[tokio::test]
async fn test_ping_disabled_integration_is_conflict() {
    let app = TestApp::new();
    let admin = app.join_admin("root@example.com", None).await;
    let id = register(&app, &admin.access, false).await;

    let (status, _) = app
        .post(
            &format!("/admin/integrations/{id}/ping"),
            Some(&admin.access),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(app.probe.pinged().is_empty());
}

#[tokio::test]
async fn test_stats_count_active_rows() {
    let app = TestApp::new();
    let admin = app.join_admin("root@example.com", None).await;
    let alice = app.join_member("alice").await;
    let bob = app.join_member("bob").await;
    let community = str_id(&app.create_community(&alice, "stats").await);
    let post = str_id(&app.create_post(&alice, &community, "Counted").await);
    let comment = str_id(&app.create_comment(&bob, &post, "Also counted").await);
    app.put(
        &format!("/posts/{post}/vote"),
        Some(&bob.access),
        json!({ "value": 1 }),
    )
    .await;
    app.post(
        "/reports",
        Some(&bob.access),
        json!({ "target_type": "post", "target_id": post, "reason": "testing" }),
    )
    .await;
    app.delete(&format!("/comments/{comment}"), Some(&bob.access))
        .await;

    let (status, stats) = app.get("/admin/stats", Some(&admin.access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_members"], 2);
    assert_eq!(stats["total_communities"], 1);
    assert_eq!(stats["total_posts"], 1);
    assert_eq!(stats["total_comments"], 0);
    assert_eq!(stats["total_votes"], 1);
    assert_eq!(stats["pending_reports"], 1);
}

#[tokio::test]
async fn test_members_list_search_and_delete() {
    let app = TestApp::new();
    let admin = app.join_admin("root@example.com", None).await;
    let alice = app.join_member("alice").await;
    app.join_member("bob").await;

    let (status, listed) = app.get("/admin/members", Some(&admin.access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["pagination"]["records"], 2);
    assert_eq!(listed["data"][0]["username"], "bob");

    let (_, searched) = app
        .get("/admin/members?search=ALI", Some(&admin.access))
        .await;
    assert_eq!(searched["pagination"]["records"], 1);
    assert_eq!(id_of(&searched["data"][0]), alice.id);

    let (status, _) = app
        .delete(&format!("/admin/members/{}", alice.id), Some(&admin.access))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/me", Some(&alice.access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .post(
            "/auth/member/refresh",
            None,
            json!({ "refresh_token": alice.refresh }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .delete(&format!("/admin/members/{}", alice.id), Some(&admin.access))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_presigned_upload_url() {
    let app = TestApp::new();
    let member = app.join_member("uploader").await;

    let (status, body) = app
        .post(
            "/uploads/presigned",
            Some(&member.access),
            json!({ "filename": "banner.PNG", "file_type": "image/png" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let key = body["resource_key"].as_str().unwrap();
    assert!(key.starts_with(&format!("uploads/{}/", member.id)));
    assert!(key.ends_with(".png"));
    assert!(body["upload_url"].as_str().unwrap().contains(key));

    let (status, _) = app
        .post(
            "/uploads/presigned",
            Some(&member.access),
            json!({ "filename": "script.sh", "file_type": "application/x-sh" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let guest = app.join_guest().await;
    let (status, _) = app
        .post(
            "/uploads/presigned",
            Some(&guest.access),
            json!({ "filename": "a.png", "file_type": "image/png" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_presign_storage_failure_is_bad_gateway() {
    let app = TestApp::with(
        MockStorageService::new_failing(),
        MockIntegrationProbe::new(200),
        AppConfig::default(),
    );
    let member = app.join_member("uploader").await;
    let (status, body) = app
        .post(
            "/uploads/presigned",
            Some(&member.access),
            json!({ "filename": "a.png", "file_type": "image/png" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "bad_gateway");
}
