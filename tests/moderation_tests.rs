mod common;

use axum::http::StatusCode;
use common::{Actor, TestApp, str_id};
use serde_json::{Value, json};

struct Fixture {
    app: TestApp,
    admin: Actor,
    author: Actor,
    reporter: Actor,
    post: String,
    comment: String,
}

async fn fixture() -> Fixture {
    let app = TestApp::new();
    let admin = app.join_admin("root@example.com", None).await;
    let author = app.join_member("author").await;
    let reporter = app.join_member("reporter").await;
    let community = str_id(&app.create_community(&author, "reviewed").await);
    let post = str_id(&app.create_post(&author, &community, "Questionable").await);
    let comment = str_id(&app.create_comment(&author, &post, "Rude remark").await);
    Fixture {
        app,
        admin,
        author,
        reporter,
        post,
        comment,
    }
}

async fn report(app: &TestApp, who: &Actor, target_type: &str, target_id: &str) -> (StatusCode, Value) {
    app.post(
        "/reports",
        Some(&who.access),
        json!({ "target_type": target_type, "target_id": target_id, "reason": "  breaks the rules " }),
    )
    .await
}

#[tokio::test]
async fn test_report_filing_and_duplicate_pending() {
    let f = fixture().await;

    let (status, filed) = report(&f.app, &f.reporter, "post", &f.post).await;
    assert_eq!(status, StatusCode::CREATED, "{filed}");
    assert_eq!(filed["status"], "pending");
    assert_eq!(filed["reason"], "breaks the rules");
    assert_eq!(filed["reporter_id"], f.reporter.id.to_string());

    let (status, body) = report(&f.app, &f.reporter, "post", &f.post).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // A different target, or a different reporter, is a fresh report.
    let (status, _) = report(&f.app, &f.reporter, "comment", &f.comment).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = report(&f.app, &f.author, "post", &f.post).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, mine) = f.app.get("/me/reports", Some(&f.reporter.access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["pagination"]["records"], 2);
}

#[tokio::test]
async fn test_report_validation_and_missing_target() {
    let f = fixture().await;

    let missing = uuid::Uuid::new_v4().to_string();
    let (status, _) = report(&f.app, &f.reporter, "comment", &missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A post id is not a comment id.
    let (status, _) = report(&f.app, &f.reporter, "comment", &f.post).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = f
        .app
        .post(
            "/reports",
            Some(&f.reporter.access),
            json!({ "target_type": "post", "target_id": f.post, "reason": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let guest = f.app.join_guest().await;
    let (status, _) = report(&f.app, &guest, "post", &f.post).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_lists_and_filters_reports() {
    let f = fixture().await;
    let (_, first) = report(&f.app, &f.reporter, "post", &f.post).await;
    let (_, second) = report(&f.app, &f.reporter, "comment", &f.comment).await;

    let (status, all) = f.app.get("/admin/reports", Some(&f.admin.access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["pagination"]["records"], 2);
    assert_eq!(all["data"][0]["id"], second["id"]);

    let (status, _) = f
        .app
        .put(
            &format!("/admin/reports/{}", str_id(&first)),
            Some(&f.admin.access),
            json!({ "status": "dismissed", "resolution_note": "fine as is" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, pending) = f
        .app
        .get("/admin/reports?status=pending", Some(&f.admin.access))
        .await;
    assert_eq!(pending["pagination"]["records"], 1);
    assert_eq!(pending["data"][0]["id"], second["id"]);

    let (_, dismissed) = f
        .app
        .get("/admin/reports?status=dismissed", Some(&f.admin.access))
        .await;
    assert_eq!(dismissed["data"][0]["resolution_note"], "fine as is");
    assert_eq!(dismissed["data"][0]["resolved_by"], f.admin.id.to_string());

    // Only pending reports block a new one.
    let (status, _) = report(&f.app, &f.reporter, "post", &f.post).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, fetched) = f
        .app
        .get(&format!("/admin/reports/{}", str_id(&second)), Some(&f.admin.access))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["target_type"], "comment");

    let (status, _) = f
        .app
        .get(
            &format!("/admin/reports/{}", uuid::Uuid::new_v4()),
            Some(&f.admin.access),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resolving_with_removal_deletes_content() {
    let f = fixture().await;
    let (_, filed) = report(&f.app, &f.reporter, "comment", &f.comment).await;
    let report_id = str_id(&filed);

    let (status, _) = f
        .app
        .put(
            &format!("/admin/reports/{report_id}"),
            Some(&f.admin.access),
            json!({ "status": "pending" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = f
        .app
        .put(
            &format!("/admin/reports/{report_id}"),
            Some(&f.admin.access),
            json!({ "status": "dismissed", "remove_content": true }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, closed) = f
        .app
        .put(
            &format!("/admin/reports/{report_id}"),
            Some(&f.admin.access),
            json!({ "status": "resolved", "remove_content": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{closed}");
    assert_eq!(closed["status"], "resolved");
    assert!(closed["resolved_at"].is_string());

    let (status, _) = f.app.get(&format!("/comments/{}", f.comment), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = f
        .app
        .put(
            &format!("/admin/reports/{report_id}"),
            Some(&f.admin.access),
            json!({ "status": "dismissed" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_banned_words_admin_crud_and_screening() {
    let f = fixture().await;
    let community = str_id(&f.app.create_community(&f.author, "filtered").await);

    let (status, word) = f
        .app
        .post(
            "/admin/banned-words",
            Some(&f.admin.access),
            json!({ "word": "  Heck " }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(word["word"], "heck");

    let (status, _) = f
        .app
        .post(
            "/admin/banned-words",
            Some(&f.admin.access),
            json!({ "word": "HECK" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = f
        .app
        .post(
            &format!("/communities/{community}/posts"),
            Some(&f.author.access),
            json!({ "title": "What the HECK", "body": "clean" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("title"));

    let (status, _) = f
        .app
        .post(
            &format!("/posts/{}/comments", f.post),
            Some(&f.reporter.access),
            json!({ "body": "heck no" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Whole tokens only.
    f.app
        .create_comment(&f.reporter, &f.post, "Checking in from Heckmondwike")
        .await;

    let (status, listed) = f.app.get("/admin/banned-words", Some(&f.admin.access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let word_id = str_id(&word);
    let (status, _) = f
        .app
        .delete(&format!("/admin/banned-words/{word_id}"), Some(&f.admin.access))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = f
        .app
        .delete(&format!("/admin/banned-words/{word_id}"), Some(&f.admin.access))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    f.app.create_comment(&f.reporter, &f.post, "heck yes").await;
}

#[tokio::test]
async fn test_banned_words_require_admin() {
    let f = fixture().await;
    let (status, _) = f
        .app
        .post(
            "/admin/banned-words",
            Some(&f.author.access),
            json!({ "word": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
