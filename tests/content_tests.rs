mod common;

use axum::http::StatusCode;
use common::{TestApp, str_id};
use serde_json::json;

#[tokio::test]
async fn test_only_members_of_the_community_can_post() {
    let app = TestApp::new();
    let owner = app.join_member("owner").await;
    let outsider = app.join_member("outsider").await;
    let community = str_id(&app.create_community(&owner, "photography").await);

    let (status, body) = app
        .post(
            &format!("/communities/{community}/posts"),
            Some(&outsider.access),
            json!({ "title": "Hello", "body": "Let me in" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    app.join_community(&outsider, &community).await;
    let post = app.create_post(&outsider, &community, "Hello").await;
    assert_eq!(post["score"], 0);
    assert_eq!(post["comment_count"], 0);
    assert_eq!(post["author_id"], outsider.id.to_string());
}

#[tokio::test]
async fn test_post_validation_and_missing_community() {
    let app = TestApp::new();
    let owner = app.join_member("owner").await;
    let community = str_id(&app.create_community(&owner, "writing").await);

    let (status, _) = app
        .post(
            &format!("/communities/{community}/posts"),
            Some(&owner.access),
            json!({ "title": "   ", "body": "text" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (status, _) = app
        .post(
            &format!("/communities/{missing}/posts"),
            Some(&owner.access),
            json!({ "title": "Lost", "body": "text" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_body_limit_follows_configuration() {
    let app = TestApp::new();
    let admin = app.join_admin("root@example.com", None).await;
    let owner = app.join_member("owner").await;
    let community = str_id(&app.create_community(&owner, "haiku").await);

    let (status, _) = app
        .post(
            "/admin/configurations",
            Some(&admin.access),
            json!({ "key": "post.max_body_length", "value": "18" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(
            &format!("/communities/{community}/posts"),
            Some(&owner.access),
            json!({ "title": "Too long", "body": "an old silent pond, a frog jumps in" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("body"));

    let (status, post) = app
        .post(
            &format!("/communities/{community}/posts"),
            Some(&owner.access),
            json!({ "title": "Fits", "body": "an old silent pond" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
}

#[tokio::test]
async fn test_post_edit_records_snapshots() {
    let app = TestApp::new();
    let owner = app.join_member("owner").await;
    let intruder = app.join_member("intruder").await;
    let community = str_id(&app.create_community(&owner, "journal").await);
    let post = str_id(&app.create_post(&owner, &community, "Day one").await);

    let (status, _) = app
        .put(
            &format!("/posts/{post}"),
            Some(&intruder.access),
            json!({ "title": "Vandalised" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(&format!("/posts/{post}"), Some(&owner.access), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .put(
            &format!("/posts/{post}"),
            Some(&owner.access),
            json!({ "title": "Day one (edited)" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Day one (edited)");
    assert_eq!(updated["body"], "Some body text");

    let (status, snapshots) = app.get(&format!("/posts/{post}/snapshots"), None).await;
    assert_eq!(status, StatusCode::OK);
    let snapshots = snapshots.as_array().unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0]["title"], "Day one");
    assert_eq!(snapshots[1]["title"], "Day one (edited)");
    assert_eq!(snapshots[1]["body"], "Some body text");
}

#[tokio::test]
async fn test_post_listing_filters_and_sort() {
    let app = TestApp::new();
    let alice = app.join_member("alice").await;
    let bob = app.join_member("bob").await;
    let community = str_id(&app.create_community(&alice, "science").await);
    app.join_community(&bob, &community).await;

    let first = str_id(&app.create_post(&alice, &community, "Quantum foam").await);
    let _second = str_id(&app.create_post(&bob, &community, "Plate tectonics").await);

    let (_, by_author) = app
        .get(&format!("/posts?author_id={}", bob.id), None)
        .await;
    assert_eq!(by_author["pagination"]["records"], 1);
    assert_eq!(by_author["data"][0]["title"], "Plate tectonics");

    let (_, searched) = app.get("/posts?search=quantum", None).await;
    assert_eq!(searched["pagination"]["records"], 1);

    let (_, newest) = app
        .get(&format!("/communities/{community}/posts"), None)
        .await;
    assert_eq!(newest["data"][0]["title"], "Plate tectonics");

    app.put(
        &format!("/posts/{first}/vote"),
        Some(&bob.access),
        json!({ "value": 1 }),
    )
    .await;
    let (status, top) = app
        .get(&format!("/communities/{community}/posts?sort=top"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(top["data"][0]["title"], "Quantum foam");
    assert_eq!(top["data"][0]["score"], 1);

    let (status, _) = app.get("/posts?sort=hot", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleting_community_hides_its_posts() {
    let app = TestApp::new();
    let owner = app.join_member("owner").await;
    let community = str_id(&app.create_community(&owner, "ephemeral").await);
    let post = str_id(&app.create_post(&owner, &community, "Soon gone").await);

    app.delete(&format!("/communities/{community}"), Some(&owner.access))
        .await;
    let (status, _) = app.get(&format!("/posts/{post}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, all) = app.get("/posts", None).await;
    assert_eq!(all["pagination"]["records"], 0);
}

#[tokio::test]
async fn test_comments_threading_and_counts() {
    let app = TestApp::new();
    let owner = app.join_member("owner").await;
    let commenter = app.join_member("commenter").await;
    let community = str_id(&app.create_community(&owner, "debate").await);
    let post = str_id(&app.create_post(&owner, &community, "Motion").await);
    let other_post = str_id(&app.create_post(&owner, &community, "Other").await);

    // Commenting does not require membership.
    let parent = app.create_comment(&commenter, &post, "First!").await;
    let parent_id = str_id(&parent);

    let (status, reply) = app
        .post(
            &format!("/posts/{post}/comments"),
            Some(&owner.access),
            json!({ "body": "Welcome", "parent_id": parent_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["parent_id"], parent_id);

    let (status, _) = app
        .post(
            &format!("/posts/{other_post}/comments"),
            Some(&owner.access),
            json!({ "body": "Wrong thread", "parent_id": parent_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = app.get(&format!("/posts/{post}/comments"), None).await;
    assert_eq!(listed["pagination"]["records"], 2);
    assert_eq!(listed["data"][0]["body"], "First!");

    let (_, post_view) = app.get(&format!("/posts/{post}"), None).await;
    assert_eq!(post_view["comment_count"], 2);

    let (status, _) = app
        .delete(&format!("/comments/{parent_id}"), Some(&owner.access))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .delete(&format!("/comments/{parent_id}"), Some(&commenter.access))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // A deleted comment cannot be replied to.
    let (status, _) = app
        .post(
            &format!("/posts/{post}/comments"),
            Some(&owner.access),
            json!({ "body": "Too late", "parent_id": parent_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comment_edit_is_author_only() {
    let app = TestApp::new();
    let owner = app.join_member("owner").await;
    let other = app.join_member("other").await;
    let community = str_id(&app.create_community(&owner, "edits").await);
    let post = str_id(&app.create_post(&owner, &community, "Thread").await);
    let comment = str_id(&app.create_comment(&owner, &post, "Typo hree").await);

    let (status, _) = app
        .put(
            &format!("/comments/{comment}"),
            Some(&other.access),
            json!({ "body": "Mine now" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .put(
            &format!("/comments/{comment}"),
            Some(&owner.access),
            json!({ "body": "Typo here" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["body"], "Typo here");
}

#[tokio::test]
async fn test_votes_replace_and_retract() {
    let app = TestApp::new();
    let owner = app.join_member("owner").await;
    let voter = app.join_member("voter").await;
    let community = str_id(&app.create_community(&owner, "polls").await);
    let post = str_id(&app.create_post(&owner, &community, "Tabs or spaces").await);

    let (status, summary) = app
        .put(
            &format!("/posts/{post}/vote"),
            Some(&voter.access),
            json!({ "value": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["score"], 1);
    assert_eq!(summary["my_vote"], 1);

    let (_, summary) = app
        .put(
            &format!("/posts/{post}/vote"),
            Some(&owner.access),
            json!({ "value": 1 }),
        )
        .await;
    assert_eq!(summary["score"], 2);

    // Replacing a vote never double counts.
    let (_, summary) = app
        .put(
            &format!("/posts/{post}/vote"),
            Some(&voter.access),
            json!({ "value": -1 }),
        )
        .await;
    assert_eq!(summary["score"], 0);

    let (status, summary) = app
        .delete(&format!("/posts/{post}/vote"), Some(&voter.access))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["score"], 1);
    assert!(summary["my_vote"].is_null());

    let (status, _) = app
        .delete(&format!("/posts/{post}/vote"), Some(&voter.access))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .put(
            &format!("/posts/{post}/vote"),
            Some(&voter.access),
            json!({ "value": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comment_votes_and_guest_rejection() {
    let app = TestApp::new();
    let owner = app.join_member("owner").await;
    let guest = app.join_guest().await;
    let community = str_id(&app.create_community(&owner, "karma").await);
    let post = str_id(&app.create_post(&owner, &community, "Post").await);
    let comment = str_id(&app.create_comment(&owner, &post, "Comment").await);

    let (status, summary) = app
        .put(
            &format!("/comments/{comment}/vote"),
            Some(&owner.access),
            json!({ "value": -1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["score"], -1);

    let (_, listed) = app.get(&format!("/comments/{comment}"), None).await;
    assert_eq!(listed["score"], -1);

    let (status, _) = app
        .put(
            &format!("/comments/{comment}/vote"),
            Some(&guest.access),
            json!({ "value": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = uuid::Uuid::new_v4();
    let (status, _) = app
        .put(
            &format!("/comments/{missing}/vote"),
            Some(&owner.access),
            json!({ "value": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_force_deletes_content() {
    let app = TestApp::new();
    let admin = app.join_admin("root@example.com", None).await;
    let owner = app.join_member("owner").await;
    let community = str_id(&app.create_community(&owner, "moderated").await);
    let post = str_id(&app.create_post(&owner, &community, "Off topic").await);
    let comment = str_id(&app.create_comment(&owner, &post, "Spam").await);

    let (status, _) = app
        .delete(&format!("/admin/comments/{comment}"), Some(&admin.access))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .delete(&format!("/admin/posts/{post}"), Some(&admin.access))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .delete(&format!("/admin/posts/{post}"), Some(&admin.access))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("/posts/{post}/snapshots"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
