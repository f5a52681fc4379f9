//! Runs against a live Postgres: `DATABASE_URL=... cargo test -- --ignored`.

use community_platform::{
    error::RepoError,
    models::{
        NewAdmin, NewComment, NewCommunity, NewMember, NewPost, NewReport, PageRequest, PostFilter,
        PostSort, ReportStatus, ReportTarget, VoteTarget,
    },
    repository::{PostgresRepository, Repository},
};
use sqlx::PgPool;
use uuid::Uuid;

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

/// Unique handle per run so tests can share one database.
fn handle(prefix: &str) -> String {
    format!("{prefix}_{}", &Uuid::new_v4().simple().to_string()[..12])
}

async fn member(repo: &PostgresRepository) -> Uuid {
    let username = handle("m");
    repo.create_member(NewMember {
        email: format!("{username}@example.com"),
        username,
        display_name: None,
        password_hash: "not-a-real-hash".to_string(),
    })
    .await
    .expect("create member")
    .id
}

async fn community(repo: &PostgresRepository, owner_id: Uuid) -> Uuid {
    repo.create_community(NewCommunity {
        name: handle("c"),
        title: "Integration".to_string(),
        description: None,
        category_id: None,
        owner_id,
    })
    .await
    .expect("create community")
    .id
}

#[tokio::test]
#[ignore]
async fn test_duplicate_username_maps_to_conflict() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let username = handle("dup");
    let new = |email: &str| NewMember {
        email: email.to_string(),
        username: username.clone(),
        display_name: None,
        password_hash: "x".to_string(),
    };

    repo.create_member(new(&format!("{username}@a.example")))
        .await
        .unwrap();
    let err = repo
        .create_member(new(&format!("{username}@b.example")))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)), "{err:?}");
}

#[tokio::test]
#[ignore]
async fn test_community_owner_membership_and_soft_delete() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let owner = member(&repo).await;
    let community_id = community(&repo, owner).await;

    assert!(repo.get_membership(community_id, owner).await.unwrap().is_some());
    let fetched = repo.get_community(community_id).await.unwrap().unwrap();
    assert_eq!(fetched.member_count, 1);

    assert!(repo.delete_community(community_id).await.unwrap());
    assert!(repo.get_community(community_id).await.unwrap().is_none());
    assert!(!repo.delete_community(community_id).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_post_snapshots_and_vote_score() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let owner = member(&repo).await;
    let voter = member(&repo).await;
    let community_id = community(&repo, owner).await;

    let post = repo
        .create_post(NewPost {
            community_id,
            author_id: owner,
            title: "First".to_string(),
            body: "Body".to_string(),
        })
        .await
        .unwrap();
    repo.update_post(post.id, Some("Second".to_string()), None)
        .await
        .unwrap()
        .unwrap();

    let snapshots = repo.list_post_snapshots(post.id).await.unwrap();
    let titles: Vec<&str> = snapshots.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["First", "Second"]);

    repo.cast_vote(VoteTarget::Post, post.id, voter, 1).await.unwrap();
    repo.cast_vote(VoteTarget::Post, post.id, owner, 1).await.unwrap();
    repo.cast_vote(VoteTarget::Post, post.id, voter, -1).await.unwrap();
    assert_eq!(repo.vote_score(VoteTarget::Post, post.id).await.unwrap(), 0);

    assert!(repo.remove_vote(VoteTarget::Post, post.id, voter).await.unwrap());
    assert!(!repo.remove_vote(VoteTarget::Post, post.id, voter).await.unwrap());

    let listed = repo
        .list_posts(
            PostFilter {
                community_id: Some(community_id),
                sort: PostSort::Top,
                ..PostFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(listed.pagination.records, 1);
    assert_eq!(listed.data[0].score, 1);
}

#[tokio::test]
#[ignore]
async fn test_comment_count_and_report_resolution() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let owner = member(&repo).await;
    let reporter = member(&repo).await;
    let admin_id = repo
        .create_admin(NewAdmin {
            email: format!("{}@example.com", handle("admin")),
            display_name: "Moderator".to_string(),
            password_hash: "x".to_string(),
        })
        .await
        .unwrap()
        .id;
    let community_id = community(&repo, owner).await;
    let post = repo
        .create_post(NewPost {
            community_id,
            author_id: owner,
            title: "Thread".to_string(),
            body: String::new(),
        })
        .await
        .unwrap();
    let comment = repo
        .create_comment(NewComment {
            post_id: post.id,
            author_id: reporter,
            parent_id: None,
            body: "hello".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(repo.get_post(post.id).await.unwrap().unwrap().comment_count, 1);

    let report = repo
        .create_report(NewReport {
            reporter_id: reporter,
            target_type: ReportTarget::Comment,
            target_id: comment.id,
            reason: "test".to_string(),
        })
        .await
        .unwrap();
    assert!(
        repo.find_pending_report(reporter, ReportTarget::Comment, comment.id)
            .await
            .unwrap()
            .is_some()
    );

    let closed = repo
        .resolve_report(report.id, ReportStatus::Dismissed, admin_id, None, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(closed.report.status, ReportStatus::Dismissed);
    assert!(!closed.content_removed);
    assert!(
        repo.resolve_report(report.id, ReportStatus::Resolved, admin_id, None, true)
            .await
            .unwrap()
            .is_none()
    );
    // A closed report never removes content.
    assert!(repo.get_comment(comment.id).await.unwrap().is_some());

    let second = repo
        .create_report(NewReport {
            reporter_id: reporter,
            target_type: ReportTarget::Comment,
            target_id: comment.id,
            reason: "still bad".to_string(),
        })
        .await
        .unwrap();
    let closed = repo
        .resolve_report(
            second.id,
            ReportStatus::Resolved,
            admin_id,
            Some("removed".to_string()),
            true,
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(closed.report.status, ReportStatus::Resolved);
    assert!(closed.content_removed);
    assert!(repo.get_comment(comment.id).await.unwrap().is_none());
    assert_eq!(repo.get_post(post.id).await.unwrap().unwrap().comment_count, 0);
}
