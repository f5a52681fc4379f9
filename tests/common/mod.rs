#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use community_platform::{
    AppConfig, AppState, MemoryRepository, MockIntegrationProbe, MockStorageService,
    create_router,
    integrations::ProbeState,
    repository::RepositoryState,
    storage::StorageState,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct-horse-battery";

/// An authenticated actor as seen by a client.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub access: String,
    pub refresh: String,
}

/// TestApp
///
/// The full router over an in-memory repository and mock outbound services.
/// Requests go through `oneshot`, so no port is bound.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryRepository>,
    pub probe: Arc<MockIntegrationProbe>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(
            MockStorageService::new(),
            MockIntegrationProbe::new(200),
            AppConfig::default(),
        )
    }

    pub fn with(
        storage: MockStorageService,
        probe: MockIntegrationProbe,
        config: AppConfig,
    ) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let probe = Arc::new(probe);
        let state = AppState {
            repo: repo.clone() as RepositoryState,
            storage: Arc::new(storage) as StorageState,
            probe: probe.clone() as ProbeState,
            config: config.clone(),
        };
        Self {
            router: create_router(state),
            repo,
            probe,
            config,
        }
    }

    /// Sends one request and returns the status with the decoded body. Empty bodies
    /// decode to `Null` and non-JSON bodies to a JSON string.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    // --- Actors ---

    pub async fn join_guest(&self) -> Actor {
        let (status, body) = self.post("/auth/guest/join", None, json!({})).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        actor(&body["guest"], &body["token"])
    }

    pub async fn join_member(&self, username: &str) -> Actor {
        let (status, body) = self
            .post(
                "/auth/member/join",
                None,
                json!({
                    "email": format!("{username}@example.com"),
                    "username": username,
                    "password": PASSWORD,
                    "display_name": username,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        actor(&body["member"], &body["token"])
    }

    /// Joins an admin. The first admin bootstraps without a key.
    pub async fn join_admin(&self, email: &str, join_key: Option<&str>) -> Actor {
        let (status, body) = self
            .post(
                "/auth/admin/join",
                None,
                json!({
                    "email": email,
                    "password": PASSWORD,
                    "display_name": "Moderator",
                    "join_key": join_key,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        actor(&body["admin"], &body["token"])
    }

    // --- Content ---

    pub async fn create_community(&self, owner: &Actor, name: &str) -> Value {
        let (status, body) = self
            .post(
                "/communities",
                Some(&owner.access),
                json!({ "name": name, "title": format!("The {name} community") }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn join_community(&self, member: &Actor, community_id: &str) {
        let (status, body) = self
            .post(
                &format!("/communities/{community_id}/memberships"),
                Some(&member.access),
                json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    pub async fn create_post(&self, author: &Actor, community_id: &str, title: &str) -> Value {
        let (status, body) = self
            .post(
                &format!("/communities/{community_id}/posts"),
                Some(&author.access),
                json!({ "title": title, "body": "Some body text" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn create_comment(&self, author: &Actor, post_id: &str, body: &str) -> Value {
        let (status, created) = self
            .post(
                &format!("/posts/{post_id}/comments"),
                Some(&author.access),
                json!({ "body": body }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        created
    }
}

fn actor(profile: &Value, token: &Value) -> Actor {
    Actor {
        id: id_of(profile),
        access: token["access_token"].as_str().unwrap().to_string(),
        refresh: token["refresh_token"].as_str().unwrap().to_string(),
    }
}

pub fn id_of(value: &Value) -> Uuid {
    value["id"].as_str().unwrap().parse().unwrap()
}

pub fn str_id(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}
