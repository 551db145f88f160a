//! Common test utilities for HTTP integration tests
//!
//! Each `TestContext` owns a fresh `MemoryStore` and the real router built
//! over it, so tests need neither a database nor a listening socket.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use teamboard_api::app::{build_router, AppState};
use teamboard_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use teamboard_shared::auth::jwt::{create_token, Claims, TokenType};
use teamboard_shared::models::{CreateUser, User};
use teamboard_shared::store::memory::MemoryStore;
use teamboard_shared::store::Store;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
    pub config: Config,
}

/// A signed-in test user
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
                run_migrations: false,
            },
            jwt: JwtConfig {
                secret: JWT_SECRET.to_string(),
            },
        };

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config.clone());
        let app = build_router(state);

        Self { store, app, config }
    }

    /// Inserts `<handle>@example.com` directly and issues an access token
    pub async fn user(&self, handle: &str) -> TestUser {
        let user = self
            .store
            .create_user(CreateUser {
                email: format!("{}@example.com", handle),
                name: Some(handle.to_string()),
                password_hash: "$argon2id$placeholder".to_string(),
            })
            .await
            .expect("Failed to create user");

        let claims = Claims::new(user.id, TokenType::Access);
        let token = create_token(&claims, JWT_SECRET).expect("Failed to sign token");

        TestUser { user, token }
    }

    /// Sends a request and returns the status with the parsed JSON body
    /// (`Value::Null` when the body is empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("Non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.send("GET", uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(&user.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(&user.token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send("PATCH", uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.send("DELETE", uri, Some(&user.token), None).await
    }

    /// Creates a team through the API and returns its id
    pub async fn team(&self, admin: &TestUser, name: &str) -> String {
        let (status, body) = self
            .post("/api/teams", admin, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Invites and accepts; returns the membership id
    pub async fn join(&self, admin: &TestUser, team_id: &str, member: &TestUser, role: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/teams/{}/invite", team_id),
                admin,
                serde_json::json!({ "email": member.user.email, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let invitation_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = self
            .post(
                &format!("/api/invitations/{}", invitation_id),
                member,
                serde_json::json!({ "action": "accept" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["teamMember"]["id"].as_str().unwrap().to_string()
    }

    /// Creates a board through the API and returns its id
    pub async fn board(&self, admin: &TestUser, team_id: &str, name: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/teams/{}/boards", team_id),
                admin,
                serde_json::json!({ "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
