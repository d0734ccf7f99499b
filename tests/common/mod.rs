#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use lawdesk::config::{AssistantMode, Config};
use lawdesk::db::Storage;
use lawdesk::{LawdeskState, lawdesk_router};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const LAWYER_EMAIL: &str = "lawyer@example.com";
pub const LAWYER_PASSWORD: &str = "lawyer123";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";

pub struct TestApp {
    pub router: Router,
    pub storage: Storage,
}

/// Router over a fresh in-memory database with the demo accounts seeded.
pub async fn spawn_app(configure: impl FnOnce(&mut Config)) -> TestApp {
    spawn_app_at("sqlite::memory:", configure).await
}

/// Same as [`spawn_app`] over the database at `database_url`.
pub async fn spawn_app_at(database_url: &str, configure: impl FnOnce(&mut Config)) -> TestApp {
    let storage = Storage::connect(database_url)
        .await
        .expect("test database");
    storage.seed_demo_users().await.expect("seed demo users");

    let mut cfg = Config::default();
    cfg.basic.jwt_secret = "integration-test-secret".to_string();
    cfg.assistant.mode = AssistantMode::Predefined;
    configure(&mut cfg);

    let state = LawdeskState::new(storage.clone(), &cfg).expect("state");
    TestApp {
        router: lawdesk_router(state),
        storage,
    }
}

impl TestApp {
    pub async fn call(
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
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let resp = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }

    pub async fn lawyer_token(&self) -> String {
        self.login(LAWYER_EMAIL, LAWYER_PASSWORD).await
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Register a second lawyer and return their token and id.
    pub async fn register_lawyer(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "email": email, "password": "secret123", "full_name": "محامٍ آخر" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        (
            body["token"].as_str().expect("token").to_string(),
            body["user"]["id"].as_str().expect("id").to_string(),
        )
    }

    pub async fn create_client(&self, token: &str, name: &str) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/clients",
                Some(token),
                Some(json!({ "name": name, "type": "individual", "phone": "01000000000" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create client failed: {body}");
        body
    }
}

/// `sqlite:` URL for a database file unique to this test run.
pub fn temp_database_url(label: &str) -> (String, std::path::PathBuf) {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("lawdesk-{label}-{}-{nanos}.sqlite", std::process::id()));
    (format!("sqlite:{}", path.display()), path)
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

/// Percent-encode a query value.
pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
