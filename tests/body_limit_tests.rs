use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

#[tokio::test]
async fn clients_route_returns_413_for_oversized_body() {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "lawdesk-body-limit-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let database_url = format!("sqlite:{}", temp_path.display());
    let storage = lawdesk::db::Storage::connect(&database_url)
        .await
        .expect("file database");
    storage.seed_demo_users().await.expect("seed demo users");

    let mut cfg = lawdesk::config::Config::default();
    cfg.basic.jwt_secret = "body-limit-secret".to_string();
    cfg.basic.body_limit_bytes = 4 * 1024;
    let state = lawdesk::LawdeskState::new(storage, &cfg).expect("state");
    let app = lawdesk::lawdesk_router(state);

    let login = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"email":"lawyer@example.com","password":"lawyer123"}"#,
                ))
                .expect("failed to build login request"),
        )
        .await
        .expect("login request failed");
    assert_eq!(login.status(), StatusCode::OK);
    let body = to_bytes(login.into_body(), usize::MAX)
        .await
        .expect("failed to read login body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("login body is json");
    let token = json["token"].as_str().expect("token").to_string();

    let oversized_notes = "ن".repeat(8 * 1024);
    let oversized_payload = format!(r#"{{"name":"عميل","notes":"{oversized_notes}"}}"#);

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/clients")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(oversized_payload))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("error body is json");
    assert_eq!(json["error"]["code"], "PAYLOAD_TOO_LARGE");

    let _ = std::fs::remove_file(&temp_path);
}
