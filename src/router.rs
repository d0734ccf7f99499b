use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef},
    http::{Method, header},
    routing::{get, post, put},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::TokenKeys;
use crate::config::{BasicConfig, Config};
use crate::db::Storage;
use crate::error::LawdeskError;
use crate::handlers::{
    admin, appointments, assistant, auth, cases, clients, documents, invoices, predefined, prompts,
    stats,
};
use crate::service::AssistantService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct LawdeskState {
    pub storage: Storage,
    pub keys: TokenKeys,
    pub assistant: Arc<AssistantService>,
    pub basic: Arc<BasicConfig>,
}

impl LawdeskState {
    pub fn new(storage: Storage, cfg: &Config) -> Result<Self, LawdeskError> {
        if cfg.basic.jwt_secret.trim().is_empty() {
            return Err(LawdeskError::Config(
                "basic.jwt_secret must be set".to_string(),
            ));
        }
        let keys = TokenKeys::new(&cfg.basic.jwt_secret, cfg.basic.token_ttl_hours);
        let assistant = AssistantService::new(storage.clone(), cfg.assistant.clone())?;
        Ok(Self {
            storage,
            keys,
            assistant: Arc::new(assistant),
            basic: Arc::new(cfg.basic.clone()),
        })
    }
}

impl FromRef<LawdeskState> for Storage {
    fn from_ref(state: &LawdeskState) -> Self {
        state.storage.clone()
    }
}

impl FromRef<LawdeskState> for TokenKeys {
    fn from_ref(state: &LawdeskState) -> Self {
        state.keys.clone()
    }
}

impl FromRef<LawdeskState> for Arc<AssistantService> {
    fn from_ref(state: &LawdeskState) -> Self {
        state.assistant.clone()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn lawdesk_router(state: LawdeskState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .route("/clients", get(clients::list).post(clients::create))
        .route(
            "/clients/{id}",
            get(clients::get).put(clients::update).delete(clients::delete),
        )
        .route("/cases", get(cases::list).post(cases::create))
        .route(
            "/cases/{id}",
            get(cases::get).put(cases::update).delete(cases::delete),
        )
        .route(
            "/cases/{id}/chat",
            get(cases::list_chat).post(cases::post_chat),
        )
        .route(
            "/appointments",
            get(appointments::list).post(appointments::create),
        )
        .route(
            "/appointments/{id}",
            get(appointments::get)
                .put(appointments::update)
                .delete(appointments::delete),
        )
        .route("/documents", get(documents::list).post(documents::create))
        .route(
            "/documents/{id}",
            get(documents::get)
                .put(documents::update)
                .delete(documents::delete),
        )
        .route("/invoices", get(invoices::list).post(invoices::create))
        .route(
            "/invoices/{id}",
            get(invoices::get)
                .put(invoices::update)
                .delete(invoices::delete),
        )
        .route(
            "/assistant/messages",
            get(assistant::history)
                .post(assistant::send)
                .delete(assistant::clear),
        )
        .route(
            "/assistant/messages/{id}/feedback",
            post(assistant::feedback),
        )
        .route("/stats", get(stats::dashboard))
        .route("/prompts", get(prompts::list).post(prompts::create))
        .route(
            "/prompts/{id}",
            get(prompts::get).put(prompts::update).delete(prompts::delete),
        )
        .route(
            "/prompts/{id}/default",
            put(prompts::set_default).post(prompts::set_default),
        )
        .route(
            "/predefined-responses",
            get(predefined::list).post(predefined::create),
        )
        .route(
            "/predefined-responses/{id}",
            get(predefined::get)
                .put(predefined::update)
                .delete(predefined::delete),
        )
        .route(
            "/admin/lawyers",
            get(admin::list_lawyers).post(admin::create_lawyer),
        )
        .route("/admin/lawyers/{id}", axum::routing::delete(admin::delete_lawyer))
        .route("/admin/stats", get(admin::stats))
        .route(
            "/admin/assistant-settings",
            get(admin::assistant_settings).put(admin::update_assistant_settings),
        );

    let body_limit = state.basic.body_limit_bytes;
    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
