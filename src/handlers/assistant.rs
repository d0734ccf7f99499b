use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::models::{ChatMessage, Feedback};
use crate::error::LawdeskError;
use crate::middleware::{ApiJson, AuthUser};
use crate::service::{AssistantReply, AssistantService};

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    #[serde(alias = "content")]
    pub message: String,
}

pub async fn history(
    State(assistant): State<Arc<AssistantService>>,
    user: AuthUser,
) -> Result<Json<Vec<ChatMessage>>, LawdeskError> {
    Ok(Json(assistant.history(&user.id).await?))
}

pub async fn send(
    State(assistant): State<Arc<AssistantService>>,
    user: AuthUser,
    ApiJson(req): ApiJson<AssistantRequest>,
) -> Result<Json<AssistantReply>, LawdeskError> {
    Ok(Json(assistant.send(&user.id, &req.message).await?))
}

pub async fn clear(
    State(assistant): State<Arc<AssistantService>>,
    user: AuthUser,
) -> Result<StatusCode, LawdeskError> {
    assistant.clear(&user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn feedback(
    State(assistant): State<Arc<AssistantService>>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(feedback): ApiJson<Feedback>,
) -> Result<Json<ChatMessage>, LawdeskError> {
    Ok(Json(assistant.feedback(&user.id, &id, feedback).await?))
}
