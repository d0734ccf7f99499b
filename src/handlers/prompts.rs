use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::db::Storage;
use crate::db::models::Prompt;
use crate::db::params::{NewPrompt, PromptPatch};
use crate::error::LawdeskError;
use crate::middleware::{AdminUser, ApiJson};

pub async fn list(
    State(storage): State<Storage>,
    _admin: AdminUser,
) -> Result<Json<Vec<Prompt>>, LawdeskError> {
    Ok(Json(storage.list_prompts().await?))
}

pub async fn get(
    State(storage): State<Storage>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Prompt>, LawdeskError> {
    Ok(Json(storage.get_prompt(&id).await?))
}

pub async fn create(
    State(storage): State<Storage>,
    _admin: AdminUser,
    ApiJson(new): ApiJson<NewPrompt>,
) -> Result<(StatusCode, Json<Prompt>), LawdeskError> {
    Ok((StatusCode::CREATED, Json(storage.create_prompt(new).await?)))
}

pub async fn update(
    State(storage): State<Storage>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<PromptPatch>,
) -> Result<Json<Prompt>, LawdeskError> {
    Ok(Json(storage.update_prompt(&id, patch).await?))
}

pub async fn set_default(
    State(storage): State<Storage>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Prompt>, LawdeskError> {
    Ok(Json(storage.set_default_prompt(&id).await?))
}

pub async fn delete(
    State(storage): State<Storage>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, LawdeskError> {
    storage.delete_prompt(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
