use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::db::Storage;
use crate::db::models::{Case, ChatMessage};
use crate::db::params::{CaseFilter, CasePatch, NewCase, NewCaseMessage};
use crate::error::LawdeskError;
use crate::middleware::{ApiJson, ApiQuery, AuthUser};

pub async fn list(
    State(storage): State<Storage>,
    user: AuthUser,
    ApiQuery(filter): ApiQuery<CaseFilter>,
) -> Result<Json<Vec<Case>>, LawdeskError> {
    Ok(Json(storage.list_cases(user.tenant(), &filter).await?))
}

pub async fn get(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Case>, LawdeskError> {
    Ok(Json(storage.get_case(user.tenant(), &id).await?))
}

pub async fn create(
    State(storage): State<Storage>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewCase>,
) -> Result<(StatusCode, Json<Case>), LawdeskError> {
    let owner = user.owner_for(new.lawyer_id.as_deref())?;
    let case = storage.create_case(owner, new).await?;
    Ok((StatusCode::CREATED, Json(case)))
}

pub async fn update(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<CasePatch>,
) -> Result<Json<Case>, LawdeskError> {
    Ok(Json(storage.update_case(user.tenant(), &id, patch).await?))
}

pub async fn delete(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, LawdeskError> {
    storage.delete_case(user.tenant(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_chat(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, LawdeskError> {
    Ok(Json(storage.list_case_chat(user.tenant(), &id).await?))
}

pub async fn post_chat(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(new): ApiJson<NewCaseMessage>,
) -> Result<(StatusCode, Json<ChatMessage>), LawdeskError> {
    let message = storage
        .post_case_chat(user.tenant(), &user.id, &id, new)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
