use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::db::Storage;
use crate::db::models::PredefinedResponse;
use crate::db::params::{NewPredefinedResponse, PredefinedResponsePatch};
use crate::error::LawdeskError;
use crate::middleware::{AdminUser, ApiJson};

pub async fn list(
    State(storage): State<Storage>,
    _admin: AdminUser,
) -> Result<Json<Vec<PredefinedResponse>>, LawdeskError> {
    Ok(Json(storage.list_predefined_responses().await?))
}

pub async fn get(
    State(storage): State<Storage>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<PredefinedResponse>, LawdeskError> {
    Ok(Json(storage.get_predefined_response(&id).await?))
}

pub async fn create(
    State(storage): State<Storage>,
    _admin: AdminUser,
    ApiJson(new): ApiJson<NewPredefinedResponse>,
) -> Result<(StatusCode, Json<PredefinedResponse>), LawdeskError> {
    let response = storage.create_predefined_response(new).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update(
    State(storage): State<Storage>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<PredefinedResponsePatch>,
) -> Result<Json<PredefinedResponse>, LawdeskError> {
    Ok(Json(storage.update_predefined_response(&id, patch).await?))
}

pub async fn delete(
    State(storage): State<Storage>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, LawdeskError> {
    storage.delete_predefined_response(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
