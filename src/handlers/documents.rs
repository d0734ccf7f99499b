use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::db::Storage;
use crate::db::models::Document;
use crate::db::params::{DocumentFilter, DocumentPatch, NewDocument};
use crate::error::LawdeskError;
use crate::middleware::{ApiJson, ApiQuery, AuthUser};

pub async fn list(
    State(storage): State<Storage>,
    user: AuthUser,
    ApiQuery(filter): ApiQuery<DocumentFilter>,
) -> Result<Json<Vec<Document>>, LawdeskError> {
    Ok(Json(storage.list_documents(user.tenant(), &filter).await?))
}

pub async fn get(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Document>, LawdeskError> {
    Ok(Json(storage.get_document(user.tenant(), &id).await?))
}

pub async fn create(
    State(storage): State<Storage>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewDocument>,
) -> Result<(StatusCode, Json<Document>), LawdeskError> {
    let owner = user.owner_for(new.lawyer_id.as_deref())?;
    let document = storage.create_document(owner, new).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn update(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<DocumentPatch>,
) -> Result<Json<Document>, LawdeskError> {
    Ok(Json(storage.update_document(user.tenant(), &id, patch).await?))
}

pub async fn delete(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, LawdeskError> {
    storage.delete_document(user.tenant(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
