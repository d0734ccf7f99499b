use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::db::Storage;
use crate::db::models::Client;
use crate::db::params::{ClientFilter, ClientPatch, NewClient};
use crate::error::LawdeskError;
use crate::middleware::{ApiJson, ApiQuery, AuthUser};

pub async fn list(
    State(storage): State<Storage>,
    user: AuthUser,
    ApiQuery(filter): ApiQuery<ClientFilter>,
) -> Result<Json<Vec<Client>>, LawdeskError> {
    Ok(Json(storage.list_clients(user.tenant(), &filter).await?))
}

pub async fn get(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Client>, LawdeskError> {
    Ok(Json(storage.get_client(user.tenant(), &id).await?))
}

pub async fn create(
    State(storage): State<Storage>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewClient>,
) -> Result<(StatusCode, Json<Client>), LawdeskError> {
    let owner = user.owner_for(new.lawyer_id.as_deref())?;
    let client = storage.create_client(owner, new).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ClientPatch>,
) -> Result<Json<Client>, LawdeskError> {
    Ok(Json(storage.update_client(user.tenant(), &id, patch).await?))
}

pub async fn delete(
    State(storage): State<Storage>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, LawdeskError> {
    storage.delete_client(user.tenant(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
