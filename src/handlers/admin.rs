use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use crate::db::Storage;
use crate::db::analytics::AdminStats;
use crate::db::models::{Profile, Role};
use crate::db::params::{AssistantSettingsPatch, NewProfile};
use crate::db::settings::AssistantSettings;
use crate::error::LawdeskError;
use crate::middleware::{AdminUser, ApiJson};
use crate::service::AssistantService;

pub async fn list_lawyers(
    State(storage): State<Storage>,
    _admin: AdminUser,
) -> Result<Json<Vec<Profile>>, LawdeskError> {
    Ok(Json(storage.list_profiles(Role::Lawyer).await?))
}

pub async fn create_lawyer(
    State(storage): State<Storage>,
    AdminUser(admin): AdminUser,
    ApiJson(new): ApiJson<NewProfile>,
) -> Result<(StatusCode, Json<Profile>), LawdeskError> {
    let lawyer = storage.create_profile(new, Role::Lawyer).await?;
    info!(admin_id = %admin.id, lawyer_id = %lawyer.id, "lawyer account created");
    Ok((StatusCode::CREATED, Json(lawyer)))
}

pub async fn delete_lawyer(
    State(storage): State<Storage>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, LawdeskError> {
    if id == admin.id {
        return Err(LawdeskError::Forbidden);
    }
    storage.delete_lawyer(&id).await?;
    info!(admin_id = %admin.id, lawyer_id = %id, "lawyer account deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stats(
    State(storage): State<Storage>,
    _admin: AdminUser,
) -> Result<Json<AdminStats>, LawdeskError> {
    Ok(Json(storage.admin_stats().await?))
}

pub async fn assistant_settings(
    State(assistant): State<Arc<AssistantService>>,
    _admin: AdminUser,
) -> Json<AssistantSettings> {
    Json(assistant.settings())
}

pub async fn update_assistant_settings(
    State(assistant): State<Arc<AssistantService>>,
    AdminUser(admin): AdminUser,
    ApiJson(patch): ApiJson<AssistantSettingsPatch>,
) -> Result<Json<AssistantSettings>, LawdeskError> {
    let settings = assistant.update_settings(patch).await?;
    info!(admin_id = %admin.id, "assistant settings changed");
    Ok(Json(settings))
}
