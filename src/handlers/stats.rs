use axum::{Json, extract::State};

use crate::db::Storage;
use crate::db::analytics::DashboardStats;
use crate::error::LawdeskError;
use crate::middleware::AuthUser;

/// Dashboard figures for the caller; admins see every practice combined.
pub async fn dashboard(
    State(storage): State<Storage>,
    user: AuthUser,
) -> Result<Json<DashboardStats>, LawdeskError> {
    Ok(Json(storage.dashboard_stats(user.tenant()).await?))
}
