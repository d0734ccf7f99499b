use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::TokenKeys;
use crate::auth::password::verify_password;
use crate::db::Storage;
use crate::db::models::{Profile, Role};
use crate::db::params::NewProfile;
use crate::error::LawdeskError;
use crate::middleware::{ApiJson, AuthUser};
use crate::router::LawdeskState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: Profile,
}

/// Public sign-up; always creates a lawyer account.
pub async fn register(
    State(state): State<LawdeskState>,
    ApiJson(new): ApiJson<NewProfile>,
) -> Result<(StatusCode, Json<AuthResponse>), LawdeskError> {
    if !state.basic.allow_registration {
        return Err(LawdeskError::Forbidden);
    }
    let user = state.storage.create_profile(new, Role::Lawyer).await?;
    let token = state.keys.issue(&user)?;
    info!(user_id = %user.id, "lawyer registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(storage): State<Storage>,
    State(keys): State<TokenKeys>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, LawdeskError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(LawdeskError::validation(
            "البريد الإلكتروني وكلمة المرور مطلوبان",
        ));
    }

    let Some(user) = storage.find_profile_by_email(email).await? else {
        warn!(email, "login for unknown email");
        return Err(LawdeskError::InvalidCredentials);
    };
    if !verify_password(&req.password, &user.password_hash) {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(LawdeskError::InvalidCredentials);
    }

    let token = keys.issue(&user)?;
    info!(user_id = %user.id, role = user.role.as_str(), "login");
    Ok(Json(AuthResponse { token, user }))
}

pub async fn me(
    State(storage): State<Storage>,
    user: AuthUser,
) -> Result<Json<Profile>, LawdeskError> {
    storage
        .find_profile(&user.id)
        .await?
        .map(Json)
        .ok_or_else(|| LawdeskError::InvalidToken("profile not found".to_string()))
}
