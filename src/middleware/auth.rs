use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tracing::debug;

use crate::auth::TokenKeys;
use crate::db::Storage;
use crate::db::models::{Role, Tenant};
use crate::error::LawdeskError;

/// The authenticated caller, resolved from `Authorization: Bearer <jwt>`.
///
/// A missing header is rejected with 401; a bad, expired, or orphaned token
/// (profile deleted since issue) with 403.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn tenant(&self) -> Tenant<'_> {
        match self.role {
            Role::Admin => Tenant::All,
            Role::Lawyer => Tenant::Lawyer(&self.id),
        }
    }

    /// Owner of a record this caller is creating.
    ///
    /// Lawyers always own what they create and may not name anyone else;
    /// admins must name the lawyer explicitly.
    pub fn owner_for(&self, requested: Option<&str>) -> Result<String, LawdeskError> {
        match (self.role, requested) {
            (Role::Lawyer, Some(other)) if other != self.id => Err(LawdeskError::Forbidden),
            (Role::Lawyer, _) => Ok(self.id.clone()),
            (Role::Admin, Some(lawyer_id)) if !lawyer_id.trim().is_empty() => {
                Ok(lawyer_id.to_string())
            }
            (Role::Admin, _) => Err(LawdeskError::validation("يجب تحديد المحامي المسؤول")),
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
    Storage: FromRef<S>,
{
    type Rejection = LawdeskError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        LawdeskError::MissingToken
                    } else {
                        LawdeskError::InvalidToken("malformed authorization header".to_string())
                    }
                })?;

        let claims = TokenKeys::from_ref(state).verify(bearer.token())?;

        let Some(profile) = Storage::from_ref(state).find_profile(&claims.sub).await? else {
            debug!(sub = %claims.sub, "token refers to a deleted profile");
            return Err(LawdeskError::InvalidToken("profile not found".to_string()));
        };

        Ok(AuthUser {
            id: profile.id,
            email: profile.email,
            role: profile.role,
        })
    }
}

/// [`AuthUser`] that must hold the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
    Storage: FromRef<S>,
{
    type Rejection = LawdeskError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(LawdeskError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
