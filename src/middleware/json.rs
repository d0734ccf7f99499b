//! Body and query extractors whose rejections use the API error envelope.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::{StatusCode, request::Parts};
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::LawdeskError;

/// `Json<T>` that rejects with [`LawdeskError`].
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = LawdeskError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> LawdeskError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return LawdeskError::PayloadTooLarge;
    }
    debug!(reason = %rejection.body_text(), "rejected json body");
    LawdeskError::validation(format!("صيغة البيانات غير صالحة: {}", rejection.body_text()))
}

/// `Query<T>` that rejects with [`LawdeskError`].
#[derive(Debug, Clone, Default)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = LawdeskError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection: QueryRejection| {
                LawdeskError::validation(format!("معاملات البحث غير صالحة: {}", rejection.body_text()))
            })
    }
}
