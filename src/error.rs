use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Error as SqlxError;
use std::collections::HashMap;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum LawdeskError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Assistant rate limit exceeded")]
    RateLimited,

    #[error("Assistant request timed out")]
    AssistantTimeout,

    #[error("Assistant unavailable: {0}")]
    AssistantUnavailable(String),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode, Option<UpstreamError>),
}

impl LawdeskError {
    /// Transient failures worth another attempt against the LLM vendor.
    pub fn is_retryable(&self) -> bool {
        match self {
            LawdeskError::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LawdeskError::UpstreamStatus(status, _) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        LawdeskError::Validation(msg.into())
    }
}

impl IntoResponse for LawdeskError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            LawdeskError::Validation(reason) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("VALIDATION", reason),
            ),
            LawdeskError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ApiErrorBody::new("PAYLOAD_TOO_LARGE", "حجم البيانات المرسلة كبير جداً"),
            ),
            LawdeskError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("UNAUTHORIZED", "يجب تسجيل الدخول أولاً"),
            ),
            LawdeskError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("INVALID_CREDENTIALS", "بيانات الدخول غير صحيحة"),
            ),
            LawdeskError::InvalidToken(_) => (
                StatusCode::FORBIDDEN,
                ApiErrorBody::new("INVALID_TOKEN", "انتهت صلاحية الجلسة، يرجى تسجيل الدخول مجدداً"),
            ),
            LawdeskError::Forbidden => (
                StatusCode::FORBIDDEN,
                ApiErrorBody::new("FORBIDDEN", "ليس لديك صلاحية للقيام بهذا الإجراء"),
            ),
            LawdeskError::NotFound(_) | LawdeskError::DatabaseError(SqlxError::RowNotFound) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody::new("NOT_FOUND", "العنصر المطلوب غير موجود"),
            ),
            LawdeskError::EmailTaken => (
                StatusCode::CONFLICT,
                ApiErrorBody::new("CONFLICT", "البريد الإلكتروني مستخدم بالفعل"),
            ),
            LawdeskError::DatabaseError(SqlxError::Database(db_err))
                if db_err.is_unique_violation() =>
            {
                (
                    StatusCode::CONFLICT,
                    ApiErrorBody::new("CONFLICT", "السجل موجود بالفعل"),
                )
            }
            LawdeskError::DatabaseError(SqlxError::Database(db_err))
                if db_err.is_foreign_key_violation() || db_err.is_check_violation() =>
            {
                (
                    StatusCode::BAD_REQUEST,
                    ApiErrorBody::new("CONSTRAINT", "البيانات المدخلة غير صالحة"),
                )
            }
            LawdeskError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiErrorBody::new("RATE_LIMIT", "تم تجاوز الحد المسموح من الطلبات، حاول لاحقاً"),
            ),
            LawdeskError::AssistantTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                ApiErrorBody::new("TIMEOUT", "انتهت مهلة الطلب"),
            ),
            LawdeskError::AssistantUnavailable(reason) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiErrorBody::new("ASSISTANT_UNAVAILABLE", reason),
            ),
            LawdeskError::Reqwest(_) | LawdeskError::UrlParse(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody::new("BAD_GATEWAY", "حدث خطأ أثناء الاتصال بالخدمة"),
            ),
            LawdeskError::UpstreamStatus(code, _) => {
                let (status, err_code, msg) = match code {
                    StatusCode::TOO_MANY_REQUESTS => (
                        code,
                        "RATE_LIMIT",
                        "تم تجاوز الحد المسموح لخدمة الذكاء الاصطناعي",
                    ),
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => (
                        code,
                        "UPSTREAM_AUTH",
                        "فشل التحقق من مفتاح خدمة الذكاء الاصطناعي",
                    ),
                    StatusCode::NOT_FOUND => (
                        code,
                        "UPSTREAM_NOT_FOUND",
                        "النموذج المطلوب غير متاح",
                    ),
                    _ => (
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_ERROR",
                        "حدث خطأ أثناء الاتصال بخدمة الذكاء الاصطناعي",
                    ),
                };
                (status, ApiErrorBody::new(err_code, msg))
            }
            other @ (LawdeskError::DatabaseError(_)
            | LawdeskError::Json(_)
            | LawdeskError::Config(_)
            | LawdeskError::PasswordHash(_)) => {
                error!(error = %other, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody::new("INTERNAL_ERROR", "حدث خطأ في الخادم"),
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiErrorBody {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Error payload returned by the LLM vendors.
///
/// GLM answers `{"error": {"code": "...", "message": "..."}}`, Gemini answers
/// `{"error": {"code": 400, "message": "...", "status": "..."}}`.
#[derive(Deserialize, Debug)]
pub struct UpstreamErrorEnvelope {
    pub error: UpstreamError,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpstreamError {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl UpstreamError {
    pub fn from_body(body: &[u8]) -> Option<Self> {
        serde_json::from_slice::<UpstreamErrorEnvelope>(body)
            .ok()
            .map(|env| env.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_client_errors_keep_their_status() {
        for (upstream, expected) in [
            (StatusCode::UNAUTHORIZED, StatusCode::UNAUTHORIZED),
            (StatusCode::FORBIDDEN, StatusCode::FORBIDDEN),
            (StatusCode::NOT_FOUND, StatusCode::NOT_FOUND),
            (StatusCode::TOO_MANY_REQUESTS, StatusCode::TOO_MANY_REQUESTS),
            (StatusCode::BAD_REQUEST, StatusCode::BAD_GATEWAY),
            (StatusCode::INTERNAL_SERVER_ERROR, StatusCode::BAD_GATEWAY),
        ] {
            let resp = LawdeskError::UpstreamStatus(upstream, None).into_response();
            assert_eq!(resp.status(), expected, "upstream {upstream}");
        }
    }

    #[test]
    fn only_transient_upstream_statuses_are_retried() {
        assert!(LawdeskError::UpstreamStatus(StatusCode::SERVICE_UNAVAILABLE, None).is_retryable());
        assert!(LawdeskError::UpstreamStatus(StatusCode::TOO_MANY_REQUESTS, None).is_retryable());
        assert!(!LawdeskError::UpstreamStatus(StatusCode::UNAUTHORIZED, None).is_retryable());
        assert!(!LawdeskError::UpstreamStatus(StatusCode::NOT_FOUND, None).is_retryable());
    }
}
