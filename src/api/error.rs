use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use crate::domain::aggregates::{ProductError, SessionError};
use crate::domain::value_objects::MoneyError;
use crate::StorefrontError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    NotFound(String),
    Internal(StorefrontError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = |message: &str| Json(serde_json::json!({ "error": message }));
        match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, body(&message)).into_response(),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, body("Unauthorized")).into_response(),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
                body(&message),
            )
                .into_response(),
            Self::Internal(error) => {
                tracing::error!(%error, "error serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, body("Internal error")).into_response()
            }
        }
    }
}

pub trait OptionExt<T> {
    fn ok_or_not_found<F: FnOnce() -> S, S: Into<String>>(self, f: F) -> ApiResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found<F: FnOnce() -> S, S: Into<String>>(self, f: F) -> ApiResult<T> {
        self.ok_or_else(|| ApiError::NotFound(f().into() + " not found"))
    }
}

impl From<StorefrontError> for ApiError {
    fn from(error: StorefrontError) -> Self { Self::Internal(error) }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(%rejection, "rejected request body");
        Self::BadRequest("Invalid JSON".into())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self { Self::BadRequest(errors.to_string()) }
}

impl From<ProductError> for ApiError {
    fn from(error: ProductError) -> Self { Self::BadRequest(error.to_string()) }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self { Self::BadRequest(error.to_string()) }
}

impl From<MoneyError> for ApiError {
    fn from(error: MoneyError) -> Self { Self::BadRequest(error.to_string()) }
}
