use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;
use super::error::{ApiError, ApiResult};
use super::{ApiJson, AppState};
use crate::auth;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(max = 256))]
    pub password: String,
}

pub async fn login(State(s): State<AppState>, ApiJson(request): ApiJson<LoginRequest>) -> ApiResult<impl IntoResponse> {
    request.validate()?;
    let submitted = request.password.trim();
    let Some(password) = s.config.admin_password.as_deref() else {
        tracing::warn!("admin login attempted but ADMIN_PASSWORD is not configured");
        return Err(ApiError::Unauthorized);
    };
    if submitted.is_empty() || submitted != password {
        tracing::warn!("rejected admin login");
        return Err(ApiError::Unauthorized);
    }
    let cookie = auth::session_cookie(&auth::issue_token(password, Utc::now()), s.config.secure_cookies);
    tracing::info!("admin logged in");
    Ok(([(header::SET_COOKIE, cookie)], Json(serde_json::json!({ "ok": true }))))
}

pub async fn logout(State(s): State<AppState>) -> impl IntoResponse {
    ([(header::SET_COOKIE, auth::clear_cookie(s.config.secure_cookies))], Json(serde_json::json!({ "ok": true })))
}

pub async fn session(State(s): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "authenticated": auth::is_admin(&s, &headers) }))
}
