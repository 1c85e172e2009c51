//! Admin authentication.
//!
//! Logging in with the admin password yields an `admin_auth` cookie holding
//! `{expiry}.{signature}`, where the signature is HMAC-SHA256 over the expiry
//! (unix seconds) keyed by the admin password. Changing the password
//! invalidates every issued cookie.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use crate::api::{ApiError, AppState};

type HmacSha256 = Hmac<Sha256>;

pub const COOKIE_NAME: &str = "admin_auth";
pub const SESSION_TTL_HOURS: i64 = 24;

fn mac(password: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(password.as_bytes()).expect("HMAC can take key of any size")
}

pub fn issue_token(password: &str, now: DateTime<Utc>) -> String {
    let expires = (now + Duration::hours(SESSION_TTL_HOURS)).timestamp();
    let mut mac = mac(password);
    mac.update(expires.to_string().as_bytes());
    format!("{expires}.{}", hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_token(password: &str, token: &str, now: DateTime<Utc>) -> bool {
    let Some((expires, signature)) = token.split_once('.') else { return false };
    let Ok(expiry) = expires.parse::<i64>() else { return false };
    if expiry < now.timestamp() { return false; }
    let Ok(signature) = hex::decode(signature) else { return false };
    let mut mac = mac(password);
    mac.update(expires.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

/// Value of the named cookie in the request's `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn session_cookie(token: &str, secure: bool) -> String {
    let max_age = SESSION_TTL_HOURS * 60 * 60;
    let secure = if secure { "; Secure" } else { "" };
    format!("{COOKIE_NAME}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}{secure}")
}

pub fn clear_cookie(secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{COOKIE_NAME}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{secure}")
}

/// Whether the request carries a valid admin cookie.
pub fn is_admin(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(password) = state.config.admin_password.as_deref() else { return false };
    cookie_value(headers, COOKIE_NAME).is_some_and(|token| verify_token(password, token, Utc::now()))
}

/// Extractor guarding admin-only handlers.
pub struct AdminSession;

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if is_admin(state, &parts.headers) { Ok(AdminSession) } else { Err(ApiError::Unauthorized) }
    }
}
