use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use super::error::ApiResult;
use super::{ApiJson, AppState};
use crate::auth::AdminSession;
use crate::domain::aggregates::SalesSettings;
use crate::domain::events::{DomainEvent, SalesEvent};

pub async fn get_settings(State(s): State<AppState>) -> ApiResult<impl IntoResponse> {
    let settings = s.store.read_sales_settings().await?;
    Ok(([(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))], Json(settings)))
}

pub async fn update_settings(_: AdminSession, State(s): State<AppState>, ApiJson(settings): ApiJson<SalesSettings>) -> ApiResult<Json<SalesSettings>> {
    let saved = s.store.write_sales_settings(settings.normalized(), Utc::now()).await?;
    tracing::info!(
        global = saved.global.is_some(),
        categories = saved.categories.len(),
        flash = saved.flash.items.len(),
        "sales settings updated"
    );
    s.events.publish(DomainEvent::Sales(SalesEvent::SettingsUpdated)).await;
    Ok(Json(saved))
}
