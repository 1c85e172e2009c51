use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::Validate;
use super::error::{ApiResult, OptionExt};
use super::{ApiJson, AppState};
use crate::auth::AdminSession;
use crate::domain::aggregates::{Product, ProductInput};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::pricing::{price_product, PricedProduct};

pub const MAX_SUGGESTIONS: usize = 8;

pub async fn list_products(State(s): State<AppState>) -> ApiResult<Json<Vec<PricedProduct>>> {
    let settings = s.store.read_sales_settings().await?;
    let now = Utc::now();
    let products = s.store.list_products().await?;
    Ok(Json(products.iter().map(|p| price_product(p, &settings, now)).collect()))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<PricedProduct>> {
    let product = s.store.get_product(&id).await?.ok_or_not_found(|| format!("product `{id}`"))?;
    let settings = s.store.read_sales_settings().await?;
    Ok(Json(price_product(&product, &settings, Utc::now())))
}

pub async fn create_product(_: AdminSession, State(s): State<AppState>, ApiJson(input): ApiJson<ProductInput>) -> ApiResult<(StatusCode, Json<Product>)> {
    input.validate()?;
    let taken: HashSet<_> = s.store.list_products().await?.into_iter().map(|p| p.id).collect();
    let product = Product::create(input, |id| taken.contains(id))?;
    s.store.upsert_product(&product).await?;
    tracing::info!(id = %product.id, "product created");
    s.events.publish(DomainEvent::Product(ProductEvent::Upserted { product_id: product.id.clone() })).await;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(_: AdminSession, State(s): State<AppState>, Path(id): Path<String>, ApiJson(patch): ApiJson<ProductInput>) -> ApiResult<Json<Product>> {
    patch.validate()?;
    let mut product = s.store.get_product(&id).await?.ok_or_not_found(|| format!("product `{id}`"))?;
    product.apply_patch(patch)?;
    s.store.upsert_product(&product).await?;
    tracing::info!(id = %product.id, "product updated");
    s.events.publish(DomainEvent::Product(ProductEvent::Upserted { product_id: product.id.clone() })).await;
    Ok(Json(product))
}

pub async fn delete_product(_: AdminSession, State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    let product = s.store.get_product(&id).await?.ok_or_not_found(|| format!("product `{id}`"))?;
    s.store.delete_product(&id).await?;
    tracing::info!(%id, "product deleted");
    s.events.publish(DomainEvent::Product(ProductEvent::Deleted { product_id: product.id })).await;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams { pub q: Option<String>, pub query: Option<String> }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion { pub id: String, pub name: String, pub image_url: String }

#[derive(Debug, Serialize)]
pub struct Suggestions { pub items: Vec<Suggestion> }

pub async fn search_suggestions(State(s): State<AppState>, Query(p): Query<SearchParams>) -> ApiResult<Json<Suggestions>> {
    let needle = p.query.or(p.q).unwrap_or_default().trim().to_lowercase();
    if needle.is_empty() { return Ok(Json(Suggestions { items: vec![] })); }
    let items = s.store.list_products().await?
        .iter()
        .filter(|p| p.matches_query(&needle))
        .take(MAX_SUGGESTIONS)
        .map(|p| Suggestion { id: p.id.to_string(), name: p.name.clone(), image_url: p.image_url().to_string() })
        .collect();
    Ok(Json(Suggestions { items }))
}
