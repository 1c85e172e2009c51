use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;
use super::error::{ApiError, ApiResult};
use super::{ApiJson, AppState};
use crate::domain::aggregates::{Cart, CartItem};
use crate::domain::pricing::price_product;
use crate::domain::value_objects::Money;

#[derive(Debug, Deserialize, Validate)]
pub struct CartLineRequest {
    #[validate(length(min = 1, max = 120))]
    pub id: String,
    pub size: Option<String>,
    #[serde(alias = "quantity")]
    #[validate(range(min = 1, max = 99))]
    pub qty: u32,
}

#[derive(Debug, Deserialize)]
pub struct CartRequest {
    #[serde(default)]
    pub items: Vec<CartLineRequest>,
}

#[derive(Debug, Serialize)]
pub struct CartQuote {
    #[serde(flatten)]
    pub cart: Cart,
    pub unavailable: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct WhatsAppCheckout {
    pub url: String,
    pub message: String,
    pub total: Money,
}

/// Prices every line at current sale prices. Ids missing from the catalog
/// are returned separately.
async fn price_cart(s: &AppState, request: CartRequest) -> ApiResult<CartQuote> {
    for line in &request.items { line.validate()?; }
    let settings = s.store.read_sales_settings().await?;
    let now = Utc::now();
    let mut cart = Cart::new();
    let mut unavailable = Vec::new();
    for line in request.items {
        match s.store.get_product(line.id.trim()).await? {
            Some(product) => cart.add_item(CartItem::from_priced(&price_product(&product, &settings, now), line.size, line.qty))?,
            None => unavailable.push(line.id),
        }
    }
    Ok(CartQuote { cart, unavailable })
}

pub async fn quote(State(s): State<AppState>, ApiJson(request): ApiJson<CartRequest>) -> ApiResult<Json<CartQuote>> {
    Ok(Json(price_cart(&s, request).await?))
}

pub async fn whatsapp_checkout(State(s): State<AppState>, ApiJson(request): ApiJson<CartRequest>) -> ApiResult<Json<WhatsAppCheckout>> {
    let CartQuote { cart, unavailable } = price_cart(&s, request).await?;
    if cart.is_empty() { return Err(ApiError::BadRequest("Cart is empty".into())); }
    if !unavailable.is_empty() { tracing::debug!(?unavailable, "dropping unknown products from WhatsApp order"); }
    Ok(Json(WhatsAppCheckout {
        url: cart.whatsapp_url(s.config.whatsapp_phone.as_deref()),
        message: cart.order_message(),
        total: cart.subtotal().clone(),
    }))
}
