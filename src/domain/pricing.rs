//! Sale resolution.
//!
//! A product gets at most one discount. Tiers are tried from most to least
//! specific and the first active one wins:
//!
//! 1. **manual**: the product itself is flagged on sale with a lower sale price
//! 2. **flash**: a window targeting the product id
//! 3. **category**: a window keyed by the product's category
//! 4. **global**: the storewide window

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::{Category, Gender, Product, SaleWindow, SalesSettings};
use crate::domain::value_objects::{round_cents, Percent, ProductId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleKind { Manual, Flash, Category, Global }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleApplied {
    #[serde(rename = "type")]
    pub kind: SaleKind,
    pub percent: Percent,
}

/// Catalog view of a product: `price` is what the customer pays.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub original_price: Decimal,
    pub sale: Option<SaleApplied>,
    pub description: String,
    pub thumbnail: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub sizes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub on_sale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
}

/// The manual sale price, if it is a real discount on the list price.
fn manual_sale_price(product: &Product) -> Option<Decimal> {
    if !product.on_sale { return None; }
    product.sale_price.filter(|p| *p > Decimal::ZERO && *p < product.price)
}

fn window_sale(kind: SaleKind, window: Option<&SaleWindow>, now: DateTime<Utc>) -> Option<SaleApplied> {
    let window = window.filter(|w| w.is_active(now))?;
    let percent = window.percent();
    (!percent.is_zero()).then_some(SaleApplied { kind, percent })
}

pub fn pick_sale(product: &Product, settings: &SalesSettings, now: DateTime<Utc>) -> Option<SaleApplied> {
    if let Some(sale_price) = manual_sale_price(product) {
        let off = (Decimal::ONE - sale_price / product.price) * Decimal::ONE_HUNDRED;
        return Some(SaleApplied { kind: SaleKind::Manual, percent: Percent::clamped(round_whole(off)) });
    }
    let category = product.category.map(|c| c.as_str()).unwrap_or_default();
    window_sale(SaleKind::Flash, settings.flash_for(product.id.as_str()), now)
        .or_else(|| window_sale(SaleKind::Category, settings.category(category), now))
        .or_else(|| window_sale(SaleKind::Global, settings.global.as_ref(), now))
}

pub fn apply_sale(price: Decimal, applied: Option<&SaleApplied>) -> Decimal {
    match applied {
        Some(sale) => round_cents(price * sale.percent.remaining_factor()),
        None => price,
    }
}

pub fn price_product(product: &Product, settings: &SalesSettings, now: DateTime<Utc>) -> PricedProduct {
    let sale = pick_sale(product, settings, now);
    let price = match (&sale, manual_sale_price(product)) {
        (Some(SaleApplied { kind: SaleKind::Manual, .. }), Some(sale_price)) => sale_price,
        _ => apply_sale(product.price, sale.as_ref()),
    };
    let p = product.clone();
    PricedProduct {
        id: p.id, name: p.name, price, original_price: p.price, sale,
        description: p.description, thumbnail: p.thumbnail, images: p.images,
        video_url: p.video_url, sizes: p.sizes, gender: p.gender, category: p.category,
        on_sale: p.on_sale, sale_price: p.sale_price,
    }
}

fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}
