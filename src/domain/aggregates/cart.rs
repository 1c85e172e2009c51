//! Cart Aggregate

use serde::Serialize;
use crate::domain::pricing::{PricedProduct, SaleApplied};
use crate::domain::value_objects::{Money, MoneyError, ProductId, DEFAULT_CURRENCY};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartItem>,
    subtotal: Money,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub original_price: Money,
    pub sale: Option<SaleApplied>,
    pub image_url: String,
}

impl CartItem {
    pub fn from_priced(product: &PricedProduct, size: Option<String>, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            size: size.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            quantity,
            unit_price: Money::usd(product.price),
            original_price: Money::usd(product.original_price),
            sale: product.sale,
            image_url: if product.thumbnail.is_empty() {
                product.images.first().cloned().unwrap_or_else(|| super::product::PLACEHOLDER_IMAGE.to_string())
            } else {
                product.thumbnail.clone()
            },
        }
    }

    pub fn line_total(&self) -> Result<Money, MoneyError> { self.unit_price.multiply(self.quantity) }
}

impl Default for Cart {
    fn default() -> Self { Self { items: vec![], subtotal: Money::zero(DEFAULT_CURRENCY) } }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Same product in the same size merges into one line. Fails without
    /// touching the cart when the new subtotal is out of range.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), MoneyError> {
        let mut items = self.items.clone();
        if let Some(existing) = items.iter_mut().find(|i| i.product_id == item.product_id && i.size == item.size) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            items.push(item);
        }
        self.subtotal = subtotal(&items)?;
        self.items = items;
        Ok(())
    }

    /// The order text sent to the shop over WhatsApp.
    pub fn order_message(&self) -> String {
        let mut lines = vec!["Hello! I'd like to order:".to_string()];
        for item in &self.items {
            let size = item.size.as_deref().map(|s| format!(" (size {s})")).unwrap_or_default();
            lines.push(format!("• {}{size} x{} — {} each", item.name, item.quantity, item.unit_price));
        }
        lines.push("—".to_string());
        lines.push(format!("Total: {}", self.subtotal));
        lines.join("\n")
    }

    /// `phone` must already be digits only.
    pub fn whatsapp_url(&self, phone: Option<&str>) -> String {
        let message = self.order_message();
        let text = encode_uri_component(&message);
        match phone {
            Some(phone) => format!("https://wa.me/{phone}?text={text}"),
            None => format!("https://wa.me/?text={text}"),
        }
    }
}

fn subtotal(items: &[CartItem]) -> Result<Money, MoneyError> {
    items.iter().try_fold(Money::zero(DEFAULT_CURRENCY), |acc, i| acc.add(&i.line_total()?))
}

/// Percent-encodes like a browser's `encodeURIComponent`, which leaves
/// `!'()*` as they are.
fn encode_uri_component(text: &str) -> String {
    let mut encoded = urlencoding::encode(text).into_owned();
    for (escape, c) in [("%21", "!"), ("%27", "'"), ("%28", "("), ("%29", ")"), ("%2A", "*")] {
        encoded = encoded.replace(escape, c);
    }
    encoded
}
