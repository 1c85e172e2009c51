//! Product Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::value_objects::{round_cents, ProductId, ProductIdError};

pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Largest storable price: `NUMERIC(12, 2)`.
pub fn max_price() -> Decimal { Decimal::new(999_999_999_999, 2) }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender { Men, Women, Unisex }

impl Gender {
    pub fn parse(value: &str) -> Option<Self> {
        match value { "men" => Some(Self::Men), "women" => Some(Self::Women), "unisex" => Some(Self::Unisex), _ => None }
    }
    pub fn as_str(&self) -> &'static str {
        match self { Self::Men => "men", Self::Women => "women", Self::Unisex => "unisex" }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category { Shoes, Bags, Heels, Slippers }

impl Category {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "shoes" => Some(Self::Shoes), "bags" => Some(Self::Bags),
            "heels" => Some(Self::Heels), "slippers" => Some(Self::Slippers),
            _ => None,
        }
    }
    /// Key used to look the category up in the sales settings.
    pub fn as_str(&self) -> &'static str {
        match self { Self::Shoes => "shoes", Self::Bags => "bags", Self::Heels => "heels", Self::Slippers => "slippers" }
    }
}

/// A catalog entry as stored. `price` is the list price; sale pricing is
/// resolved at read time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
}

/// Admin payload for creating or patching a product. Every field is optional
/// so the same shape serves both; `create` enforces what is required.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[validate(length(max = 120))]
    pub id: Option<String>,
    #[validate(length(max = 200))]
    pub name: Option<String>,
    pub price: Option<Decimal>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub images: Option<Vec<String>>,
    pub video_url: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub gender: Option<String>,
    pub category: Option<String>,
    pub on_sale: Option<bool>,
    pub sale_price: Option<Decimal>,
}

impl Product {
    /// Builds a new product. `is_taken` reports ids already in the catalog;
    /// a colliding id gets the first free `-2`, `-3`, ... suffix.
    pub fn create(input: ProductInput, is_taken: impl Fn(&ProductId) -> bool) -> Result<Self, ProductError> {
        let name = input.name.as_deref().map(str::trim).filter(|n| !n.is_empty()).ok_or(ProductError::MissingFields)?.to_string();
        let price = checked_price(input.price.ok_or(ProductError::MissingFields)?)?;

        let base = match input.id.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
            Some(id) => ProductId::new(id)?,
            None => ProductId::slugify(&name),
        };
        let mut id = base.clone();
        let mut n = 2;
        while is_taken(&id) {
            id = base.with_suffix(n);
            n += 1;
        }

        let images = input.images.unwrap_or_default();
        let thumbnail = non_empty(input.thumbnail)
            .or_else(|| images.first().cloned())
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());
        let on_sale = input.on_sale.unwrap_or(false);
        let sale_price = if on_sale { checked_sale_price(input.sale_price)? } else { None };

        Ok(Self {
            id, name, price,
            description: input.description.unwrap_or_default(),
            thumbnail, images,
            video_url: non_empty(input.video_url),
            sizes: normalize_sizes(input.sizes.unwrap_or_default()),
            gender: input.gender.as_deref().and_then(Gender::parse),
            category: input.category.as_deref().and_then(Category::parse),
            on_sale, sale_price,
        })
    }

    /// Merges a patch. The id never changes; unrecognised gender or category
    /// values keep the current one; a sale price only survives while on sale.
    pub fn apply_patch(&mut self, patch: ProductInput) -> Result<(), ProductError> {
        let price = patch.price.map(checked_price).transpose()?;
        let sale_price = checked_sale_price(patch.sale_price)?;
        if let Some(price) = price { self.price = price; }
        if let Some(name) = patch.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) { self.name = name.to_string(); }
        if let Some(description) = patch.description { self.description = description; }
        if let Some(thumbnail) = patch.thumbnail { self.thumbnail = thumbnail; }
        if let Some(images) = patch.images { self.images = images; }
        if patch.video_url.is_some() { self.video_url = non_empty(patch.video_url); }
        if let Some(sizes) = patch.sizes { self.sizes = normalize_sizes(sizes); }
        if let Some(gender) = patch.gender.as_deref().and_then(Gender::parse) { self.gender = Some(gender); }
        if let Some(category) = patch.category.as_deref().and_then(Category::parse) { self.category = Some(category); }
        if let Some(on_sale) = patch.on_sale { self.on_sale = on_sale; }

        self.sale_price = if self.on_sale { sale_price.or(self.sale_price) } else { None };
        Ok(())
    }

    pub fn image_url(&self) -> &str {
        if !self.thumbnail.is_empty() { return &self.thumbnail; }
        self.images.first().map(String::as_str).unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// `query` must already be lowercased.
    pub fn matches_query(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query) || self.description.to_lowercase().contains(query)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn normalize_sizes(sizes: Vec<String>) -> Vec<String> {
    sizes.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

/// Rounds to cents and rejects values the catalog cannot store.
fn checked_price(value: Decimal) -> Result<Decimal, ProductError> {
    let price = round_cents(value);
    if price.is_sign_negative() || price > max_price() { return Err(ProductError::InvalidPrice); }
    Ok(price)
}

fn checked_sale_price(value: Option<Decimal>) -> Result<Option<Decimal>, ProductError> {
    value.map(checked_price).transpose()
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { MissingFields, InvalidPrice, InvalidId(ProductIdError) }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields => write!(f, "Missing required fields"),
            Self::InvalidPrice => write!(f, "Invalid price"),
            Self::InvalidId(e) => write!(f, "Invalid id: {e}"),
        }
    }
}
impl From<ProductIdError> for ProductError { fn from(e: ProductIdError) -> Self { Self::InvalidId(e) } }
