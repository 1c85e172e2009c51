//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CURRENCY: &str = "USD";

/// Catalog identifier: a lowercase slug such as `air-max-90`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(String);

impl ProductId {
    pub const MAX_LEN: usize = 120;

    pub fn new(value: impl Into<String>) -> Result<Self, ProductIdError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(ProductIdError::Empty); }
        if value.len() > Self::MAX_LEN { return Err(ProductIdError::TooLong); }
        Ok(Self(value))
    }

    /// Derives an id from a display name. Runs of anything outside `[a-z0-9]`
    /// collapse into one `-`; a name with nothing usable becomes `product`.
    pub fn slugify(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        let mut pending_dash = false;
        for c in name.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                if pending_dash && !slug.is_empty() { slug.push('-'); }
                pending_dash = false;
                slug.push(c);
            } else {
                pending_dash = true;
            }
        }
        slug.truncate(Self::MAX_LEN);
        let slug = slug.trim_end_matches('-').to_string();
        if slug.is_empty() { Self("product".into()) } else { Self(slug) }
    }

    /// `base-2`, `base-3`, ... for collision resolution.
    pub fn with_suffix(&self, n: u32) -> Self { Self(format!("{}-{}", self.0, n)) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductIdError { Empty, TooLong }
impl std::error::Error for ProductIdError {}
impl fmt::Display for ProductIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "product id empty"), Self::TooLong => write!(f, "product id too long") }
    }
}

/// Discount percentage, always within `0..=100`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Percent(Decimal);

impl Percent {
    pub fn clamped(value: Decimal) -> Self { Self(value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)) }
    pub fn value(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }

    /// Multiplier left after the discount, e.g. `0.75` for 25%.
    pub fn remaining_factor(&self) -> Decimal { Decimal::ONE - self.0 / Decimal::ONE_HUNDRED }
}

impl From<Decimal> for Percent { fn from(value: Decimal) -> Self { Self::clamped(value) } }
impl From<Percent> for Decimal { fn from(value: Percent) -> Self { value.0 } }

/// Rounds to cents, half away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn usd(amount: Decimal) -> Self { Self::new(amount, DEFAULT_CURRENCY) }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        let amount = self.amount.checked_add(other.amount).ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Result<Money, MoneyError> {
        let amount = self.amount.checked_mul(Decimal::from(qty)).ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, &self.currency))
    }
}

impl Default for Money { fn default() -> Self { Self::zero(DEFAULT_CURRENCY) } }

/// Renders as `$12.50` for USD, `12.50 EUR` otherwise.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = round_cents(self.amount);
        if self.currency == DEFAULT_CURRENCY { write!(f, "${amount:.2}") } else { write!(f, "{amount:.2} {}", self.currency) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { CurrencyMismatch, Overflow }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::CurrencyMismatch => write!(f, "Currency mismatch"), Self::Overflow => write!(f, "Amount out of range") }
    }
}
