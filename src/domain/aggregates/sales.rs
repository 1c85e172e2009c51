//! Sales settings aggregate: the singleton document holding every sale window.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use crate::domain::value_objects::Percent;

/// A discount that is live between optional bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleWindow {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub percent: Decimal,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
}

fn enabled_by_default() -> bool { true }

impl SaleWindow {
    pub fn new(percent: Decimal) -> Self { Self { enabled: true, percent, start_at: None, end_at: None } }

    /// Enabled, inside its bounds (both inclusive) and discounting something.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled { return false; }
        if self.start_at.is_some_and(|start| now < start) { return false; }
        if self.end_at.is_some_and(|end| now > end) { return false; }
        self.percent > Decimal::ZERO
    }

    pub fn percent(&self) -> Percent { Percent::clamped(self.percent) }
}

/// Per-product ("flash") window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlashItem {
    pub id: String,
    #[serde(flatten)]
    pub window: SaleWindow,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlashSales {
    #[serde(default)]
    pub items: Vec<FlashItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<SaleWindow>,
    #[serde(default)]
    pub categories: BTreeMap<String, SaleWindow>,
    #[serde(default)]
    pub flash: FlashSales,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SalesSettings {
    /// Category keys are matched lowercased; percents are stored clamped.
    pub fn normalized(self) -> Self {
        let clamp = |mut w: SaleWindow| { w.percent = w.percent().value(); w };
        Self {
            global: self.global.map(clamp),
            categories: self.categories.into_iter().map(|(k, w)| (k.trim().to_lowercase(), clamp(w))).collect(),
            flash: FlashSales {
                items: self.flash.items.into_iter().map(|i| FlashItem { id: i.id.trim().to_string(), window: clamp(i.window) }).collect(),
            },
            updated_at: self.updated_at,
        }
    }

    pub fn flash_for(&self, product_id: &str) -> Option<&SaleWindow> {
        self.flash.items.iter().find(|i| i.id == product_id).map(|i| &i.window)
    }

    pub fn category(&self, key: &str) -> Option<&SaleWindow> {
        if key.is_empty() { return None; }
        self.categories.get(&key.to_lowercase())
    }
}

/// Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM[:SS]` (read as UTC), or
/// an empty string / null for "unbounded".
fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) else { return Ok(None) };
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) { return Ok(Some(t.with_timezone(&Utc))); }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|t| Some(t.and_utc()))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{raw}`")))
}
