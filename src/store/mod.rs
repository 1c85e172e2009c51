//! Persistence: Postgres when configured, otherwise an in-memory store seeded
//! from the product seed file.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;
use crate::config::Config;
use crate::domain::aggregates::{CryptoSession, DepositRecord, Product, SalesSettings};
use crate::Result;

#[derive(Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Store::Postgres($store) => $call,
            Store::Memory($store) => $call,
        }
    };
}

impl Store {
    pub async fn connect(config: &Config) -> Result<Self> {
        match &config.database_url {
            Some(url) => {
                let seed_sizes = seed_sizes(load_seed_products(&config.seed_products).await);
                Ok(Self::Postgres(PgStore::connect(url, seed_sizes).await?))
            }
            None => {
                tracing::warn!(seed = %config.seed_products.display(), "DATABASE_URL not set, using in-memory store");
                Ok(Self::Memory(MemoryStore::from_seed_file(&config.seed_products).await))
            }
        }
    }

    /// Every product, ordered by name.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        dispatch!(self, s => s.list_products().await)
    }

    pub async fn get_product(&self, id: &str) -> Result<Option<Product>> {
        dispatch!(self, s => s.get_product(id).await)
    }

    pub async fn upsert_product(&self, product: &Product) -> Result<()> {
        dispatch!(self, s => s.upsert_product(product).await)
    }

    /// Returns whether a product was removed.
    pub async fn delete_product(&self, id: &str) -> Result<bool> {
        dispatch!(self, s => s.delete_product(id).await)
    }

    /// The stored settings, or an empty document.
    pub async fn read_sales_settings(&self) -> Result<SalesSettings> {
        dispatch!(self, s => s.read_sales_settings().await)
    }

    /// Stamps `updated_at` and replaces the stored document.
    pub async fn write_sales_settings(&self, settings: SalesSettings, now: DateTime<Utc>) -> Result<SalesSettings> {
        let settings = SalesSettings { updated_at: Some(now), ..settings };
        dispatch!(self, s => s.write_sales_settings(&settings).await)?;
        Ok(settings)
    }

    pub async fn insert_crypto_session(&self, session: &CryptoSession) -> Result<()> {
        dispatch!(self, s => s.insert_crypto_session(session).await)
    }

    pub async fn get_crypto_session(&self, id: Uuid) -> Result<Option<CryptoSession>> {
        dispatch!(self, s => s.get_crypto_session(id).await)
    }

    /// Stamps the session paid unless it already is. Returns whether this
    /// call did the stamping.
    pub async fn mark_crypto_session_paid(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        dispatch!(self, s => s.mark_crypto_session_paid(id, at).await)
    }

    /// Upserts by `tx_id`.
    pub async fn record_deposit(&self, deposit: &DepositRecord) -> Result<()> {
        dispatch!(self, s => s.record_deposit(deposit).await)
    }

    /// Deposits of `coin` inserted within `[start, end]`, oldest first.
    pub async fn deposit_history(&self, coin: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<DepositRecord>> {
        dispatch!(self, s => s.deposit_history(coin, start, end).await)
    }
}

/// Reads the JSON product array at `path`. A missing or malformed file
/// yields no products.
pub async fn load_seed_products(path: &Path) -> Vec<Product> {
    match tokio::fs::read(path).await {
        Ok(raw) => match serde_json::from_slice::<Vec<Product>>(&raw) {
            Ok(products) => {
                tracing::info!(count = products.len(), path = %path.display(), "loaded seed products");
                products
            }
            Err(error) => {
                tracing::warn!(%error, path = %path.display(), "ignoring malformed seed file");
                Vec::new()
            }
        },
        Err(error) => {
            tracing::warn!(%error, path = %path.display(), "no seed products");
            Vec::new()
        }
    }
}

/// Size lists of seed products, by id.
pub(crate) fn seed_sizes(products: Vec<Product>) -> HashMap<String, Vec<String>> {
    products.into_iter()
        .filter(|p| !p.sizes.is_empty())
        .map(|p| (p.id.as_str().to_string(), p.sizes))
        .collect()
}

/// Stored products without sizes fall back to the seed file's sizes.
pub(crate) fn fill_seed_sizes(product: &mut Product, seed_sizes: &HashMap<String, Vec<String>>) {
    if product.sizes.is_empty() {
        if let Some(sizes) = seed_sizes.get(product.id.as_str()) {
            product.sizes = sizes.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::ProductInput;
    use rust_decimal::Decimal;

    fn product(name: &str, sizes: &[&str]) -> Product {
        Product::create(ProductInput {
            name: Some(name.into()), price: Some(Decimal::new(50, 0)),
            sizes: Some(sizes.iter().map(|s| s.to_string()).collect()), ..Default::default()
        }, |_| false).unwrap()
    }

    #[test]
    fn test_missing_sizes_come_from_seed() {
        let seed = seed_sizes(vec![product("Dunk Low", &["41", "42"]), product("Canvas Tote", &[])]);
        assert!(!seed.contains_key("canvas-tote"));

        let mut stored = product("Dunk Low", &[]);
        fill_seed_sizes(&mut stored, &seed);
        assert_eq!(stored.sizes, vec!["41", "42"]);

        let mut own = product("Dunk Low", &["44"]);
        fill_seed_sizes(&mut own, &seed);
        assert_eq!(own.sizes, vec!["44"]);
    }

    #[tokio::test]
    async fn test_bundled_seed_has_sizes() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/products.json");
        let seed = seed_sizes(load_seed_products(&path).await);
        assert!(seed.contains_key("air-max-90-white"));
    }
}
