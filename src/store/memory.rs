use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use crate::domain::aggregates::{CryptoSession, DepositRecord, Product, SalesSettings};
use crate::Result;

#[derive(Default)]
struct Inner {
    products: HashMap<String, Product>,
    sales: Option<SalesSettings>,
    sessions: HashMap<Uuid, CryptoSession>,
    deposits: BTreeMap<String, DepositRecord>,
}

/// Process-local store. State is lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id.as_str().to_string(), p)).collect();
        Self { inner: Arc::new(RwLock::new(Inner { products, ..Default::default() })) }
    }

    /// Catalog taken from the seed file at `path`.
    pub async fn from_seed_file(path: &Path) -> Self {
        Self::with_products(super::load_seed_products(path).await)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.inner.read().await.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(products)
    }

    pub async fn get_product(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.inner.read().await.products.get(id).cloned())
    }

    pub async fn upsert_product(&self, product: &Product) -> Result<()> {
        self.inner.write().await.products.insert(product.id.as_str().to_string(), product.clone());
        Ok(())
    }

    pub async fn delete_product(&self, id: &str) -> Result<bool> {
        Ok(self.inner.write().await.products.remove(id).is_some())
    }

    pub async fn read_sales_settings(&self) -> Result<SalesSettings> {
        Ok(self.inner.read().await.sales.clone().unwrap_or_default())
    }

    pub async fn write_sales_settings(&self, settings: &SalesSettings) -> Result<()> {
        self.inner.write().await.sales = Some(settings.clone());
        Ok(())
    }

    pub async fn insert_crypto_session(&self, session: &CryptoSession) -> Result<()> {
        self.inner.write().await.sessions.insert(session.id, session.clone());
        Ok(())
    }

    pub async fn get_crypto_session(&self, id: Uuid) -> Result<Option<CryptoSession>> {
        Ok(self.inner.read().await.sessions.get(&id).cloned())
    }

    pub async fn mark_crypto_session_paid(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.sessions.get_mut(&id) {
            Some(session) if session.paid_at.is_none() => {
                session.paid_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub async fn record_deposit(&self, deposit: &DepositRecord) -> Result<()> {
        self.inner.write().await.deposits.insert(deposit.tx_id.clone(), deposit.clone());
        Ok(())
    }

    pub async fn deposit_history(&self, coin: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<DepositRecord>> {
        let inner = self.inner.read().await;
        let mut history: Vec<DepositRecord> = inner.deposits.values()
            .filter(|d| d.coin.eq_ignore_ascii_case(coin) && d.insert_time >= start && d.insert_time <= end)
            .cloned()
            .collect();
        history.sort_by_key(|d| d.insert_time);
        Ok(history)
    }
}
