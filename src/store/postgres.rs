use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use uuid::Uuid;
use crate::domain::aggregates::{Category, CryptoSession, DepositRecord, Gender, Product, SalesSettings};
use crate::domain::value_objects::ProductId;
use crate::{Result, StorefrontError};

const SALES_SETTINGS_ID: &str = "settings";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
    seed_sizes: Arc<HashMap<String, Vec<String>>>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String, name: String, price: Decimal, description: String, thumbnail: String,
    images: Vec<String>, video_url: Option<String>, sizes: Vec<String>,
    gender: Option<String>, category: Option<String>, on_sale: bool, sale_price: Option<Decimal>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StorefrontError;

    fn try_from(r: ProductRow) -> Result<Self> {
        let id = ProductId::new(r.id).map_err(|e| StorefrontError::CorruptRecord(format!("product id: {e}")))?;
        Ok(Self {
            id, name: r.name, price: r.price, description: r.description, thumbnail: r.thumbnail,
            images: r.images, video_url: r.video_url, sizes: r.sizes,
            gender: r.gender.as_deref().and_then(Gender::parse),
            category: r.category.as_deref().and_then(Category::parse),
            on_sale: r.on_sale, sale_price: r.sale_price,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid, amount: Decimal, asset: String, network: Option<String>, address: String,
    tag_or_memo: Option<String>, created_at: DateTime<Utc>, paid_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for CryptoSession {
    fn from(r: SessionRow) -> Self {
        Self {
            id: r.id, amount: r.amount, asset: r.asset, network: r.network, address: r.address,
            tag_or_memo: r.tag_or_memo, created_at: r.created_at, paid_at: r.paid_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DepositRow {
    tx_id: String, coin: String, network: Option<String>, address: Option<String>, address_tag: Option<String>,
    amount: Decimal, status: i16, insert_time: DateTime<Utc>,
}

impl From<DepositRow> for DepositRecord {
    fn from(r: DepositRow) -> Self {
        Self {
            tx_id: r.tx_id, coin: r.coin, network: r.network, address: r.address, address_tag: r.address_tag,
            amount: r.amount, status: u8::try_from(r.status).unwrap_or(u8::MAX).into(), insert_time: r.insert_time,
        }
    }
}

impl PgStore {
    pub async fn connect(url: &str, seed_sizes: HashMap<String, Vec<String>>) -> Result<Self> {
        let db = PgPoolOptions::new().max_connections(10).connect(url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;
        tracing::info!("connected to Postgres, migrations applied");
        Ok(Self { db, seed_sizes: Arc::new(seed_sizes) })
    }

    fn product(&self, row: ProductRow) -> Result<Product> {
        let mut product = Product::try_from(row)?;
        super::fill_seed_sizes(&mut product, &self.seed_sizes);
        Ok(product)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY name, id")
            .fetch_all(&self.db).await?
            .into_iter().map(|row| self.product(row)).collect()
    }

    pub async fn get_product(&self, id: &str) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?
            .map(|row| self.product(row)).transpose()
    }

    pub async fn upsert_product(&self, p: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, name, price, description, thumbnail, images, video_url, sizes, gender, category, on_sale, sale_price, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW(), NOW()) \
             ON CONFLICT (id) DO UPDATE SET name = $2, price = $3, description = $4, thumbnail = $5, images = $6, video_url = $7, \
             sizes = $8, gender = $9, category = $10, on_sale = $11, sale_price = $12, updated_at = NOW()")
            .bind(p.id.as_str()).bind(&p.name).bind(p.price).bind(&p.description).bind(&p.thumbnail)
            .bind(&p.images).bind(&p.video_url).bind(&p.sizes)
            .bind(p.gender.map(|g| g.as_str())).bind(p.category.map(|c| c.as_str()))
            .bind(p.on_sale).bind(p.sale_price)
            .execute(&self.db).await?;
        Ok(())
    }

    pub async fn delete_product(&self, id: &str) -> Result<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn read_sales_settings(&self) -> Result<SalesSettings> {
        let row: Option<(Json<SalesSettings>,)> = sqlx::query_as("SELECT document FROM sales_settings WHERE id = $1")
            .bind(SALES_SETTINGS_ID).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(settings),)| settings).unwrap_or_default())
    }

    pub async fn write_sales_settings(&self, settings: &SalesSettings) -> Result<()> {
        sqlx::query("INSERT INTO sales_settings (id, document, updated_at) VALUES ($1, $2, $3) \
                     ON CONFLICT (id) DO UPDATE SET document = $2, updated_at = $3")
            .bind(SALES_SETTINGS_ID).bind(Json(settings)).bind(settings.updated_at.unwrap_or_else(Utc::now))
            .execute(&self.db).await?;
        Ok(())
    }

    pub async fn insert_crypto_session(&self, s: &CryptoSession) -> Result<()> {
        sqlx::query("INSERT INTO crypto_sessions (id, amount, asset, network, address, tag_or_memo, created_at, paid_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
            .bind(s.id).bind(s.amount).bind(&s.asset).bind(&s.network).bind(&s.address)
            .bind(&s.tag_or_memo).bind(s.created_at).bind(s.paid_at)
            .execute(&self.db).await?;
        Ok(())
    }

    pub async fn get_crypto_session(&self, id: Uuid) -> Result<Option<CryptoSession>> {
        let row = sqlx::query_as::<_, SessionRow>("SELECT * FROM crypto_sessions WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?;
        Ok(row.map(CryptoSession::from))
    }

    pub async fn mark_crypto_session_paid(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let done = sqlx::query("UPDATE crypto_sessions SET paid_at = $2 WHERE id = $1 AND paid_at IS NULL")
            .bind(id).bind(at).execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn record_deposit(&self, d: &DepositRecord) -> Result<()> {
        sqlx::query("INSERT INTO deposits (tx_id, coin, network, address, address_tag, amount, status, insert_time) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                     ON CONFLICT (tx_id) DO UPDATE SET coin = $2, network = $3, address = $4, address_tag = $5, amount = $6, status = $7, insert_time = $8")
            .bind(&d.tx_id).bind(d.coin.to_uppercase()).bind(&d.network).bind(&d.address).bind(&d.address_tag)
            .bind(d.amount).bind(i16::from(u8::from(d.status))).bind(d.insert_time)
            .execute(&self.db).await?;
        Ok(())
    }

    pub async fn deposit_history(&self, coin: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<DepositRecord>> {
        let rows = sqlx::query_as::<_, DepositRow>("SELECT * FROM deposits WHERE coin = $1 AND insert_time BETWEEN $2 AND $3 ORDER BY insert_time")
            .bind(coin.to_uppercase()).bind(start).bind(end)
            .fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(DepositRecord::from).collect())
    }
}
