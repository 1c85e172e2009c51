//! Runtime configuration read from the environment (and `.env`, via dotenvy).

use anyhow::Context;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_SEED_PRODUCTS: &str = "data/products.json";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub admin_password: Option<String>,
    /// Marks the admin cookie `Secure`.
    pub secure_cookies: bool,
    /// Digits only, without the leading `+`.
    pub whatsapp_phone: Option<String>,
    pub seed_products: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let port = match var("PORT") {
            Some(port) => port.parse().with_context(|| format!("invalid PORT `{port}`"))?,
            None => DEFAULT_PORT,
        };
        let whatsapp_phone = var("WHATSAPP_PHONE").and_then(|raw| {
            let phone = normalize_phone(&raw);
            if phone.is_none() { tracing::warn!(%raw, "ignoring malformed WHATSAPP_PHONE"); }
            phone
        });
        Ok(Self {
            port,
            database_url: var("DATABASE_URL"),
            nats_url: var("NATS_URL"),
            admin_password: var("ADMIN_PASSWORD"),
            secure_cookies: var("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production")),
            whatsapp_phone,
            seed_products: var("SEED_PRODUCTS").map(PathBuf::from).unwrap_or_else(|| DEFAULT_SEED_PRODUCTS.into()),
        })
    }
}

/// `+?` followed by at least seven digits; anything else is rejected.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    (digits.len() >= 7 && digits.chars().all(|c| c.is_ascii_digit())).then(|| digits.to_string())
}
