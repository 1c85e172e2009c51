//! Kicklab Storefront
//!
//! Backend for a sneaker and fashion storefront.
//!
//! ## Features
//! - Product catalog with sale pricing (manual, flash, category and global tiers)
//! - Cart quotes and WhatsApp ordering
//! - Crypto checkout reconciled against a deposit ledger
//! - Password-gated admin API for products, sales and deposits

use thiserror::Error;

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod publisher;
pub mod store;

pub use api::{router, AppState};
pub use config::Config;
pub use store::Store;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
