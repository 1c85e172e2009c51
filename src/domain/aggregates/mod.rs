//! Aggregates module
pub mod product;
pub mod sales;
pub mod cart;
pub mod crypto_session;

pub use product::{Category, Gender, Product, ProductError, ProductInput, PLACEHOLDER_IMAGE};
pub use sales::{FlashItem, FlashSales, SaleWindow, SalesSettings};
pub use cart::{Cart, CartItem};
pub use crypto_session::{Confirmation, CryptoSession, DepositRecord, DepositStatus, SessionError, SessionRequest};
