//! Domain events
use crate::domain::value_objects::ProductId;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Product(ProductEvent),
    Sales(SalesEvent),
    Payment(PaymentEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProductEvent {
    Upserted { product_id: ProductId },
    Deleted { product_id: ProductId },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SalesEvent {
    SettingsUpdated,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PaymentEvent {
    CryptoSessionOpened { session_id: Uuid, asset: String, amount: Decimal },
    CryptoSessionPaid { session_id: Uuid, tx_ids: Vec<String> },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> String {
        let (area, name) = match self {
            Self::Product(ProductEvent::Upserted { .. }) => ("product", "upserted"),
            Self::Product(ProductEvent::Deleted { .. }) => ("product", "deleted"),
            Self::Sales(SalesEvent::SettingsUpdated) => ("sales", "settings_updated"),
            Self::Payment(PaymentEvent::CryptoSessionOpened { .. }) => ("payment", "crypto_session_opened"),
            Self::Payment(PaymentEvent::CryptoSessionPaid { .. }) => ("payment", "crypto_session_paid"),
        };
        format!("storefront.{area}.{name}")
    }
}
