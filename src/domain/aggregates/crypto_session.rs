//! Crypto deposit sessions and the deposits they are reconciled against.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How far before the session's creation deposit history is searched.
pub const HISTORY_LOOKBACK_MINUTES: i64 = 30;

/// Slack on amount comparison, absorbing exchange-side float rounding.
pub fn amount_tolerance() -> Decimal { Decimal::new(1, 8) }

/// Customer request to pay in crypto.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub asset: String,
    #[serde(default)]
    pub address: String,
    pub network: Option<String>,
    pub tag_or_memo: Option<String>,
}

/// A pending crypto payment: the customer is expected to send `amount` of
/// `asset` to `address` (with `tag_or_memo` when the network needs one).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoSession {
    pub id: Uuid,
    pub amount: Decimal,
    pub asset: String,
    pub network: Option<String>,
    pub address: String,
    pub tag_or_memo: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum DepositStatus { Pending, Success, Other(u8) }

impl From<u8> for DepositStatus {
    fn from(code: u8) -> Self {
        match code { 0 => Self::Pending, 1 => Self::Success, other => Self::Other(other) }
    }
}

impl From<DepositStatus> for u8 {
    fn from(status: DepositStatus) -> Self {
        match status { DepositStatus::Pending => 0, DepositStatus::Success => 1, DepositStatus::Other(code) => code }
    }
}

/// One entry of the exchange deposit history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRecord {
    pub tx_id: String,
    pub coin: String,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub address_tag: Option<String>,
    pub amount: Decimal,
    pub status: DepositStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub insert_time: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub tx_id: String,
    pub amount: Decimal,
    pub network: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub insert_time: DateTime<Utc>,
}

impl From<&DepositRecord> for Confirmation {
    fn from(d: &DepositRecord) -> Self {
        Self { tx_id: d.tx_id.clone(), amount: d.amount, network: d.network.clone(), insert_time: d.insert_time }
    }
}

impl CryptoSession {
    pub fn open(request: SessionRequest, now: DateTime<Utc>) -> Result<Self, SessionError> {
        let amount = request.amount.filter(|a| *a > Decimal::ZERO).ok_or(SessionError::InvalidAmount)?;
        let asset = request.asset.trim().to_uppercase();
        if asset.is_empty() { return Err(SessionError::MissingAsset); }
        let address = request.address.trim().to_string();
        if address.is_empty() { return Err(SessionError::MissingAddress); }
        Ok(Self {
            id: Uuid::new_v4(),
            amount, asset, address,
            network: request.network.map(|n| n.trim().to_uppercase()).filter(|n| !n.is_empty()),
            tag_or_memo: request.tag_or_memo.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
            created_at: now,
            paid_at: None,
        })
    }

    /// Deposit history range to search: from shortly before the session was
    /// opened until `now`.
    pub fn history_window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.created_at - Duration::minutes(HISTORY_LOOKBACK_MINUTES), now)
    }

    pub fn matches(&self, deposit: &DepositRecord) -> bool {
        let address_ok = deposit.address.as_deref().unwrap_or_default().eq_ignore_ascii_case(&self.address);
        let memo_ok = match &self.tag_or_memo {
            Some(memo) => {
                let haystack = format!("{} {}", deposit.address_tag.as_deref().unwrap_or_default(), deposit.network.as_deref().unwrap_or_default());
                haystack.to_lowercase().contains(&memo.to_lowercase())
            }
            None => true,
        };
        let amount_ok = deposit.amount >= self.amount - amount_tolerance();
        address_ok && memo_ok && amount_ok && deposit.status == DepositStatus::Success
    }

    pub fn confirmations<'a>(&self, history: impl IntoIterator<Item = &'a DepositRecord>) -> Vec<Confirmation> {
        history.into_iter().filter(|d| self.matches(d)).map(Confirmation::from).collect()
    }

    pub fn is_paid(&self) -> bool { self.paid_at.is_some() }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SessionError { InvalidAmount, MissingAsset, MissingAddress }
impl std::error::Error for SessionError {}
impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAmount => write!(f, "Invalid amount"),
            Self::MissingAsset => write!(f, "Missing asset"),
            Self::MissingAddress => write!(f, "Missing deposit address"),
        }
    }
}
