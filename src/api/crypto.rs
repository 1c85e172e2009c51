use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use super::error::{ApiError, ApiResult, OptionExt};
use super::{ApiJson, AppState};
use crate::auth::AdminSession;
use crate::domain::aggregates::{Confirmation, CryptoSession, DepositRecord, SessionRequest};
use crate::domain::events::{DomainEvent, PaymentEvent};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstructions {
    pub asset: String,
    pub amount: Decimal,
    pub address: String,
    pub network: Option<String>,
    pub tag_or_memo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OpenedSession {
    pub id: Uuid,
    pub instructions: PaymentInstructions,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionStatus {
    Paid { confirmations: Vec<Confirmation> },
    Pending,
}

pub async fn open_session(State(s): State<AppState>, ApiJson(request): ApiJson<SessionRequest>) -> ApiResult<Json<OpenedSession>> {
    let session = CryptoSession::open(request, Utc::now())?;
    s.store.insert_crypto_session(&session).await?;
    tracing::info!(id = %session.id, asset = %session.asset, amount = %session.amount, "crypto session opened");
    s.events.publish(DomainEvent::Payment(PaymentEvent::CryptoSessionOpened {
        session_id: session.id, asset: session.asset.clone(), amount: session.amount,
    })).await;
    Ok(Json(OpenedSession {
        id: session.id,
        instructions: PaymentInstructions {
            asset: session.asset, amount: session.amount, address: session.address,
            network: session.network, tag_or_memo: session.tag_or_memo,
        },
    }))
}

pub async fn session_status(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<SessionStatus>> {
    let not_found = || format!("crypto session `{id}`");
    let session_id = Uuid::parse_str(&id).ok().ok_or_not_found(not_found)?;
    let session = s.store.get_crypto_session(session_id).await?.ok_or_not_found(not_found)?;

    let now = Utc::now();
    let (start, end) = session.history_window(now);
    let history = s.store.deposit_history(&session.asset, start, end).await?;
    let confirmations = session.confirmations(&history);

    if confirmations.is_empty() {
        return Ok(Json(if session.is_paid() { SessionStatus::Paid { confirmations } } else { SessionStatus::Pending }));
    }
    if s.store.mark_crypto_session_paid(session.id, now).await? {
        let tx_ids: Vec<String> = confirmations.iter().map(|c| c.tx_id.clone()).collect();
        tracing::info!(id = %session.id, ?tx_ids, "crypto session paid");
        s.events.publish(DomainEvent::Payment(PaymentEvent::CryptoSessionPaid { session_id: session.id, tx_ids })).await;
    }
    Ok(Json(SessionStatus::Paid { confirmations }))
}

/// Records a deposit seen on the exchange so pending sessions can match it.
pub async fn record_deposit(_: AdminSession, State(s): State<AppState>, ApiJson(mut deposit): ApiJson<DepositRecord>) -> ApiResult<(StatusCode, Json<DepositRecord>)> {
    deposit.tx_id = deposit.tx_id.trim().to_string();
    deposit.coin = deposit.coin.trim().to_uppercase();
    if deposit.tx_id.is_empty() { return Err(ApiError::BadRequest("Missing txId".into())); }
    if deposit.coin.is_empty() { return Err(ApiError::BadRequest("Missing coin".into())); }
    if deposit.amount.is_sign_negative() { return Err(ApiError::BadRequest("Invalid amount".into())); }
    s.store.record_deposit(&deposit).await?;
    tracing::info!(tx_id = %deposit.tx_id, coin = %deposit.coin, amount = %deposit.amount, "deposit recorded");
    Ok((StatusCode::CREATED, Json(deposit)))
}
