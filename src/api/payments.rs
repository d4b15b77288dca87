//! Signed payment notifications.
//!
//! A payment provider (or the store's reconciliation job) posts
//! `{orderId, paymentStatus, utrNumber?}` with an `x-webhook-signature`
//! header holding hex(HMAC-SHA256(secret, raw body)).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::orders::{parse_order_id, settle_payment, PaymentUpdate};
use super::{ApiError, ApiResult, AppState};
use crate::domain::aggregates::{Order, PaymentStatus};

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotification {
    pub order_id: String,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utr_number: Option<String>,
}

/// Hex signature of `body` under `secret`.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex signature.
pub fn verify(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else { return false };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else { return false };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

pub async fn webhook(State(s): State<AppState>, headers: HeaderMap, body: Bytes) -> ApiResult<Json<Order>> {
    let Some(secret) = s.config.webhook_secret.as_ref() else {
        return Err(ApiError::Unavailable("Payment webhook is not configured".into()));
    };
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();
    if !verify(secret.expose_secret().as_bytes(), &body, signature) {
        tracing::warn!("payment webhook rejected: bad signature");
        return Err(ApiError::Unauthorized("Invalid signature".into()));
    }
    let note: PaymentNotification = serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(format!("Invalid notification: {e}")))?;
    let id = parse_order_id(&note.order_id)?;
    tracing::info!(order_id = %id, status = %note.payment_status, "payment notification");
    let order = settle_payment(&s, id, PaymentUpdate { payment_status: note.payment_status, utr_number: note.utr_number }).await?;
    Ok(Json(order))
}
