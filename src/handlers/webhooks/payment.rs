use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;

use crate::db::AppState;
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::payments::{apply_callback, parse_callback, verify_webhook_hash, WebhookOutcome};

/// Header the processor uses to echo the shared webhook secret.
pub const WEBHOOK_HASH_HEADER: &str = "verif-hash";

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    /// "confirmed" or "rejected"
    pub outcome: &'static str,
    pub licenses_matched: usize,
    pub licenses_updated: usize,
}

/// POST /api/payments/webhook
///
/// Delivery is at least once. Replays return 200 and change nothing.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    let provided = headers
        .get(WEBHOOK_HASH_HEADER)
        .and_then(|v| v.to_str().ok());
    if !verify_webhook_hash(state.webhook_hash.as_deref(), provided) {
        tracing::warn!("Payment webhook rejected: bad {} header", WEBHOOK_HASH_HEADER);
        return Err(AppError::Unauthorized(msg::INVALID_WEBHOOK_HASH.into()));
    }

    let callback = parse_callback(&body)?;

    let mut conn = state.db.get()?;
    let (outcome, transition) = match apply_callback(&mut conn, &callback)? {
        WebhookOutcome::Confirmed(t) => ("confirmed", t),
        WebhookOutcome::Rejected(t) => ("rejected", t),
    };

    if transition.matched == 0 {
        tracing::warn!(
            "Payment webhook for tx_ref={} matched no license",
            callback.tx_ref
        );
    }

    Ok(Json(WebhookResponse {
        status: "ok",
        outcome,
        licenses_matched: transition.matched,
        licenses_updated: transition.changed,
    }))
}
