//! Inbound payment callbacks.
//!
//! The processor delivers at least once and in no particular order. A
//! callback is applied as "the latest terminal status wins", and applying the
//! same status twice changes nothing.

use rusqlite::Connection;
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::error::{msg, AppError, Result};
use crate::licensing::{self, TransitionOutcome};

use super::TxRef;

/// Processor statuses that mean the customer paid.
const SUCCESS_STATUSES: &[&str] = &["successful", "success", "completed"];

/// Accepts both the flat `{status, tx_ref}` form and the
/// `{event, data: {status, tx_ref}}` envelope.
#[derive(Debug, Deserialize)]
struct RawCallback {
    status: Option<String>,
    tx_ref: Option<String>,
    data: Option<RawCallbackData>,
}

#[derive(Debug, Deserialize)]
struct RawCallbackData {
    status: Option<String>,
    tx_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCallback {
    pub tx_ref: TxRef,
    pub status: String,
}

impl PaymentCallback {
    pub fn is_success(&self) -> bool {
        SUCCESS_STATUSES
            .iter()
            .any(|s| self.status.eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Confirmed(TransitionOutcome),
    Rejected(TransitionOutcome),
}

/// Validate the callback body. Nothing is written before this succeeds.
pub fn parse_callback(body: &[u8]) -> Result<PaymentCallback> {
    let raw: RawCallback = serde_json::from_slice(body)
        .map_err(|e| AppError::MalformedCallback(format!("invalid JSON payload: {}", e)))?;

    let (status, tx_ref) = match raw.data {
        Some(data) if raw.tx_ref.is_none() => (data.status.or(raw.status), data.tx_ref),
        _ => (raw.status, raw.tx_ref),
    };

    let tx_ref = tx_ref
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| AppError::MalformedCallback(msg::MALFORMED_TX_REF.to_string()))?;
    let tx_ref = TxRef::parse(&tx_ref)?;

    let status = status
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::MalformedCallback("status is required".to_string()))?;

    Ok(PaymentCallback { tx_ref, status })
}

/// Drive the license lifecycle from a parsed callback.
///
/// Any status other than a success status cancels the license.
pub fn apply_callback(conn: &mut Connection, callback: &PaymentCallback) -> Result<WebhookOutcome> {
    let TxRef {
        tenant_id,
        tool_slug,
        ..
    } = &callback.tx_ref;

    if callback.is_success() {
        licensing::confirm(conn, tenant_id, tool_slug).map(WebhookOutcome::Confirmed)
    } else {
        tracing::info!(
            "Payment status {:?} for tx_ref={} treated as rejection",
            callback.status,
            callback.tx_ref
        );
        licensing::reject(conn, tenant_id, tool_slug).map(WebhookOutcome::Rejected)
    }
}

/// Compare the `verif-hash` header against the configured secret.
/// Passes when no secret is configured.
pub fn verify_webhook_hash(expected: Option<&str>, provided: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => {
            let provided = provided.unwrap_or("");
            expected.len() == provided.len()
                && bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
        }
    }
}
