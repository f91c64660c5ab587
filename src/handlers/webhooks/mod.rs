mod payment;

pub use payment::*;

use axum::{routing::post, Router};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/payments/webhook", post(handle_payment_webhook))
}
