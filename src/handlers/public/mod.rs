mod leads;
mod license;
mod onboarding;
mod pricing;
mod widget_config;

pub use leads::*;
pub use license::*;
pub use onboarding::*;
pub use pricing::*;
pub use widget_config::*;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::db::AppState;
use crate::middleware::tenant_context;
use crate::rate_limit::{self, Tier};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Tenant-scoped public routes, without rate limiting.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/onboarding/start", post(start_onboarding))
        .route("/api/license/check", get(check_license))
        .route("/api/pricing/estimate", post(estimate_price))
        .route("/api/leads/widget", post(capture_lead))
        .route(
            "/api/widget/config",
            get(get_widget_config).put(update_widget_config),
        )
        .layer(from_fn_with_state(state, tenant_context))
        .route("/health", get(health))
}

/// Public routes with per-IP rate limits.
///
/// Onboarding calls the payment processor and gets the strict tier.
pub fn router(state: AppState, limits: RateLimitConfig) -> Router<AppState> {
    let tenant_layer = from_fn_with_state(state, tenant_context);

    let strict = Router::new()
        .route("/api/onboarding/start", post(start_onboarding))
        .layer(rate_limit::layer(Tier::Strict, &limits));

    let standard = Router::new()
        .route("/api/pricing/estimate", post(estimate_price))
        .route("/api/leads/widget", post(capture_lead))
        .route(
            "/api/widget/config",
            get(get_widget_config).put(update_widget_config),
        )
        .layer(rate_limit::layer(Tier::Standard, &limits));

    let relaxed = Router::new()
        .route("/api/license/check", get(check_license))
        .layer(rate_limit::layer(Tier::Relaxed, &limits));

    let health = Router::new()
        .route("/health", get(health))
        .layer(rate_limit::layer(Tier::Relaxed, &limits));

    Router::new()
        .merge(strict)
        .merge(standard)
        .merge(relaxed)
        .layer(tenant_layer)
        .merge(health)
}
