use axum::extract::State;
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::{Json, Query};
use crate::middleware::TenantContext;
use crate::pricing::{self, Quote, QuoteRequest};

#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    #[serde(default)]
    pub tool: Option<String>,
    /// `true` lets preview flows skip the license check
    #[serde(default)]
    pub sandbox: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
}

impl PricingQuery {
    fn is_sandbox(&self) -> bool {
        self.sandbox
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
    }
}

#[derive(Debug, Deserialize)]
pub struct PricingRequest {
    #[serde(default)]
    pub tool: Option<String>,
    pub ground_area: f64,
    pub pitch: f64,
    #[serde(default)]
    pub rate_per_sqft: Option<f64>,
    #[serde(default)]
    pub adjustment: f64,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// POST /api/pricing/estimate
///
/// Requires an active license for the tool unless `sandbox=true`.
pub async fn estimate_price(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<PricingQuery>,
    Json(request): Json<PricingRequest>,
) -> Result<Json<Quote>> {
    let tool = non_blank(request.tool.as_deref()).or(non_blank(query.tool.as_deref()));
    let conn = state.db.get()?;

    if !query.is_sandbox() {
        let licensed = match (ctx.tenant_id(), tool) {
            (Some(tenant_id), Some(tool)) => queries::has_active_license(&conn, tenant_id, tool)?,
            _ => false,
        };
        if !licensed {
            return Err(AppError::Forbidden(msg::LICENSE_REQUIRED.into()));
        }
    }

    let quote = pricing::quote(
        &conn,
        ctx.tenant_id(),
        &QuoteRequest {
            tool,
            ground_area: request.ground_area,
            pitch: request.pitch,
            rate_per_sqft: request.rate_per_sqft,
            adjustment: request.adjustment,
            material: non_blank(query.material.as_deref()),
        },
    )?;

    Ok(Json(quote))
}
