use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::extractors::{Json, Query};
use crate::middleware::TenantContext;

#[derive(Debug, Deserialize)]
pub struct LicenseCheckQuery {
    #[serde(default)]
    pub tool: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LicenseCheckResponse {
    pub licensed: bool,
}

/// GET /api/license/check?tool={slug}
///
/// Answers `false` rather than failing when the tenant or tool is missing.
pub async fn check_license(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<LicenseCheckQuery>,
) -> Json<LicenseCheckResponse> {
    let tool = query.tool.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let licensed = match (ctx.tenant_id(), tool) {
        (Some(tenant_id), Some(tool)) => match state.db.get() {
            Ok(conn) => queries::has_active_license(&conn, tenant_id, tool).unwrap_or_else(|e| {
                tracing::error!("License check failed for tenant {}: {}", tenant_id, e);
                false
            }),
            Err(e) => {
                tracing::error!("DB connection error during license check: {}", e);
                false
            }
        },
        _ => false,
    };

    Json(LicenseCheckResponse { licensed })
}
