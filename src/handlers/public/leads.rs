use axum::{extract::State, http::StatusCode};

use crate::db::AppState;
use crate::error::{msg, Result};
use crate::extractors::Json;
use crate::leads::{capture_widget_lead, spawn_lead_notification, LeadNotification};
use crate::middleware::TenantContext;
use crate::models::{CreateWidgetLead, WidgetLead};

/// POST /api/leads/widget
pub async fn capture_lead(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(request): Json<CreateWidgetLead>,
) -> Result<(StatusCode, Json<WidgetLead>)> {
    let tenant = ctx.require(msg::WIDGET_TENANT_NOT_FOUND)?;

    let lead = {
        let mut conn = state.db.get()?;
        capture_widget_lead(&mut conn, tenant, &request)?
    };

    spawn_lead_notification(
        state.http_client.clone(),
        tenant.webhook_url.clone(),
        LeadNotification::new(tenant, lead.clone()),
    );

    Ok((StatusCode::CREATED, Json(lead)))
}
