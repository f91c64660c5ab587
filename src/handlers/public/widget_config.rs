use axum::extract::State;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::middleware::TenantContext;
use crate::models::{UpdateWidgetConfig, WidgetConfig};

const MAX_MARK_TEXT_LEN: usize = 12;

fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

fn validate(input: &UpdateWidgetConfig) -> Result<()> {
    for (field, value) in [
        ("primary_color", &input.primary_color),
        ("secondary_color", &input.secondary_color),
    ] {
        if let Some(color) = value {
            if !is_hex_color(color) {
                return Err(AppError::validation(field, "must be a hex color like #1F6BFF"));
            }
        }
    }
    if let Some(ref mark) = input.mark_text {
        if mark.trim().is_empty() || mark.chars().count() > MAX_MARK_TEXT_LEN {
            return Err(AppError::validation(
                "mark_text",
                format!("must be 1-{} characters", MAX_MARK_TEXT_LEN),
            ));
        }
    }
    Ok(())
}

/// GET /api/widget/config
///
/// Anonymous requests get the default palette.
pub async fn get_widget_config(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<WidgetConfig>> {
    let Some(tenant_id) = ctx.tenant_id() else {
        return Ok(Json(WidgetConfig::default()));
    };

    let conn = state.db.get()?;
    let config = queries::get_or_create_widget_config(&conn, tenant_id)?;
    Ok(Json(config))
}

/// PUT /api/widget/config
pub async fn update_widget_config(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(request): Json<UpdateWidgetConfig>,
) -> Result<Json<WidgetConfig>> {
    let tenant = ctx.require(msg::TENANT_NOT_FOUND)?;
    validate(&request)?;

    let conn = state.db.get()?;
    let config = queries::update_widget_config(&conn, &tenant.id, &request)?;

    tracing::info!("Updated widget config for tenant {}", tenant.slug);
    Ok(Json(config))
}
