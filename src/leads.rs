//! Widget lead capture and the tenant's lead-notification webhook.
//!
//! Notifications are best effort: sent from a background task with a couple of
//! quick retries, and failures never reach the visitor who submitted the lead.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use reqwest::Client;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::db::queries::{self, LeadFigures};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::models::{CreateWidgetLead, Tenant, TenantPlan, WidgetLead};
use crate::pricing::compute_actual_area;
use crate::util::looks_like_email;

/// Retry delays in milliseconds for lead notifications.
const NOTIFY_RETRY_DELAYS: &[u64] = &[100, 200];

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
pub struct LeadNotification {
    /// Always "lead.created"
    pub event: String,
    pub tenant_id: String,
    pub tenant_slug: String,
    pub lead: WidgetLead,
}

impl LeadNotification {
    pub fn new(tenant: &Tenant, lead: WidgetLead) -> Self {
        Self {
            event: "lead.created".to_string(),
            tenant_id: tenant.id.clone(),
            tenant_slug: tenant.slug.clone(),
            lead,
        }
    }
}

fn validate(input: &CreateWidgetLead) -> Result<()> {
    if input.full_name.trim().is_empty() {
        return Err(AppError::validation("full_name", "is required"));
    }
    if !looks_like_email(&input.email) {
        return Err(AppError::validation("email", "must be a valid email address"));
    }
    if input.address.trim().is_empty() {
        return Err(AppError::validation("address", "is required"));
    }
    if !input.ground_area.is_finite() || input.ground_area < 0.0 {
        return Err(AppError::validation("ground_area", "must be 0 or greater"));
    }
    if !input.pitch.is_finite() || input.pitch < 0.0 {
        return Err(AppError::validation("pitch", "must be 0 or greater"));
    }
    Ok(())
}

/// Store a lead submitted through the tenant's widget.
///
/// Freemium tenants past their lead quota still get the lead, flagged as
/// locked until they upgrade. The quota count and the insert share one
/// immediate transaction so concurrent leads cannot both slip under it.
pub fn capture_widget_lead(
    conn: &mut Connection,
    tenant: &Tenant,
    input: &CreateWidgetLead,
) -> Result<WidgetLead> {
    validate(input)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let tool_id = match input.tool.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => Some(
            queries::get_tool_by_slug(&tx, slug)?
                .or_not_found(msg::TOOL_NOT_FOUND)?
                .id,
        ),
        None => None,
    };

    let actual_area = if input.ground_area > 0.0 {
        compute_actual_area(input.ground_area, input.pitch)
    } else {
        0.0
    };

    let locked_for_quota = tenant.plan == TenantPlan::Freemium
        && queries::count_widget_leads(&tx, &tenant.id)? >= tenant.leads_quota;

    let lead = queries::create_widget_lead(
        &tx,
        &tenant.id,
        tool_id.as_deref(),
        input,
        LeadFigures {
            actual_area,
            locked_for_quota,
        },
    )?;

    tx.commit()?;

    tracing::info!(
        "Captured widget lead {} for tenant {} (locked_for_quota={})",
        lead.id,
        tenant.slug,
        lead.locked_for_quota
    );

    Ok(lead)
}

/// Spawn a fire-and-forget lead notification to the tenant's webhook.
///
/// No-op when the tenant has no webhook URL. Panics in the task are logged.
pub fn spawn_lead_notification(client: Client, webhook_url: Option<String>, event: LeadNotification) {
    if let Some(url) = webhook_url.filter(|u| !u.trim().is_empty()) {
        let lead_id = event.lead.id.clone();
        tokio::spawn(
            AssertUnwindSafe(async move {
                send_lead_notification(&client, &url, &event).await;
            })
            .catch_unwind()
            .map(move |result| {
                if let Err(panic) = result {
                    let panic_msg = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!(
                        "Lead notification task panicked for lead '{}': {}",
                        lead_id,
                        panic_msg
                    );
                }
            }),
        );
    }
}

/// Returns true once the webhook accepted the event.
pub async fn send_lead_notification(client: &Client, url: &str, event: &LeadNotification) -> bool {
    for (attempt, delay_ms) in std::iter::once(&0u64)
        .chain(NOTIFY_RETRY_DELAYS.iter())
        .enumerate()
    {
        if attempt > 0 {
            tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
        }

        match client
            .post(url)
            .json(event)
            .timeout(NOTIFY_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                if attempt > 0 {
                    tracing::debug!("Lead webhook succeeded after {} retries", attempt);
                }
                return true;
            }
            Ok(resp) => {
                tracing::debug!("Lead webhook returned {}", resp.status());
            }
            Err(e) => {
                tracing::debug!("Lead webhook failed: {}", e);
            }
        }
    }

    tracing::warn!(
        "Lead webhook for lead {} failed after {} attempts",
        event.lead.id,
        NOTIFY_RETRY_DELAYS.len() + 1
    );
    false
}
