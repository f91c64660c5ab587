//! "Start subscription": resolve or register the tenant, quote the coupon,
//! find-or-create the license and hand back a checkout link.

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::coupons::{self, CouponDecision};
use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::licensing;
use crate::models::{CreateLicense, CreateTenant, LicenseStatus, Tenant};
use crate::payments::CheckoutLink;
use crate::util::looks_like_email;

#[derive(Debug, Clone, Deserialize)]
pub struct StartSubscription {
    /// Tool slug
    pub tool: String,
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub existing_tenant_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    pub email: String,
    /// Accepted for form compatibility; accounts are managed elsewhere.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingResult {
    pub tenant_id: String,
    pub license_id: String,
    pub status: LicenseStatus,
    pub payment_url: String,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Look up the named existing tenant, or register a new one.
fn resolve_or_create_tenant(conn: &Connection, req: &StartSubscription) -> Result<Tenant> {
    if let Some(id) = non_blank(&req.existing_tenant_id) {
        return queries::get_tenant_by_id(conn, id)?.or_not_found(msg::TENANT_NOT_FOUND);
    }

    let name = non_blank(&req.tenant_name)
        .ok_or_else(|| AppError::validation("tenant_name", "is required for a new tenant"))?;
    let full_name = non_blank(&req.full_name)
        .ok_or_else(|| AppError::validation("full_name", "is required for a new tenant"))?;

    let tenant = queries::create_tenant(
        conn,
        &CreateTenant {
            name: name.to_string(),
            contact_name: Some(full_name.to_string()),
            contact_email: Some(req.email.trim().to_string()),
        },
    )?;
    tracing::info!("Registered tenant {} ({})", tenant.slug, tenant.id);
    Ok(tenant)
}

pub async fn start(state: &AppState, req: &StartSubscription) -> Result<OnboardingResult> {
    let email = req.email.trim();
    if !looks_like_email(email) {
        return Err(AppError::validation("email", "must be a valid email address"));
    }

    // The pooled connection is released before the processor call.
    let (tenant, tool, license, decision) = {
        let conn = state.db.get()?;

        let tool = queries::get_active_tool_by_slug(&conn, req.tool.trim())?
            .or_not_found(msg::TOOL_NOT_FOUND)?;
        let tenant = resolve_or_create_tenant(&conn, req)?;

        let code = non_blank(&req.coupon_code);
        let mut decision = coupons::evaluate(&tool, Some(&tenant.id), code, Utc::now().date_naive());

        let lookup = licensing::create_or_get(
            &conn,
            &tenant.id,
            &tool.id,
            &CreateLicense {
                status: LicenseStatus::Pending,
                applied_coupon_code: code.filter(|_| decision.applied).map(String::from),
            },
        )?;
        if !lookup.created {
            tracing::debug!(
                "Reusing license {} for tenant {} tool {}",
                lookup.license.id,
                tenant.id,
                tool.slug
            );
            // The discount is only granted if confirm will count it
            if let Some(code) = code.filter(|_| decision.applied) {
                if !licensing::attach_coupon(&conn, &lookup.license, code)? {
                    tracing::info!(
                        "Coupon {} not applicable to license {}, checkout at full price",
                        code,
                        lookup.license.id
                    );
                    decision = CouponDecision::REJECTED;
                }
            }
        }

        (tenant, tool, lookup.license, decision)
    };

    let link = state
        .payments
        .create_checkout_link(&tenant, &tool, email, decision.discount_cents)
        .await;
    if let CheckoutLink::Degraded { reason, tx_ref, .. } = &link {
        tracing::warn!(
            "Onboarding for tenant {} continues with placeholder link {}: {}",
            tenant.id,
            tx_ref,
            reason
        );
    }

    Ok(OnboardingResult {
        tenant_id: tenant.id,
        license_id: license.id,
        // A fresh checkout is always awaiting payment
        status: LicenseStatus::Pending,
        payment_url: link.into_url(),
    })
}
