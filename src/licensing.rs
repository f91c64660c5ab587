//! License lifecycle: find-or-create at onboarding, then confirm or reject
//! when the payment processor reports back.

use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::error::Result;
use crate::models::{CreateLicense, License};

/// Result of [`create_or_get`].
#[derive(Debug, Clone)]
pub struct LicenseLookup {
    pub license: License,
    /// False when an existing row (possibly from a concurrent request) was returned
    pub created: bool,
}

/// Return the tenant's license for the tool, creating it if absent.
///
/// The UNIQUE(tenant_id, tool_id) index arbitrates races: the loser of a
/// concurrent insert refetches the winner's row instead of failing.
pub fn create_or_get(
    conn: &Connection,
    tenant_id: &str,
    tool_id: &str,
    input: &CreateLicense,
) -> Result<LicenseLookup> {
    if let Some(license) = queries::get_license_for_tenant_tool(conn, tenant_id, tool_id)? {
        return Ok(LicenseLookup {
            license,
            created: false,
        });
    }

    match queries::insert_license(conn, tenant_id, tool_id, input) {
        Ok(license) => Ok(LicenseLookup {
            license,
            created: true,
        }),
        Err(e) if e.is_constraint_violation() => {
            tracing::debug!(
                "License for tenant {} tool {} created concurrently, refetching",
                tenant_id,
                tool_id
            );
            let license = queries::get_license_for_tenant_tool(conn, tenant_id, tool_id)?
                .ok_or(e)?;
            Ok(LicenseLookup {
                license,
                created: false,
            })
        }
        Err(e) => Err(e),
    }
}

/// Make sure a reused license carries the coupon about to be discounted.
///
/// A code already on the license is kept as is. Otherwise the code is
/// recorded only while the license is unpaid and its coupon uncounted, so
/// `confirm` will count the redemption. Returns false when the discount
/// must not be granted.
pub fn attach_coupon(conn: &Connection, license: &License, code: &str) -> Result<bool> {
    if license.applied_coupon_code.as_deref() == Some(code) {
        return Ok(!license.coupon_redeemed);
    }
    queries::attach_coupon_code(conn, &license.id, code)
}

/// What a confirm or reject changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Licenses matching (tenant, tool slug)
    pub matched: usize,
    /// Licenses whose status actually changed
    pub changed: usize,
    /// Coupon redemptions counted against the tool's usage limit
    pub coupons_counted: usize,
}

/// Activate the tenant's license(s) for the tool and count its coupon once.
///
/// Redelivery is a no-op: the status update skips active rows, and the
/// coupon is only counted while the license's `coupon_redeemed` flag is unset.
pub fn confirm(conn: &mut Connection, tenant_id: &str, tool_slug: &str) -> Result<TransitionOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let licenses = queries::list_licenses_by_tool_slug(&tx, tenant_id, tool_slug)?;
    let tool = queries::get_tool_by_slug(&tx, tool_slug)?;
    let mut outcome = TransitionOutcome {
        matched: licenses.len(),
        ..Default::default()
    };

    for license in &licenses {
        if queries::activate_license(&tx, &license.id)? {
            outcome.changed += 1;
        }

        let current_code = tool
            .as_ref()
            .and_then(|t| t.coupon.as_ref())
            .map(|c| c.code.as_str());
        let applied_code = license.applied_coupon_code.as_deref();

        if let (Some(applied), Some(current)) = (applied_code, current_code) {
            if applied == current && queries::mark_coupon_redeemed(&tx, &license.id)? {
                if queries::increment_coupon_usage(&tx, &license.tool_id, current)? {
                    outcome.coupons_counted += 1;
                } else {
                    tracing::warn!(
                        "Coupon {} on tool {} already at its usage limit, license {} not counted",
                        current,
                        tool_slug,
                        license.id
                    );
                }
            }
        }
    }

    tx.commit()?;

    tracing::info!(
        "Confirmed payment: tenant={}, tool={}, matched={}, activated={}, coupons_counted={}",
        tenant_id,
        tool_slug,
        outcome.matched,
        outcome.changed,
        outcome.coupons_counted
    );

    Ok(outcome)
}

/// Cancel the tenant's license(s) for the tool. Coupon usage is untouched.
pub fn reject(conn: &mut Connection, tenant_id: &str, tool_slug: &str) -> Result<TransitionOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let licenses = queries::list_licenses_by_tool_slug(&tx, tenant_id, tool_slug)?;
    let mut outcome = TransitionOutcome {
        matched: licenses.len(),
        ..Default::default()
    };

    for license in &licenses {
        if queries::cancel_license(&tx, &license.id)? {
            outcome.changed += 1;
        }
    }

    tx.commit()?;

    tracing::info!(
        "Rejected payment: tenant={}, tool={}, matched={}, canceled={}",
        tenant_id,
        tool_slug,
        outcome.matched,
        outcome.changed
    );

    Ok(outcome)
}
