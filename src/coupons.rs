//! Coupon eligibility.
//!
//! Evaluation only quotes a discount. Usage is counted by the license
//! lifecycle once payment is confirmed.

use chrono::NaiveDate;

use crate::models::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouponDecision {
    pub discount_cents: i64,
    pub applied: bool,
}

impl CouponDecision {
    pub const REJECTED: CouponDecision = CouponDecision {
        discount_cents: 0,
        applied: false,
    };
}

/// Decide whether `code` earns a discount on `tool` for `tenant_id` on `today`.
///
/// Checks run in order and the first failure rejects: exact code match,
/// validity window, tenant restriction, usage limit.
pub fn evaluate(
    tool: &Tool,
    tenant_id: Option<&str>,
    code: Option<&str>,
    today: NaiveDate,
) -> CouponDecision {
    let Some(coupon) = tool.coupon.as_ref() else {
        return CouponDecision::REJECTED;
    };
    let code = code.unwrap_or("");
    if code.is_empty() || code != coupon.code {
        return CouponDecision::REJECTED;
    }
    if coupon.starts_on.is_some_and(|start| today < start) {
        return CouponDecision::REJECTED;
    }
    if coupon.ends_on.is_some_and(|end| today > end) {
        return CouponDecision::REJECTED;
    }
    if let Some(restricted_to) = coupon.tenant_id.as_deref() {
        if tenant_id != Some(restricted_to) {
            return CouponDecision::REJECTED;
        }
    }
    if coupon.is_exhausted() {
        return CouponDecision::REJECTED;
    }

    let price = tool.price_cents.max(0);
    let discount = (price * coupon.percent_off / 100).clamp(0, price);

    CouponDecision {
        discount_cents: discount,
        applied: true,
    }
}
