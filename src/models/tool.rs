use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single coupon definition attached to a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    /// Whole percent, 0-100
    pub percent_off: i64,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    /// 0 = unlimited
    pub usage_limit: i64,
    pub usage_count: i64,
    /// When set, only this tenant may redeem the coupon
    pub tenant_id: Option<String>,
}

impl Coupon {
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit > 0 && self.usage_count >= self.usage_limit
    }
}

/// A licensable catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    pub slug: String,
    pub name: String,
    /// Monthly price in cents
    pub price_cents: i64,
    pub currency: String,
    pub is_active: bool,
    pub coupon: Option<Coupon>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct CreateTool {
    pub slug: String,
    pub name: String,
    pub price_cents: i64,
    pub currency: String,
    pub coupon: Option<Coupon>,
}
