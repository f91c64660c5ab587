use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LicenseStatus {
    Trial,
    Pending,
    Active,
    Expired,
    Canceled,
}

/// A tenant's subscription to one tool. At most one per (tenant, tool).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub id: String,
    pub tenant_id: String,
    pub tool_id: String,
    pub status: LicenseStatus,
    pub plan: String,
    pub seats: i64,
    pub starts_at: Option<i64>,
    pub expires_at: Option<i64>,
    /// Coupon code accepted when the license was created
    pub applied_coupon_code: Option<String>,
    /// Set once the applied coupon has been counted against the tool's usage limit
    pub coupon_redeemed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct CreateLicense {
    pub status: LicenseStatus,
    pub applied_coupon_code: Option<String>,
}
