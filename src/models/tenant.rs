use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TenantPlan {
    Freemium,
    Standard,
    Pro,
}

/// An isolated customer organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// 32 hex chars, no dashes (the id is the first segment of payment tx_refs)
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Routing domain matched against the request host
    pub domain: Option<String>,
    pub plan: TenantPlan,
    /// Receives a POST for every widget lead (best effort)
    pub webhook_url: Option<String>,
    pub leads_quota: i64,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct CreateTenant {
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
}
