use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetLead {
    pub id: String,
    pub tenant_id: String,
    pub tool_id: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub ground_area: f64,
    pub pitch: f64,
    pub actual_area: f64,
    pub estimate_amount: f64,
    pub source_url: String,
    /// Hidden from the tenant until they upgrade past the freemium quota
    pub locked_for_quota: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWidgetLead {
    /// Tool slug
    #[serde(default)]
    pub tool: Option<String>,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub ground_area: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub estimate_amount: f64,
    #[serde(default)]
    pub source_url: String,
}
