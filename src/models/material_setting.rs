use serde::{Deserialize, Serialize};

/// Tenant-specific material and labor rates for a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialSetting {
    pub id: String,
    pub tenant_id: String,
    pub tool_id: Option<String>,
    pub name: String,
    pub material_rate: f64,
    pub labor_rate: f64,
}

impl MaterialSetting {
    pub fn combined_rate(&self) -> f64 {
        self.material_rate + self.labor_rate
    }
}

#[derive(Debug, Clone)]
pub struct CreateMaterialSetting {
    pub tool_id: Option<String>,
    pub name: String,
    pub material_rate: f64,
    pub labor_rate: f64,
}
