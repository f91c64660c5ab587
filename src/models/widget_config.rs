use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WidgetTheme {
    /// Frosted glass (light)
    Frosted,
    /// Smoked glass (dark)
    Smoked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub primary_color: String,
    pub secondary_color: String,
    pub theme: WidgetTheme,
    pub logo_url: String,
    pub mark_text: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            primary_color: "#0A0F1A".to_string(),
            secondary_color: "#1F6BFF".to_string(),
            theme: WidgetTheme::Frosted,
            logo_url: String::new(),
            mark_text: "neX".to_string(),
        }
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateWidgetConfig {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub theme: Option<WidgetTheme>,
    pub logo_url: Option<String>,
    pub mark_text: Option<String>,
}
