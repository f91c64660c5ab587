mod license;
mod material_setting;
mod tenant;
mod tool;
mod widget_config;
mod widget_lead;

pub use license::*;
pub use material_setting::*;
pub use tenant::*;
pub use tool::*;
pub use widget_config::*;
pub use widget_lead::*;
