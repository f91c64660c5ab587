//! Roof-area and estimate calculations.
//!
//! The geometry functions are pure. [`quote`] adds the tenant-scoped material
//! rate lookup on top.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::util::round2;

/// Rate used when the caller supplies none and no material override exists.
pub const DEFAULT_RATE_PER_SQFT: f64 = 1.00;

/// Sloped roof area from the footprint and a pitch in rise-per-12.
///
/// `actual = ground * sqrt(1 + (pitch / 12)^2)`, rounded to cents.
pub fn compute_actual_area(ground_area: f64, pitch: f64) -> f64 {
    let slope = pitch / 12.0;
    round2(ground_area * (1.0 + slope * slope).sqrt())
}

pub fn estimate(actual_area: f64, rate_per_unit: f64, adjustment: f64) -> f64 {
    round2(actual_area * rate_per_unit + adjustment)
}

/// Inputs to a roof estimate.
#[derive(Debug, Clone)]
pub struct QuoteRequest<'a> {
    pub tool: Option<&'a str>,
    pub ground_area: f64,
    pub pitch: f64,
    pub rate_per_sqft: Option<f64>,
    pub adjustment: f64,
    /// Material name to narrow the override lookup
    pub material: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub tool: Option<String>,
    pub ground_area: f64,
    pub pitch: f64,
    pub actual_area: f64,
    pub estimate_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_used: Option<String>,
    pub rate_per_sqft: f64,
}

impl QuoteRequest<'_> {
    pub fn validate(&self) -> Result<()> {
        if !self.ground_area.is_finite() || self.ground_area <= 0.0 {
            return Err(AppError::validation("ground_area", "must be greater than 0"));
        }
        if !self.pitch.is_finite() || self.pitch < 0.0 {
            return Err(AppError::validation("pitch", "must be 0 or greater"));
        }
        if let Some(rate) = self.rate_per_sqft {
            if !rate.is_finite() || rate < 0.0 {
                return Err(AppError::validation("rate_per_sqft", "must be 0 or greater"));
            }
        }
        Ok(())
    }
}

/// Compute an estimate, letting a tenant's material setting for the tool
/// override the requested rate.
pub fn quote(conn: &Connection, tenant_id: Option<&str>, req: &QuoteRequest<'_>) -> Result<Quote> {
    req.validate()?;

    let mut rate = req.rate_per_sqft.unwrap_or(DEFAULT_RATE_PER_SQFT);
    let mut material_used = None;

    if let (Some(tenant_id), Some(tool)) = (tenant_id, req.tool) {
        if let Some(setting) = queries::find_material_setting(conn, tenant_id, tool, req.material)? {
            rate = setting.combined_rate();
            material_used = Some(setting.name);
        }
    }

    let actual_area = compute_actual_area(req.ground_area, req.pitch);

    Ok(Quote {
        tool: req.tool.map(String::from),
        ground_area: req.ground_area,
        pitch: req.pitch,
        actual_area,
        estimate_amount: estimate(actual_area, rate, req.adjustment),
        material_used,
        rate_per_sqft: rate,
    })
}
