//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! Models implement `FromRow` to describe how they are built from a row
//! selected with the matching `*_COLS` constant.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const TENANT_COLS: &str = "id, name, slug, domain, plan, webhook_url, leads_quota, contact_name, contact_email, created_at, updated_at";

pub const TOOL_COLS: &str = "id, slug, name, price_cents, currency, is_active, coupon_code, coupon_percent_off, coupon_starts_on, coupon_ends_on, coupon_usage_limit, coupon_usage_count, coupon_tenant_id, created_at";

pub const LICENSE_COLS: &str = "id, tenant_id, tool_id, status, plan, seats, starts_at, expires_at, applied_coupon_code, coupon_redeemed, created_at, updated_at";

/// License columns qualified with the `l` alias, for joins against tools.
pub const LICENSE_COLS_L: &str = "l.id, l.tenant_id, l.tool_id, l.status, l.plan, l.seats, l.starts_at, l.expires_at, l.applied_coupon_code, l.coupon_redeemed, l.created_at, l.updated_at";

pub const MATERIAL_SETTING_COLS: &str =
    "m.id, m.tenant_id, m.tool_id, m.name, m.material_rate, m.labor_rate";

pub const WIDGET_LEAD_COLS: &str = "id, tenant_id, tool_id, full_name, email, phone, address, ground_area, pitch, actual_area, estimate_amount, source_url, locked_for_quota, created_at";

pub const WIDGET_CONFIG_COLS: &str =
    "primary_color, secondary_color, theme, logo_url, mark_text";

// ============ FromRow Implementations ============

impl FromRow for Tenant {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Tenant {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            domain: row.get(3)?,
            plan: parse_enum(row, 4, "plan")?,
            webhook_url: row.get(5)?,
            leads_quota: row.get(6)?,
            contact_name: row.get(7)?,
            contact_email: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl FromRow for Tool {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // A tool without a code has no coupon, whatever the other columns say
        let coupon = match row.get::<_, Option<String>>(6)? {
            Some(code) if !code.is_empty() => Some(Coupon {
                code,
                percent_off: row.get(7)?,
                starts_on: row.get(8)?,
                ends_on: row.get(9)?,
                usage_limit: row.get(10)?,
                usage_count: row.get(11)?,
                tenant_id: row.get(12)?,
            }),
            _ => None,
        };
        Ok(Tool {
            id: row.get(0)?,
            slug: row.get(1)?,
            name: row.get(2)?,
            price_cents: row.get(3)?,
            currency: row.get(4)?,
            is_active: row.get(5)?,
            coupon,
            created_at: row.get(13)?,
        })
    }
}

impl FromRow for License {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(License {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            tool_id: row.get(2)?,
            status: parse_enum(row, 3, "status")?,
            plan: row.get(4)?,
            seats: row.get(5)?,
            starts_at: row.get(6)?,
            expires_at: row.get(7)?,
            applied_coupon_code: row.get(8)?,
            coupon_redeemed: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

impl FromRow for MaterialSetting {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(MaterialSetting {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            tool_id: row.get(2)?,
            name: row.get(3)?,
            material_rate: row.get(4)?,
            labor_rate: row.get(5)?,
        })
    }
}

impl FromRow for WidgetLead {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(WidgetLead {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            tool_id: row.get(2)?,
            full_name: row.get(3)?,
            email: row.get(4)?,
            phone: row.get(5)?,
            address: row.get(6)?,
            ground_area: row.get(7)?,
            pitch: row.get(8)?,
            actual_area: row.get(9)?,
            estimate_amount: row.get(10)?,
            source_url: row.get(11)?,
            locked_for_quota: row.get(12)?,
            created_at: row.get(13)?,
        })
    }
}

impl FromRow for WidgetConfig {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(WidgetConfig {
            primary_color: row.get(0)?,
            secondary_color: row.get(1)?,
            theme: parse_enum(row, 2, "theme")?,
            logo_url: row.get(3)?,
            mark_text: row.get(4)?,
        })
    }
}
