use chrono::Utc;
use rusqlite::{params, types::Value, Connection, ToSql};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;
use crate::util::{slug_candidate, slugify};

use super::from_row::{
    query_all, query_one, FromRow, LICENSE_COLS, LICENSE_COLS_L, MATERIAL_SETTING_COLS,
    TENANT_COLS, TOOL_COLS, WIDGET_CONFIG_COLS, WIDGET_LEAD_COLS,
};

/// Give up on slug disambiguation after this many suffixes.
const MAX_SLUG_ATTEMPTS: u32 = 1000;

pub fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Tenant ids are the first segment of payment tx_refs, so they never contain `-`.
fn gen_tenant_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Builder for dynamic UPDATE statements with optional fields.
struct UpdateBuilder {
    table: &'static str,
    key_column: &'static str,
    key: String,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, key_column: &'static str, key: &str) -> Self {
        Self {
            table,
            key_column,
            key: key.to_string(),
            fields: Vec::new(),
        }
    }

    fn set_opt<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.fields.push((column, v.into()));
        }
        self
    }

    /// Execute the update and return the updated row. None if no row matched.
    fn execute_returning<T: FromRow>(
        mut self,
        conn: &Connection,
        returning_cols: &str,
    ) -> Result<Option<T>> {
        self.fields.push(("updated_at", now().into()));
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.key.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ? RETURNING {}",
            self.table,
            sets.join(", "),
            self.key_column,
            returning_cols
        );
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
        query_one(conn, &sql, &params)
    }
}

// ============ Tenants ============

/// Create a tenant with a unique slug derived from its name.
///
/// Tries `slug`, `slug-2`, `slug-3`, ... and relies on the UNIQUE index to
/// settle races between concurrent registrations of the same name.
pub fn create_tenant(conn: &Connection, input: &CreateTenant) -> Result<Tenant> {
    let base = slugify(&input.name);
    if base.is_empty() {
        return Err(AppError::validation(
            "tenant_name",
            "must contain at least one letter or digit",
        ));
    }

    let now = now();
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let id = gen_tenant_id();
        let slug = slug_candidate(&base, attempt);

        let inserted = conn.execute(
            "INSERT INTO tenants (id, name, slug, plan, leads_quota, contact_name, contact_email, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'freemium', 3, ?4, ?5, ?6, ?6)",
            params![&id, &input.name, &slug, &input.contact_name, &input.contact_email, now],
        );

        match inserted.map_err(AppError::from) {
            Ok(_) => {
                return Ok(Tenant {
                    id,
                    name: input.name.clone(),
                    slug,
                    domain: None,
                    plan: TenantPlan::Freemium,
                    webhook_url: None,
                    leads_quota: 3,
                    contact_name: input.contact_name.clone(),
                    contact_email: input.contact_email.clone(),
                    created_at: now,
                    updated_at: now,
                });
            }
            Err(e) if e.is_constraint_violation() => {
                tracing::debug!("Tenant slug {} taken, trying next suffix", slug);
            }
            Err(e) => return Err(e),
        }
    }

    Err(AppError::Internal(format!(
        "No free slug for tenant name {:?} after {} attempts",
        input.name, MAX_SLUG_ATTEMPTS
    )))
}

pub fn get_tenant_by_id(conn: &Connection, id: &str) -> Result<Option<Tenant>> {
    query_one(
        conn,
        &format!("SELECT {} FROM tenants WHERE id = ?1", TENANT_COLS),
        &[&id],
    )
}

/// First tenant (oldest) whose bound domain equals `host`, ignoring case.
pub fn get_tenant_by_domain(conn: &Connection, host: &str) -> Result<Option<Tenant>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM tenants WHERE domain = ?1 COLLATE NOCASE
             ORDER BY created_at ASC, id ASC LIMIT 1",
            TENANT_COLS
        ),
        &[&host],
    )
}

/// Bind (or with `None`/blank, clear) the routing domain of a tenant.
/// Returns None when the tenant does not exist.
pub fn bind_tenant_domain(
    conn: &Connection,
    tenant_id: &str,
    domain: Option<&str>,
) -> Result<Option<Tenant>> {
    let domain = domain
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty());
    query_one(
        conn,
        &format!(
            "UPDATE tenants SET domain = ?1, updated_at = ?2 WHERE id = ?3 RETURNING {}",
            TENANT_COLS
        ),
        &[&domain, &now(), &tenant_id],
    )
}

pub fn set_tenant_webhook_url(
    conn: &Connection,
    tenant_id: &str,
    webhook_url: Option<&str>,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE tenants SET webhook_url = ?1, updated_at = ?2 WHERE id = ?3",
        params![webhook_url, now(), tenant_id],
    )?;
    Ok(affected > 0)
}

// ============ Tools ============

pub fn create_tool(conn: &Connection, input: &CreateTool) -> Result<Tool> {
    let id = gen_id();
    let now = now();
    let coupon = input.coupon.as_ref();

    conn.execute(
        "INSERT INTO tools (id, slug, name, price_cents, currency, is_active, coupon_code, coupon_percent_off,
                            coupon_starts_on, coupon_ends_on, coupon_usage_limit, coupon_usage_count,
                            coupon_tenant_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            &id,
            &input.slug,
            &input.name,
            input.price_cents,
            &input.currency,
            coupon.map(|c| c.code.clone()),
            coupon.map(|c| c.percent_off).unwrap_or(0),
            coupon.and_then(|c| c.starts_on),
            coupon.and_then(|c| c.ends_on),
            coupon.map(|c| c.usage_limit).unwrap_or(0),
            coupon.map(|c| c.usage_count).unwrap_or(0),
            coupon.and_then(|c| c.tenant_id.clone()),
            now,
        ],
    )?;

    Ok(Tool {
        id,
        slug: input.slug.clone(),
        name: input.name.clone(),
        price_cents: input.price_cents,
        currency: input.currency.clone(),
        is_active: true,
        coupon: input.coupon.clone(),
        created_at: now,
    })
}

pub fn get_tool_by_id(conn: &Connection, id: &str) -> Result<Option<Tool>> {
    query_one(
        conn,
        &format!("SELECT {} FROM tools WHERE id = ?1", TOOL_COLS),
        &[&id],
    )
}

pub fn get_tool_by_slug(conn: &Connection, slug: &str) -> Result<Option<Tool>> {
    query_one(
        conn,
        &format!("SELECT {} FROM tools WHERE slug = ?1", TOOL_COLS),
        &[&slug],
    )
}

pub fn get_active_tool_by_slug(conn: &Connection, slug: &str) -> Result<Option<Tool>> {
    query_one(
        conn,
        &format!("SELECT {} FROM tools WHERE slug = ?1 AND is_active = 1", TOOL_COLS),
        &[&slug],
    )
}

/// Count one redemption of `code` against the tool's usage limit.
///
/// The update only matches while the code is still the configured one and the
/// limit (0 = unlimited) has room, so the counter can never pass the limit.
pub fn increment_coupon_usage(conn: &Connection, tool_id: &str, code: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE tools SET coupon_usage_count = coupon_usage_count + 1
         WHERE id = ?1 AND coupon_code = ?2
           AND (coupon_usage_limit = 0 OR coupon_usage_count < coupon_usage_limit)",
        params![tool_id, code],
    )?;
    Ok(affected > 0)
}

// ============ Licenses ============

pub fn insert_license(
    conn: &Connection,
    tenant_id: &str,
    tool_id: &str,
    input: &CreateLicense,
) -> Result<License> {
    let id = gen_id();
    let now = now();
    let starts_at = (input.status == LicenseStatus::Active).then_some(now);

    conn.execute(
        "INSERT INTO licenses (id, tenant_id, tool_id, status, plan, seats, starts_at, applied_coupon_code,
                               coupon_redeemed, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'standard', 1, ?5, ?6, 0, ?7, ?7)",
        params![
            &id,
            tenant_id,
            tool_id,
            input.status.as_ref(),
            starts_at,
            &input.applied_coupon_code,
            now,
        ],
    )?;

    Ok(License {
        id,
        tenant_id: tenant_id.to_string(),
        tool_id: tool_id.to_string(),
        status: input.status,
        plan: "standard".to_string(),
        seats: 1,
        starts_at,
        expires_at: None,
        applied_coupon_code: input.applied_coupon_code.clone(),
        coupon_redeemed: false,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_license_by_id(conn: &Connection, id: &str) -> Result<Option<License>> {
    query_one(
        conn,
        &format!("SELECT {} FROM licenses WHERE id = ?1", LICENSE_COLS),
        &[&id],
    )
}

pub fn get_license_for_tenant_tool(
    conn: &Connection,
    tenant_id: &str,
    tool_id: &str,
) -> Result<Option<License>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM licenses WHERE tenant_id = ?1 AND tool_id = ?2",
            LICENSE_COLS
        ),
        &[&tenant_id, &tool_id],
    )
}

/// Licenses of a tenant for the tool with the given slug (at most one row).
pub fn list_licenses_by_tool_slug(
    conn: &Connection,
    tenant_id: &str,
    tool_slug: &str,
) -> Result<Vec<License>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM licenses l JOIN tools t ON t.id = l.tool_id
             WHERE l.tenant_id = ?1 AND t.slug = ?2",
            LICENSE_COLS_L
        ),
        &[&tenant_id, &tool_slug],
    )
}

pub fn list_licenses_for_tenant(conn: &Connection, tenant_id: &str) -> Result<Vec<License>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM licenses WHERE tenant_id = ?1 ORDER BY created_at ASC",
            LICENSE_COLS
        ),
        &[&tenant_id],
    )
}

/// Move a license into `active`. Returns false when it already was active.
pub fn activate_license(conn: &Connection, license_id: &str) -> Result<bool> {
    let now = now();
    let affected = conn.execute(
        "UPDATE licenses SET status = 'active', starts_at = COALESCE(starts_at, ?2), updated_at = ?2
         WHERE id = ?1 AND status != 'active'",
        params![license_id, now],
    )?;
    Ok(affected > 0)
}

/// Move a license into `canceled`. Returns false when it already was canceled.
pub fn cancel_license(conn: &Connection, license_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE licenses SET status = 'canceled', updated_at = ?2
         WHERE id = ?1 AND status != 'canceled'",
        params![license_id, now()],
    )?;
    Ok(affected > 0)
}

/// Record a coupon on a license that is neither active nor already counted.
/// Returns false when the license no longer qualifies.
pub fn attach_coupon_code(conn: &Connection, license_id: &str, code: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE licenses SET applied_coupon_code = ?2, updated_at = ?3
         WHERE id = ?1 AND status != 'active' AND coupon_redeemed = 0",
        params![license_id, code, now()],
    )?;
    Ok(affected > 0)
}

/// Flag the license's coupon as counted. Only the first caller gets `true`.
pub fn mark_coupon_redeemed(conn: &Connection, license_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE licenses SET coupon_redeemed = 1, updated_at = ?2
         WHERE id = ?1 AND coupon_redeemed = 0",
        params![license_id, now()],
    )?;
    Ok(affected > 0)
}

pub fn has_active_license(conn: &Connection, tenant_id: &str, tool_slug: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM licenses l JOIN tools t ON t.id = l.tool_id
             WHERE l.tenant_id = ?1 AND t.slug = ?2 AND l.status = 'active'
         )",
        params![tenant_id, tool_slug],
        |row| row.get(0),
    )?;
    Ok(exists)
}

// ============ Material Settings ============

pub fn create_material_setting(
    conn: &Connection,
    tenant_id: &str,
    input: &CreateMaterialSetting,
) -> Result<MaterialSetting> {
    let id = gen_id();
    conn.execute(
        "INSERT INTO material_settings (id, tenant_id, tool_id, name, material_rate, labor_rate)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            &id,
            tenant_id,
            &input.tool_id,
            &input.name,
            input.material_rate,
            input.labor_rate
        ],
    )?;

    Ok(MaterialSetting {
        id,
        tenant_id: tenant_id.to_string(),
        tool_id: input.tool_id.clone(),
        name: input.name.clone(),
        material_rate: input.material_rate,
        labor_rate: input.labor_rate,
    })
}

/// First material setting (by name) for the tenant and tool, optionally
/// narrowed to a material name compared case-insensitively.
pub fn find_material_setting(
    conn: &Connection,
    tenant_id: &str,
    tool_slug: &str,
    name: Option<&str>,
) -> Result<Option<MaterialSetting>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM material_settings m JOIN tools t ON t.id = m.tool_id
             WHERE m.tenant_id = ?1 AND t.slug = ?2
               AND (?3 IS NULL OR m.name = ?3 COLLATE NOCASE)
             ORDER BY m.name ASC LIMIT 1",
            MATERIAL_SETTING_COLS
        ),
        &[&tenant_id, &tool_slug, &name],
    )
}

// ============ Widget Leads ============

/// Computed fields stored alongside a captured lead.
#[derive(Debug, Clone, Copy)]
pub struct LeadFigures {
    pub actual_area: f64,
    pub locked_for_quota: bool,
}

pub fn create_widget_lead(
    conn: &Connection,
    tenant_id: &str,
    tool_id: Option<&str>,
    input: &CreateWidgetLead,
    figures: LeadFigures,
) -> Result<WidgetLead> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO widget_leads (id, tenant_id, tool_id, full_name, email, phone, address, ground_area, pitch,
                                   actual_area, estimate_amount, source_url, locked_for_quota, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            &id,
            tenant_id,
            tool_id,
            &input.full_name,
            &input.email,
            &input.phone,
            &input.address,
            input.ground_area,
            input.pitch,
            figures.actual_area,
            input.estimate_amount,
            &input.source_url,
            figures.locked_for_quota,
            now,
        ],
    )?;

    Ok(WidgetLead {
        id,
        tenant_id: tenant_id.to_string(),
        tool_id: tool_id.map(String::from),
        full_name: input.full_name.clone(),
        email: input.email.clone(),
        phone: input.phone.clone(),
        address: input.address.clone(),
        ground_area: input.ground_area,
        pitch: input.pitch,
        actual_area: figures.actual_area,
        estimate_amount: input.estimate_amount,
        source_url: input.source_url.clone(),
        locked_for_quota: figures.locked_for_quota,
        created_at: now,
    })
}

pub fn count_widget_leads(conn: &Connection, tenant_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM widget_leads WHERE tenant_id = ?1",
        params![tenant_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn list_widget_leads(conn: &Connection, tenant_id: &str) -> Result<Vec<WidgetLead>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM widget_leads WHERE tenant_id = ?1 ORDER BY created_at DESC",
            WIDGET_LEAD_COLS
        ),
        &[&tenant_id],
    )
}

// ============ Widget Configs ============

pub fn get_widget_config(conn: &Connection, tenant_id: &str) -> Result<Option<WidgetConfig>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM widget_configs WHERE tenant_id = ?1",
            WIDGET_CONFIG_COLS
        ),
        &[&tenant_id],
    )
}

/// Return the tenant's widget config, inserting the default palette on first use.
pub fn get_or_create_widget_config(conn: &Connection, tenant_id: &str) -> Result<WidgetConfig> {
    let defaults = WidgetConfig::default();
    conn.execute(
        "INSERT OR IGNORE INTO widget_configs (tenant_id, primary_color, secondary_color, theme, logo_url, mark_text, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            tenant_id,
            &defaults.primary_color,
            &defaults.secondary_color,
            defaults.theme.as_ref(),
            &defaults.logo_url,
            &defaults.mark_text,
            now(),
        ],
    )?;

    get_widget_config(conn, tenant_id)?
        .ok_or_else(|| AppError::Internal("Widget config missing after insert".into()))
}

pub fn update_widget_config(
    conn: &Connection,
    tenant_id: &str,
    input: &UpdateWidgetConfig,
) -> Result<WidgetConfig> {
    get_or_create_widget_config(conn, tenant_id)?;

    UpdateBuilder::new("widget_configs", "tenant_id", tenant_id)
        .set_opt("primary_color", input.primary_color.clone())
        .set_opt("secondary_color", input.secondary_color.clone())
        .set_opt("theme", input.theme.map(|t| t.as_ref().to_string()))
        .set_opt("logo_url", input.logo_url.clone())
        .set_opt("mark_text", input.mark_text.clone())
        .execute_returning(conn, WIDGET_CONFIG_COLS)?
        .ok_or_else(|| AppError::Internal("Widget config missing after update".into()))
}
