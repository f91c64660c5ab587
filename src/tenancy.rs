use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::Tenant;

/// Find the tenant a request belongs to.
///
/// A tenant whose bound domain matches `host` wins. Otherwise the explicit
/// tenant id header is consulted. `None` is the normal answer for anonymous
/// marketplace traffic.
pub fn resolve_tenant(
    conn: &Connection,
    host: Option<&str>,
    header_tenant_id: Option<&str>,
) -> Result<Option<Tenant>> {
    if let Some(host) = host.filter(|h| !h.is_empty()) {
        if let Some(tenant) = queries::get_tenant_by_domain(conn, host)? {
            return Ok(Some(tenant));
        }
    }

    match header_tenant_id.filter(|id| !id.is_empty()) {
        Some(id) => queries::get_tenant_by_id(conn, id),
        None => Ok(None),
    }
}
