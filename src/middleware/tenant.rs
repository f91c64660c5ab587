use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::db::AppState;
use crate::error::{AppError, OptionExt, Result};
use crate::models::Tenant;
use crate::tenancy::resolve_tenant;
use crate::util::{header_tenant_id, request_host};

/// Tenant resolved for the current request. `tenant` is None for anonymous
/// marketplace traffic.
#[derive(Debug, Clone, Default)]
pub struct TenantContext {
    pub tenant: Option<Tenant>,
}

impl TenantContext {
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant.as_ref().map(|t| t.id.as_str())
    }

    /// The tenant, or `NotFound` with `message` when the request has none.
    pub fn require(&self, message: &str) -> Result<&Tenant> {
        self.tenant.as_ref().or_not_found(message)
    }
}

/// Resolve the tenant from the `Host` header (bound domain) or `X-Tenant-ID`
/// and attach a [`TenantContext`] to the request.
pub async fn tenant_context(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, AppError> {
    let host = request_host(request.headers());
    let header_id = header_tenant_id(request.headers());

    let tenant = {
        let conn = state.db.get()?;
        resolve_tenant(&conn, host.as_deref(), header_id.as_deref())?
    };

    if let Some(ref t) = tenant {
        tracing::debug!("Request resolved to tenant {} ({})", t.slug, t.id);
    }

    request.extensions_mut().insert(TenantContext { tenant });
    Ok(next.run(request).await)
}
