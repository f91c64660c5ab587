use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Tenants (isolated customer organizations)
        -- domain is not unique: the resolver takes the oldest match
        CREATE TABLE IF NOT EXISTS tenants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            domain TEXT,
            plan TEXT NOT NULL DEFAULT 'freemium' CHECK (plan IN ('freemium', 'standard', 'pro')),
            webhook_url TEXT,
            leads_quota INTEGER NOT NULL DEFAULT 3 CHECK (leads_quota >= 0),
            contact_name TEXT,
            contact_email TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tenants_domain ON tenants(domain COLLATE NOCASE);

        -- Tools (licensable catalog entries, one optional coupon each)
        CREATE TABLE IF NOT EXISTS tools (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            price_cents INTEGER NOT NULL DEFAULT 0 CHECK (price_cents >= 0),
            currency TEXT NOT NULL DEFAULT 'USD',
            is_active INTEGER NOT NULL DEFAULT 1,
            coupon_code TEXT,
            coupon_percent_off INTEGER NOT NULL DEFAULT 0 CHECK (coupon_percent_off BETWEEN 0 AND 100),
            coupon_starts_on TEXT,
            coupon_ends_on TEXT,
            coupon_usage_limit INTEGER NOT NULL DEFAULT 0 CHECK (coupon_usage_limit >= 0),
            coupon_usage_count INTEGER NOT NULL DEFAULT 0 CHECK (coupon_usage_count >= 0),
            coupon_tenant_id TEXT REFERENCES tenants(id) ON DELETE SET NULL,
            created_at INTEGER NOT NULL
        );

        -- Licenses (tenant <-> tool binding, never deleted)
        CREATE TABLE IF NOT EXISTS licenses (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            tool_id TEXT NOT NULL REFERENCES tools(id) ON DELETE CASCADE,
            status TEXT NOT NULL CHECK (status IN ('trial', 'pending', 'active', 'expired', 'canceled')),
            plan TEXT NOT NULL DEFAULT 'standard',
            seats INTEGER NOT NULL DEFAULT 1,
            starts_at INTEGER,
            expires_at INTEGER,
            applied_coupon_code TEXT,
            coupon_redeemed INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(tenant_id, tool_id)
        );
        CREATE INDEX IF NOT EXISTS idx_licenses_tenant_status ON licenses(tenant_id, status);

        -- Material settings (tenant-specific rates, read by the pricing engine)
        CREATE TABLE IF NOT EXISTS material_settings (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            tool_id TEXT REFERENCES tools(id) ON DELETE SET NULL,
            name TEXT NOT NULL,
            material_rate REAL NOT NULL DEFAULT 0,
            labor_rate REAL NOT NULL DEFAULT 0,
            UNIQUE(tenant_id, tool_id, name)
        );
        CREATE INDEX IF NOT EXISTS idx_material_settings_tenant ON material_settings(tenant_id);

        -- Widget leads (captured through the embedded widget)
        CREATE TABLE IF NOT EXISTS widget_leads (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            tool_id TEXT REFERENCES tools(id) ON DELETE SET NULL,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL,
            ground_area REAL NOT NULL DEFAULT 0,
            pitch REAL NOT NULL DEFAULT 0,
            actual_area REAL NOT NULL DEFAULT 0,
            estimate_amount REAL NOT NULL DEFAULT 0,
            source_url TEXT NOT NULL DEFAULT '',
            locked_for_quota INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_widget_leads_tenant ON widget_leads(tenant_id, created_at);

        -- Widget configs (one per tenant)
        CREATE TABLE IF NOT EXISTS widget_configs (
            tenant_id TEXT PRIMARY KEY REFERENCES tenants(id) ON DELETE CASCADE,
            primary_color TEXT NOT NULL,
            secondary_color TEXT NOT NULL,
            theme TEXT NOT NULL CHECK (theme IN ('frosted', 'smoked')),
            logo_url TEXT NOT NULL DEFAULT '',
            mark_text TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )
}
