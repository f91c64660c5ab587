mod from_row;
pub mod queries;
mod schema;

pub use schema::init_db;

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::payments::PaymentGateway;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Main database pool (tenants, tools, licenses, leads)
    pub db: DbPool,
    /// Outbound checkout link issuance
    pub payments: PaymentGateway,
    /// Client for best-effort tenant webhook notifications
    pub http_client: reqwest::Client,
    /// Expected `verif-hash` header on payment webhooks (None = not checked)
    pub webhook_hash: Option<String>,
}

/// Concurrent writers wait for the lock instead of failing with SQLITE_BUSY.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });
    Pool::builder().max_size(10).build(manager)
}
