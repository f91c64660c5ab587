//! Toolmarket - tenant-scoped licensing and payment reconciliation for a tool marketplace
//!
//! Tenants license tools, capture leads through an embeddable widget and pay
//! through a hosted-checkout processor whose webhooks drive license state.

pub mod config;
pub mod coupons;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod leads;
pub mod licensing;
pub mod middleware;
pub mod models;
pub mod onboarding;
pub mod payments;
pub mod pricing;
pub mod rate_limit;
pub mod tenancy;
pub mod util;
