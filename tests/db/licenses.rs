#[path = "../common/mod.rs"]
mod common;
use common::*;

use toolmarket::licensing::{self, TransitionOutcome};

fn usage_count(conn: &rusqlite::Connection, slug: &str) -> i64 {
    queries::get_tool_by_slug(conn, slug)
        .unwrap()
        .and_then(|t| t.coupon)
        .map(|c| c.usage_count)
        .expect("tool should have a coupon")
}

#[test]
fn test_create_or_get_returns_existing_license() {
    let db = setup_test_db();
    let conn = db.pool.get().unwrap();
    let tenant = create_test_tenant(&conn, "Acme");
    let tool = create_test_tool(&conn, "solar-quote", 4900, None);

    let input = CreateLicense {
        status: LicenseStatus::Pending,
        applied_coupon_code: None,
    };
    let first = licensing::create_or_get(&conn, &tenant.id, &tool.id, &input).unwrap();
    let second = licensing::create_or_get(
        &conn,
        &tenant.id,
        &tool.id,
        &CreateLicense {
            status: LicenseStatus::Active,
            applied_coupon_code: Some("SAVE10".into()),
        },
    )
    .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.license.id, second.license.id);
    assert_eq!(
        second.license.status,
        LicenseStatus::Pending,
        "lookup must not mutate the existing license"
    );
    assert_eq!(second.license.applied_coupon_code, None);
}

#[test]
fn test_confirm_activates_and_counts_coupon_once() {
    let db = setup_test_db();
    let mut conn = db.pool.get().unwrap();
    let tenant = create_test_tenant(&conn, "Acme");
    let tool = create_test_tool(&conn, "solar-quote", 4900, Some(save10_coupon(5)));
    let license = create_test_license(&conn, &tenant, &tool, LicenseStatus::Pending, Some("SAVE10"));

    let first = licensing::confirm(&mut conn, &tenant.id, "solar-quote").unwrap();
    assert_eq!(
        first,
        TransitionOutcome {
            matched: 1,
            changed: 1,
            coupons_counted: 1
        }
    );

    let replay = licensing::confirm(&mut conn, &tenant.id, "solar-quote").unwrap();
    assert_eq!(
        replay,
        TransitionOutcome {
            matched: 1,
            changed: 0,
            coupons_counted: 0
        },
        "redelivered confirmation must be a no-op"
    );

    let stored = queries::get_license_by_id(&conn, &license.id).unwrap().unwrap();
    assert_eq!(stored.status, LicenseStatus::Active);
    assert!(stored.starts_at.is_some());
    assert!(stored.coupon_redeemed);
    assert_eq!(usage_count(&conn, "solar-quote"), 1);
}

#[test]
fn test_license_without_coupon_does_not_touch_usage() {
    let db = setup_test_db();
    let mut conn = db.pool.get().unwrap();
    let tenant = create_test_tenant(&conn, "Acme");
    let tool = create_test_tool(&conn, "solar-quote", 4900, Some(save10_coupon(5)));
    create_test_license(&conn, &tenant, &tool, LicenseStatus::Pending, None);

    licensing::confirm(&mut conn, &tenant.id, "solar-quote").unwrap();

    assert_eq!(usage_count(&conn, "solar-quote"), 0);
}

#[test]
fn test_coupon_replaced_since_license_creation_is_not_counted() {
    let db = setup_test_db();
    let mut conn = db.pool.get().unwrap();
    let tenant = create_test_tenant(&conn, "Acme");
    let tool = create_test_tool(&conn, "solar-quote", 4900, Some(save10_coupon(5)));
    create_test_license(&conn, &tenant, &tool, LicenseStatus::Pending, Some("OLDCODE"));

    let outcome = licensing::confirm(&mut conn, &tenant.id, "solar-quote").unwrap();

    assert_eq!(outcome.changed, 1);
    assert_eq!(outcome.coupons_counted, 0);
    assert_eq!(usage_count(&conn, "solar-quote"), 0);
}

#[test]
fn test_usage_count_never_exceeds_limit() {
    let db = setup_test_db();
    let mut conn = db.pool.get().unwrap();
    let tool = create_test_tool(&conn, "solar-quote", 4900, Some(save10_coupon(1)));
    let a = create_test_tenant(&conn, "Tenant A");
    let b = create_test_tenant(&conn, "Tenant B");
    // Both licenses were quoted the coupon before either paid
    create_test_license(&conn, &a, &tool, LicenseStatus::Pending, Some("SAVE10"));
    create_test_license(&conn, &b, &tool, LicenseStatus::Pending, Some("SAVE10"));

    let first = licensing::confirm(&mut conn, &a.id, "solar-quote").unwrap();
    let second = licensing::confirm(&mut conn, &b.id, "solar-quote").unwrap();

    assert_eq!(first.coupons_counted, 1);
    assert_eq!(second.coupons_counted, 0);
    assert_eq!(second.changed, 1, "payment still activates the license");
    assert_eq!(usage_count(&conn, "solar-quote"), 1);
}

#[test]
fn test_reject_cancels_without_usage_effect() {
    let db = setup_test_db();
    let mut conn = db.pool.get().unwrap();
    let tenant = create_test_tenant(&conn, "Acme");
    let tool = create_test_tool(&conn, "solar-quote", 4900, Some(save10_coupon(5)));
    let license = create_test_license(&conn, &tenant, &tool, LicenseStatus::Pending, Some("SAVE10"));

    let outcome = licensing::reject(&mut conn, &tenant.id, "solar-quote").unwrap();
    assert_eq!(outcome.changed, 1);

    let replay = licensing::reject(&mut conn, &tenant.id, "solar-quote").unwrap();
    assert_eq!(replay.changed, 0);

    let stored = queries::get_license_by_id(&conn, &license.id).unwrap().unwrap();
    assert_eq!(stored.status, LicenseStatus::Canceled);
    assert_eq!(usage_count(&conn, "solar-quote"), 0);
}

#[test]
fn test_last_terminal_status_wins_and_coupon_counts_once() {
    let db = setup_test_db();
    let mut conn = db.pool.get().unwrap();
    let tenant = create_test_tenant(&conn, "Acme");
    let tool = create_test_tool(&conn, "solar-quote", 4900, Some(save10_coupon(5)));
    let license = create_test_license(&conn, &tenant, &tool, LicenseStatus::Pending, Some("SAVE10"));

    licensing::confirm(&mut conn, &tenant.id, "solar-quote").unwrap();
    licensing::reject(&mut conn, &tenant.id, "solar-quote").unwrap();
    let stored = queries::get_license_by_id(&conn, &license.id).unwrap().unwrap();
    assert_eq!(stored.status, LicenseStatus::Canceled);

    licensing::confirm(&mut conn, &tenant.id, "solar-quote").unwrap();
    let stored = queries::get_license_by_id(&conn, &license.id).unwrap().unwrap();
    assert_eq!(stored.status, LicenseStatus::Active);
    assert_eq!(
        usage_count(&conn, "solar-quote"),
        1,
        "re-activation after a cancel must not count the coupon again"
    );
}

#[test]
fn test_confirm_is_scoped_to_tenant() {
    let db = setup_test_db();
    let mut conn = db.pool.get().unwrap();
    let tool = create_test_tool(&conn, "solar-quote", 4900, None);
    let a = create_test_tenant(&conn, "Tenant A");
    let b = create_test_tenant(&conn, "Tenant B");
    create_test_license(&conn, &a, &tool, LicenseStatus::Pending, None);
    let other = create_test_license(&conn, &b, &tool, LicenseStatus::Pending, None);

    licensing::confirm(&mut conn, &a.id, "solar-quote").unwrap();

    let untouched = queries::get_license_by_id(&conn, &other.id).unwrap().unwrap();
    assert_eq!(untouched.status, LicenseStatus::Pending);
}

#[test]
fn test_confirm_unknown_pair_matches_nothing() {
    let db = setup_test_db();
    let mut conn = db.pool.get().unwrap();
    let tenant = create_test_tenant(&conn, "Acme");

    let outcome = licensing::confirm(&mut conn, &tenant.id, "no-such-tool").unwrap();

    assert_eq!(outcome, TransitionOutcome::default());
}

#[test]
fn test_attach_coupon_only_to_unpaid_uncounted_licenses() {
    let db = setup_test_db();
    let mut conn = db.pool.get().unwrap();
    let tenant = create_test_tenant(&conn, "Acme");
    let tool = create_test_tool(&conn, "solar-quote", 4900, Some(save10_coupon(5)));

    let pending = create_test_license(&conn, &tenant, &tool, LicenseStatus::Pending, None);
    assert!(licensing::attach_coupon(&conn, &pending, "SAVE10").unwrap());
    let pending = queries::get_license_by_id(&conn, &pending.id).unwrap().unwrap();
    assert_eq!(pending.applied_coupon_code.as_deref(), Some("SAVE10"));
    assert!(
        licensing::attach_coupon(&conn, &pending, "SAVE10").unwrap(),
        "the same code on an uncounted license stays attached"
    );

    // Pay, cancel, then try to reuse the already counted coupon
    licensing::confirm(&mut conn, &tenant.id, "solar-quote").unwrap();
    licensing::reject(&mut conn, &tenant.id, "solar-quote").unwrap();
    let canceled = queries::get_license_by_id(&conn, &pending.id).unwrap().unwrap();
    assert!(canceled.coupon_redeemed);
    assert!(!licensing::attach_coupon(&conn, &canceled, "SAVE10").unwrap());
    assert_eq!(usage_count(&conn, "solar-quote"), 1);

    let other_tool = create_test_tool(&conn, "roof-estimator", 2900, Some(save10_coupon(5)));
    let active = create_test_license(&conn, &tenant, &other_tool, LicenseStatus::Active, None);
    assert!(!licensing::attach_coupon(&conn, &active, "SAVE10").unwrap());
    let active = queries::get_license_by_id(&conn, &active.id).unwrap().unwrap();
    assert_eq!(active.applied_coupon_code, None);
}
