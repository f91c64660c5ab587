//! The payment webhook checks the shared `verif-hash` secret when one is configured.

#[path = "../common/mod.rs"]
mod common;
use common::*;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

fn webhook_request(hash: Option<&str>, tx_ref: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/payments/webhook")
        .header("content-type", "application/json");
    if let Some(hash) = hash {
        builder = builder.header("verif-hash", hash);
    }
    builder
        .body(Body::from(
            json!({"status": "successful", "tx_ref": tx_ref}).to_string(),
        ))
        .unwrap()
}

fn hashed_app_state() -> TestApp {
    create_test_app_state_with(PaymentConfig {
        webhook_hash: Some("whsec_shared".to_string()),
        ..offline_payment_config()
    })
}

#[tokio::test]
async fn test_missing_or_wrong_hash_is_unauthorized() {
    let app_state = hashed_app_state();
    let (tenant, license) = {
        let conn = app_state.state.db.get().unwrap();
        let tool = create_test_tool(&conn, "solar-quote", 4900, None);
        let tenant = create_test_tenant(&conn, "Guarded Co");
        let license = create_test_license(&conn, &tenant, &tool, LicenseStatus::Pending, None);
        (tenant, license)
    };
    let tx_ref = format!("{}-solar-quote-AbCdEf0123456789", tenant.id);

    for hash in [None, Some("whsec_wrong"), Some("whsec_shared_extra")] {
        let response = public_app(app_state.state.clone())
            .oneshot(webhook_request(hash, &tx_ref))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let conn = app_state.state.db.get().unwrap();
    let stored = queries::get_license_by_id(&conn, &license.id).unwrap().unwrap();
    assert_eq!(stored.status, LicenseStatus::Pending);
}

#[tokio::test]
async fn test_matching_hash_is_accepted() {
    let app_state = hashed_app_state();
    let (tenant, license) = {
        let conn = app_state.state.db.get().unwrap();
        let tool = create_test_tool(&conn, "solar-quote", 4900, None);
        let tenant = create_test_tenant(&conn, "Trusted Co");
        let license = create_test_license(&conn, &tenant, &tool, LicenseStatus::Pending, None);
        (tenant, license)
    };
    let tx_ref = format!("{}-solar-quote-AbCdEf0123456789", tenant.id);

    let response = public_app(app_state.state.clone())
        .oneshot(webhook_request(Some("whsec_shared"), &tx_ref))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let conn = app_state.state.db.get().unwrap();
    let stored = queries::get_license_by_id(&conn, &license.id).unwrap().unwrap();
    assert_eq!(stored.status, LicenseStatus::Active);
}
