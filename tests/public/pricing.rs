//! Tests for POST /api/pricing/estimate.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[tokio::test]
async fn test_sandbox_estimate_without_tenant() {
    let app_state = create_test_app_state();

    let response = public_app(app_state.state.clone())
        .oneshot(json_request(
            "POST",
            "/api/pricing/estimate?sandbox=true",
            &json!({"ground_area": 1000.0, "pitch": 6.0, "rate_per_sqft": 2.0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["actual_area"], 1118.03);
    assert_eq!(json["estimate_amount"], 2236.06);
    assert_eq!(json["rate_per_sqft"], 2.0);
    assert!(json.get("material_used").is_none());
}

#[tokio::test]
async fn test_estimate_requires_active_license() {
    let app_state = create_test_app_state();
    let tenant = {
        let conn = app_state.state.db.get().unwrap();
        let tenant = create_test_tenant(&conn, "Unpaid Co");
        let tool = create_test_tool(&conn, "roof-estimator", 2900, None);
        create_test_license(&conn, &tenant, &tool, LicenseStatus::Pending, None);
        tenant
    };

    let unlicensed = [
        json_request(
            "POST",
            "/api/pricing/estimate?tool=roof-estimator",
            &json!({"ground_area": 1000.0, "pitch": 6.0}),
        ),
        tenant_json_request(
            "POST",
            "/api/pricing/estimate?tool=roof-estimator",
            &tenant.id,
            &json!({"ground_area": 1000.0, "pitch": 6.0}),
        ),
        tenant_json_request(
            "POST",
            "/api/pricing/estimate",
            &tenant.id,
            &json!({"ground_area": 1000.0, "pitch": 6.0}),
        ),
    ];

    for request in unlicensed {
        let response = public_app(app_state.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["details"], "An active license is required for this tool");
    }
}

#[tokio::test]
async fn test_material_setting_overrides_rate() {
    let app_state = create_test_app_state();
    let tenant = {
        let conn = app_state.state.db.get().unwrap();
        let tenant = create_test_tenant(&conn, "Material Co");
        let tool = create_test_tool(&conn, "roof-estimator", 2900, None);
        create_test_license(&conn, &tenant, &tool, LicenseStatus::Active, None);
        for (name, material_rate, labor_rate) in [("Metal", 4.0, 2.0), ("Asphalt", 2.0, 1.5)] {
            queries::create_material_setting(
                &conn,
                &tenant.id,
                &CreateMaterialSetting {
                    tool_id: Some(tool.id.clone()),
                    name: name.to_string(),
                    material_rate,
                    labor_rate,
                },
            )
            .unwrap();
        }
        tenant
    };

    // No material requested: first by name wins
    let response = public_app(app_state.state.clone())
        .oneshot(tenant_json_request(
            "POST",
            "/api/pricing/estimate?tool=roof-estimator",
            &tenant.id,
            &json!({"ground_area": 1000.0, "pitch": 0.0, "rate_per_sqft": 9.99}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["material_used"], "Asphalt");
    assert_eq!(json["rate_per_sqft"], 3.5);
    assert_eq!(json["estimate_amount"], 3500.0);

    // Named material, matched case-insensitively
    let response = public_app(app_state.state.clone())
        .oneshot(tenant_json_request(
            "POST",
            "/api/pricing/estimate?tool=roof-estimator&material=metal",
            &tenant.id,
            &json!({"ground_area": 1000.0, "pitch": 0.0, "adjustment": -100.0}),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["material_used"], "Metal");
    assert_eq!(json["estimate_amount"], 5900.0);
}

#[tokio::test]
async fn test_material_settings_are_tenant_scoped() {
    let app_state = create_test_app_state();
    let other = {
        let conn = app_state.state.db.get().unwrap();
        let owner = create_test_tenant(&conn, "Owner Co");
        let other = create_test_tenant(&conn, "Other Co");
        let tool = create_test_tool(&conn, "roof-estimator", 2900, None);
        create_test_license(&conn, &other, &tool, LicenseStatus::Active, None);
        queries::create_material_setting(
            &conn,
            &owner.id,
            &CreateMaterialSetting {
                tool_id: Some(tool.id.clone()),
                name: "Slate".to_string(),
                material_rate: 10.0,
                labor_rate: 5.0,
            },
        )
        .unwrap();
        other
    };

    let response = public_app(app_state.state.clone())
        .oneshot(tenant_json_request(
            "POST",
            "/api/pricing/estimate?tool=roof-estimator",
            &other.id,
            &json!({"ground_area": 500.0, "pitch": 0.0}),
        ))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert!(json.get("material_used").is_none());
    assert_eq!(json["rate_per_sqft"], 1.0, "default rate applies");
    assert_eq!(json["estimate_amount"], 500.0);
}

#[tokio::test]
async fn test_invalid_geometry_is_validation_error() {
    let app_state = create_test_app_state();

    for (body, field) in [
        (json!({"ground_area": 0.0, "pitch": 6.0}), "ground_area"),
        (json!({"ground_area": 100.0, "pitch": -1.0}), "pitch"),
    ] {
        let response = public_app(app_state.state.clone())
            .oneshot(json_request("POST", "/api/pricing/estimate?sandbox=true", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["field"], field);
    }
}
