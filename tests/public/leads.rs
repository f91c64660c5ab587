//! Tests for POST /api/leads/widget and the tenant lead webhook.

use std::time::Duration;

use axum::http::StatusCode;
use mockito::Matcher;
use serde_json::json;
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

fn lead_body() -> serde_json::Value {
    json!({
        "tool": "roof-estimator",
        "full_name": "Pat Homeowner",
        "email": "pat@example.test",
        "phone": "555-0100",
        "address": "12 Elm St",
        "ground_area": 1000.0,
        "pitch": 6.0,
        "estimate_amount": 3913.11,
        "source_url": "https://hosted.test/quote"
    })
}

#[tokio::test]
async fn test_lead_requires_tenant() {
    let app_state = create_test_app_state();

    let response = public_app(app_state.state.clone())
        .oneshot(json_request("POST", "/api/leads/widget", &lead_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["details"],
        "Tenant not found for this widget request"
    );
}

#[tokio::test]
async fn test_lead_is_stored_for_resolved_tenant() {
    let app_state = create_test_app_state();
    let tenant = {
        let conn = app_state.state.db.get().unwrap();
        create_test_tool(&conn, "roof-estimator", 2900, None);
        create_test_tenant(&conn, "Lead Co")
    };

    let response = public_app(app_state.state.clone())
        .oneshot(tenant_json_request(
            "POST",
            "/api/leads/widget",
            &tenant.id,
            &lead_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["tenant_id"], tenant.id.as_str());
    assert_eq!(json["actual_area"], 1118.03);
    assert_eq!(json["locked_for_quota"], false);

    let conn = app_state.state.db.get().unwrap();
    let leads = queries::list_widget_leads(&conn, &tenant.id).unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].phone, "555-0100");
}

#[tokio::test]
async fn test_lead_notification_is_posted_to_tenant_webhook() {
    let mut server = mockito::Server::new_async().await;
    let hook = server
        .mock("POST", "/hooks/leads")
        .match_body(Matcher::PartialJson(json!({
            "event": "lead.created",
            "lead": {"full_name": "Pat Homeowner"}
        })))
        .with_status(200)
        .create_async()
        .await;

    let app_state = create_test_app_state();
    let tenant = {
        let conn = app_state.state.db.get().unwrap();
        create_test_tool(&conn, "roof-estimator", 2900, None);
        let tenant = create_test_tenant(&conn, "Hooked Co");
        let url = format!("{}/hooks/leads", server.url());
        assert!(queries::set_tenant_webhook_url(&conn, &tenant.id, Some(&url)).unwrap());
        tenant
    };

    let response = public_app(app_state.state.clone())
        .oneshot(tenant_json_request(
            "POST",
            "/api/leads/widget",
            &tenant.id,
            &lead_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Delivery happens in a background task
    for _ in 0..100 {
        if hook.matched_async().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    hook.assert_async().await;
}

#[tokio::test]
async fn test_failing_tenant_webhook_does_not_fail_capture() {
    let mut server = mockito::Server::new_async().await;
    let hook = server
        .mock("POST", "/hooks/leads")
        .with_status(500)
        .expect_at_least(1)
        .create_async()
        .await;

    let app_state = create_test_app_state();
    let tenant = {
        let conn = app_state.state.db.get().unwrap();
        create_test_tool(&conn, "roof-estimator", 2900, None);
        let tenant = create_test_tenant(&conn, "Flaky Co");
        let url = format!("{}/hooks/leads", server.url());
        queries::set_tenant_webhook_url(&conn, &tenant.id, Some(&url)).unwrap();
        tenant
    };

    let response = public_app(app_state.state.clone())
        .oneshot(tenant_json_request(
            "POST",
            "/api/leads/widget",
            &tenant.id,
            &lead_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    for _ in 0..100 {
        if hook.matched_async().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    hook.assert_async().await;
}
