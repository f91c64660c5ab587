//! Tests for PaymentGateway::create_checkout_link.

use axum::http::StatusCode;
use mockito::Matcher;
use serde_json::json;
use tower::ServiceExt;

use toolmarket::payments::{CheckoutLink, UpstreamError};

#[path = "../common/mod.rs"]
mod common;
use common::*;

fn processor_config(api_base: &str) -> PaymentConfig {
    PaymentConfig {
        api_base: api_base.to_string(),
        secret_key: Some("sk_test_123".to_string()),
        ..offline_payment_config()
    }
}

fn fixtures(db: &TestDb) -> (Tenant, Tool) {
    let conn = db.pool.get().unwrap();
    let tool = create_test_tool(&conn, "solar-quote", 4900, Some(save10_coupon(10)));
    let tenant = create_test_tenant(&conn, "Checkout Co");
    (tenant, tool)
}

#[tokio::test]
async fn test_issued_link_uses_discounted_amount() {
    let mut server = mockito::Server::new_async().await;
    let db = setup_test_db();
    let (tenant, tool) = fixtures(&db);

    let mock = server
        .mock("POST", "/payments")
        .match_header("authorization", "Bearer sk_test_123")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "amount": 44.1,
                "currency": "USD",
                "customer": {"email": "buyer@example.test"}
            })),
            Matcher::Regex(format!(r#""tx_ref":"{}-solar-quote-[A-Za-z0-9]{{16}}""#, tenant.id)),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"success","message":"Hosted Link","data":{"link":"https://checkout.test/pay/abc"}}"#)
        .create_async()
        .await;

    let gateway = PaymentGateway::new(processor_config(&server.url()));
    let link = gateway
        .create_checkout_link(&tenant, &tool, "buyer@example.test", 490)
        .await;

    mock.assert_async().await;
    assert!(!link.is_degraded());
    assert_eq!(link.url(), "https://checkout.test/pay/abc");
    assert_eq!(link.tx_ref().tenant_id, tenant.id);
    assert_eq!(link.tx_ref().tool_slug, "solar-quote");
}

#[tokio::test]
async fn test_processor_error_status_degrades() {
    let mut server = mockito::Server::new_async().await;
    let db = setup_test_db();
    let (tenant, tool) = fixtures(&db);

    let _mock = server
        .mock("POST", "/payments")
        .with_status(502)
        .create_async()
        .await;

    let gateway = PaymentGateway::new(processor_config(&server.url()));
    let link = gateway
        .create_checkout_link(&tenant, &tool, "buyer@example.test", 0)
        .await;

    match &link {
        CheckoutLink::Degraded { reason, url, tx_ref } => {
            assert!(matches!(reason, UpstreamError::Status(502)));
            assert_eq!(url, &gateway.placeholder_url(tx_ref));
        }
        other => panic!("expected degraded link, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unsuccessful_body_degrades() {
    let mut server = mockito::Server::new_async().await;
    let db = setup_test_db();
    let (tenant, tool) = fixtures(&db);

    let _mock = server
        .mock("POST", "/payments")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"error","message":"Invalid currency"}"#)
        .create_async()
        .await;

    let gateway = PaymentGateway::new(processor_config(&server.url()));
    let link = gateway
        .create_checkout_link(&tenant, &tool, "buyer@example.test", 0)
        .await;

    assert!(matches!(
        link,
        CheckoutLink::Degraded {
            reason: UpstreamError::InvalidResponse(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_missing_credentials_and_unreachable_processor_degrade() {
    let db = setup_test_db();
    let (tenant, tool) = fixtures(&db);

    let offline = PaymentGateway::new(offline_payment_config());
    let link = offline
        .create_checkout_link(&tenant, &tool, "buyer@example.test", 0)
        .await;
    assert!(matches!(
        link,
        CheckoutLink::Degraded {
            reason: UpstreamError::MissingCredentials,
            ..
        }
    ));

    let unreachable = PaymentGateway::new(processor_config("http://127.0.0.1:9"));
    let link = unreachable
        .create_checkout_link(&tenant, &tool, "buyer@example.test", 0)
        .await;
    assert!(link.is_degraded());
    assert!(link
        .url()
        .starts_with("https://pay.example.test/checkout?tx_ref="));
}

#[tokio::test]
async fn test_onboarding_returns_processor_link() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/payments")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"success","data":{"link":"https://checkout.test/pay/xyz"}}"#)
        .create_async()
        .await;

    let app_state = create_test_app_state_with(processor_config(&server.url()));
    {
        let conn = app_state.state.db.get().unwrap();
        create_test_tool(&conn, "solar-quote", 4900, None);
    }

    let response = public_app(app_state.state.clone())
        .oneshot(json_request(
            "POST",
            "/api/onboarding/start",
            &json!({
                "tool": "solar-quote",
                "tenant_name": "Linked Co",
                "full_name": "Lin Ked",
                "email": "lin@linked.test"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["payment_url"], "https://checkout.test/pay/xyz");
    assert_eq!(json["status"], "pending");
}
