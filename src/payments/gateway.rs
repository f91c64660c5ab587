use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::PaymentConfig;
use crate::models::{Tenant, Tool};

use super::{CheckoutLink, TxRef, UpstreamError};

#[derive(Debug, Serialize)]
struct CreatePaymentRequest<'a> {
    tx_ref: String,
    /// Major currency units
    amount: f64,
    currency: &'a str,
    redirect_url: &'a str,
    customer: Customer<'a>,
    customizations: Customizations,
}

#[derive(Debug, Serialize)]
struct Customer<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Customizations {
    title: String,
}

#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    status: String,
    #[serde(default)]
    data: Option<CreatePaymentData>,
}

#[derive(Debug, Deserialize)]
struct CreatePaymentData {
    link: String,
}

/// Amount the customer pays after the coupon discount, never below zero.
pub fn amount_due_cents(price_cents: i64, discount_cents: i64) -> i64 {
    (price_cents - discount_cents.max(0)).max(0)
}

/// Outbound client for the hosted-checkout processor.
#[derive(Debug, Clone)]
pub struct PaymentGateway {
    client: Client,
    config: PaymentConfig,
}

impl PaymentGateway {
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    /// Deterministic stand-in link for when the processor can't be reached.
    pub fn placeholder_url(&self, tx_ref: &TxRef) -> String {
        format!(
            "{}?tx_ref={}",
            self.config.placeholder_base,
            urlencoding::encode(&tx_ref.to_string())
        )
    }

    /// Ask the processor for a checkout page for `tool` at the discounted price.
    ///
    /// Never fails: any upstream problem yields [`CheckoutLink::Degraded`]
    /// with a placeholder URL carrying the same tx_ref.
    pub async fn create_checkout_link(
        &self,
        tenant: &Tenant,
        tool: &Tool,
        email: &str,
        discount_cents: i64,
    ) -> CheckoutLink {
        let tx_ref = TxRef::generate(&tenant.id, &tool.slug);
        let amount_cents = amount_due_cents(tool.price_cents, discount_cents);

        match self.request_link(&tx_ref, tool, email, amount_cents).await {
            Ok(url) => {
                tracing::info!("Issued checkout link for tx_ref={}", tx_ref);
                CheckoutLink::Issued { url, tx_ref }
            }
            Err(reason) => {
                tracing::warn!(
                    "Checkout link for tx_ref={} degraded to placeholder: {}",
                    tx_ref,
                    reason
                );
                CheckoutLink::Degraded {
                    url: self.placeholder_url(&tx_ref),
                    tx_ref,
                    reason,
                }
            }
        }
    }

    async fn request_link(
        &self,
        tx_ref: &TxRef,
        tool: &Tool,
        email: &str,
        amount_cents: i64,
    ) -> Result<String, UpstreamError> {
        let secret = self
            .config
            .secret_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredentials)?;

        let request = CreatePaymentRequest {
            tx_ref: tx_ref.to_string(),
            amount: amount_cents as f64 / 100.0,
            currency: &self.config.currency,
            redirect_url: &self.config.redirect_url,
            customer: Customer { email },
            customizations: Customizations {
                title: tool.name.clone(),
            },
        };

        let url = format!("{}/payments", self.config.api_base.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(secret)
            .timeout(self.config.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }

        let body: CreatePaymentResponse = response.json().await?;
        if body.status != "success" {
            return Err(UpstreamError::InvalidResponse(format!(
                "status {:?}",
                body.status
            )));
        }

        body.data
            .map(|d| d.link)
            .filter(|link| !link.is_empty())
            .ok_or_else(|| UpstreamError::InvalidResponse("missing checkout link".into()))
    }
}
