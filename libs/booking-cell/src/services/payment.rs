// libs/booking-cell/src/services/payment.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::error::PaymentGatewayError;
use crate::models::{PaymentIntent, PaymentIntentRequest, Refund};

/// External payment processor. The ledger only ever refunds; intents are
/// created ahead of a reservation by the booking-intent route.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_refund(&self, payment_intent_id: &str) -> Result<Refund, PaymentGatewayError>;

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentGatewayError>;
}

/// Stripe REST client (form-encoded requests, bearer secret key).
pub struct StripePaymentGateway {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl StripePaymentGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.stripe_api_base_url.trim_end_matches('/').to_string(),
            secret_key: config.stripe_secret_key.clone(),
        }
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, PaymentGatewayError> {
        if self.secret_key.is_empty() {
            return Err(PaymentGatewayError("Payment gateway is not configured".to_string()));
        }

        let url = format!("{}{}", self.base_url, path);
        debug!("Calling payment gateway {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| PaymentGatewayError(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status));
            error!("Payment gateway error ({}): {}", status, message);
            return Err(PaymentGatewayError(message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PaymentGatewayError(format!("Unexpected response from {}: {}", path, e)))
    }
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    async fn create_refund(&self, payment_intent_id: &str) -> Result<Refund, PaymentGatewayError> {
        let refund: Refund = self
            .post_form("/v1/refunds", &[("payment_intent", payment_intent_id.to_string())])
            .await?;

        info!("Refund {} issued for payment intent {}", refund.id, payment_intent_id);
        Ok(refund)
    }

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentGatewayError> {
        let mut form = vec![
            ("amount", request.amount.to_string()),
            ("currency", request.currency.to_lowercase()),
        ];
        if let Some(customer) = &request.customer {
            form.push(("customer", customer.clone()));
        }
        if let Some(method) = &request.payment_method {
            form.push(("payment_method", method.clone()));
        }
        if let Some(description) = &request.description {
            form.push(("description", description.clone()));
        }

        let intent: PaymentIntent = self.post_form("/v1/payment_intents", &form).await?;
        info!("Payment intent {} created", intent.id);
        Ok(intent)
    }
}
