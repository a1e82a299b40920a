use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// Client-facing handle for a created PaymentIntent.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Verified webhook event from the payment provider.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntentObject {
    pub id: String,
    pub status: Option<String>,
    pub amount: Option<i64>,
    pub last_payment_error: Option<serde_json::Value>,
}

impl StripeEvent {
    pub fn payment_intent(&self) -> Result<StripePaymentIntentObject> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|err| anyhow::anyhow!("event object is not a payment intent: {}", err))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StripeGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        order_id: i64,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentIntent>;

    async fn refund_payment(
        &self,
        provider_payment_id: &str,
        amount_minor: Option<i64>,
    ) -> Result<()>;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<StripeEvent>;
}
