use anyhow::Result;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;

use application::interfaces::stripe::{PaymentIntent, StripeEvent, StripeGateway};

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Minimal Stripe client built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
    decline_code: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: String, webhook_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            webhook_secret,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .or_else(|| resp.headers().get("stripe-request-id"))
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (stripe_error_type, stripe_error_code, stripe_error_param, stripe_error_message, stripe_decline_code) =
            match serde_json::from_str::<StripeErrorEnvelope>(&body) {
                Ok(envelope) => {
                    let details = envelope.error;
                    (
                        details.type_,
                        details.code,
                        details.param,
                        details.message,
                        details.decline_code,
                    )
                }
                Err(_) => (None, None, None, None, None),
            };

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?stripe_error_type,
            stripe_error_code = ?stripe_error_code,
            stripe_error_param = ?stripe_error_param,
            stripe_error_message = ?stripe_error_message,
            stripe_decline_code = ?stripe_decline_code,
            response_body = %body,
            context = %context,
            "stripe api request failed"
        );

        anyhow::bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }
}

#[async_trait]
impl StripeGateway for StripeClient {
    /// Creates a PaymentIntent for the order total.
    /// https://stripe.com/docs/api/payment_intents/create
    async fn create_payment_intent(
        &self,
        order_id: i64,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentIntent> {
        let body = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("metadata[order_id]", order_id.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/v1/payment_intents"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create payment intent").await?;

        #[derive(Deserialize)]
        struct IntentResp {
            id: String,
            client_secret: Option<String>,
        }

        let parsed: IntentResp = resp.json().await?;
        let client_secret = parsed
            .client_secret
            .ok_or_else(|| anyhow::anyhow!("PaymentIntent client_secret is missing"))?;
        Ok(PaymentIntent {
            id: parsed.id,
            client_secret,
        })
    }

    /// Refunds a captured PaymentIntent, fully when `amount_minor` is
    /// `None`. https://stripe.com/docs/api/refunds/create
    async fn refund_payment(
        &self,
        provider_payment_id: &str,
        amount_minor: Option<i64>,
    ) -> Result<()> {
        let mut body = vec![("payment_intent".to_string(), provider_payment_id.to_string())];
        if let Some(amount) = amount_minor {
            body.push(("amount".to_string(), amount.to_string()));
        }

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/v1/refunds"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        Self::ensure_success(resp, "create refund").await?;

        Ok(())
    }

    /// Verifies the webhook signature. https://stripe.com/docs/webhooks/signatures
    fn verify_webhook_signature(&self, payload: &[u8], signature_header: &str) -> Result<StripeEvent> {
        let mut timestamp: Option<String> = None;
        let mut signature: Option<String> = None;

        for part in signature_header.split(',') {
            if let Some(rest) = part.strip_prefix("t=") {
                timestamp = Some(rest.to_string());
            } else if let Some(rest) = part.strip_prefix("v1=") {
                signature = Some(rest.to_string());
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| anyhow::anyhow!("missing timestamp in stripe-signature"))?;
        let signature =
            signature.ok_or_else(|| anyhow::anyhow!("missing v1 in stripe-signature"))?;

        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())?;
        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();
        let provided = hex::decode(signature)?;

        if expected[..] != provided[..] {
            anyhow::bail!("invalid webhook signature");
        }

        let event: StripeEvent = serde_json::from_slice(payload)?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: &str, payload: &[u8]) -> String {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed_payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn client() -> StripeClient {
        StripeClient::new("sk_test_x".to_string(), "whsec_test".to_string())
    }

    #[test]
    fn accepts_a_correctly_signed_event() {
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;
        let header = format!("t=1714000000,v1={}", sign("whsec_test", "1714000000", payload));

        let event = client().verify_webhook_signature(payload, &header).unwrap();
        assert_eq!(event.type_, "payment_intent.succeeded");
        assert_eq!(event.payment_intent().unwrap().id, "pi_1");
    }

    #[test]
    fn rejects_a_wrong_secret() {
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{}}}"#;
        let header = format!("t=1714000000,v1={}", sign("whsec_other", "1714000000", payload));

        assert!(client().verify_webhook_signature(payload, &header).is_err());
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{}}}"#;
        let header = format!("t=1714000000,v1={}", sign("whsec_test", "1714000000", payload));
        let tampered = br#"{"id":"evt_2","type":"payment_intent.succeeded","data":{"object":{}}}"#;

        assert!(client().verify_webhook_signature(tampered, &header).is_err());
    }

    #[test]
    fn rejects_a_header_without_v1() {
        let payload = b"{}";
        assert!(client()
            .verify_webhook_signature(payload, "t=1714000000")
            .is_err());
    }
}
