use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use domain::{
    repositories::{
        jobs::JobRepository, orders::OrderRepository, payments::PaymentRepository,
        users::UserRepository,
    },
    value_objects::email_jobs::{EmailJobPayload, EmailKind},
};

use crate::interfaces::stripe::{StripeEvent, StripeGateway, StripePaymentIntentObject};

const EVENT_PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
const EVENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl WebhookError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            WebhookError::InvalidSignature => StatusCode::BAD_REQUEST,
            WebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type WebhookResult<T> = std::result::Result<T, WebhookError>;

/// Applies Stripe webhook events to local payment and order state.
///
/// Stripe retries deliveries, so every handler here must be safe to run
/// more than once. State moves through guarded updates that match only
/// the expected current status; a redelivered event matches zero rows
/// and the side effects are skipped.
pub struct PaymentWebhookUseCase<P, O, J, U, S>
where
    P: PaymentRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    payment_repo: Arc<P>,
    order_repo: Arc<O>,
    job_repo: Arc<J>,
    user_repo: Arc<U>,
    stripe_client: Arc<S>,
}

impl<P, O, J, U, S> PaymentWebhookUseCase<P, O, J, U, S>
where
    P: PaymentRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        payment_repo: Arc<P>,
        order_repo: Arc<O>,
        job_repo: Arc<J>,
        user_repo: Arc<U>,
        stripe_client: Arc<S>,
    ) -> Self {
        Self {
            payment_repo,
            order_repo,
            job_repo,
            user_repo,
            stripe_client,
        }
    }

    pub async fn handle_event(&self, payload: &[u8], signature: &str) -> WebhookResult<()> {
        let event = self
            .stripe_client
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                warn!(error = ?err, "webhook: signature rejected");
                WebhookError::InvalidSignature
            })?;

        match event.type_.as_str() {
            EVENT_PAYMENT_SUCCEEDED => self.handle_payment_succeeded(&event).await,
            EVENT_PAYMENT_FAILED => self.handle_payment_failed(&event).await,
            other => {
                info!(event_id = %event.id, event_type = %other, "webhook: ignoring event");
                Ok(())
            }
        }
    }

    async fn handle_payment_succeeded(&self, event: &StripeEvent) -> WebhookResult<()> {
        let Some((_, payment)) = self.intent_for_known_payment(event).await? else {
            return Ok(());
        };

        let payment_moved = self
            .payment_repo
            .mark_payment_succeeded(payment.id)
            .await
            .map_err(WebhookError::Internal)?;
        let order_moved = self
            .order_repo
            .mark_order_paid(payment.order_id)
            .await
            .map_err(WebhookError::Internal)?;

        if !payment_moved && !order_moved {
            info!(
                event_id = %event.id,
                payment_id = payment.id,
                "webhook: success event already applied"
            );
            return Ok(());
        }

        // Only the delivery that wins the order transition sends mail,
        // and the dedup key makes a second enqueue a no-op anyway.
        if order_moved {
            info!(
                event_id = %event.id,
                payment_id = payment.id,
                order_id = payment.order_id,
                "webhook: payment succeeded, order paid"
            );
            self.enqueue_order_confirmation(payment.order_id, payment.user_id)
                .await?;
        } else {
            // A cancel won the race; the succeeded payment needs a refund.
            warn!(
                event_id = %event.id,
                payment_id = payment.id,
                order_id = payment.order_id,
                "webhook: payment succeeded but order is no longer pending"
            );
        }
        Ok(())
    }

    async fn handle_payment_failed(&self, event: &StripeEvent) -> WebhookResult<()> {
        let Some((intent, payment)) = self.intent_for_known_payment(event).await? else {
            return Ok(());
        };

        let reason = intent
            .last_payment_error
            .as_ref()
            .and_then(|err| err.get("message"))
            .and_then(|msg| msg.as_str())
            .unwrap_or("payment failed")
            .to_string();

        let moved = self
            .payment_repo
            .mark_payment_failed(payment.id, &reason)
            .await
            .map_err(WebhookError::Internal)?;
        if moved {
            warn!(
                event_id = %event.id,
                payment_id = payment.id,
                order_id = payment.order_id,
                %reason,
                "webhook: payment failed, order stays pending"
            );
        }
        Ok(())
    }

    /// Extracts the payment intent and resolves the payment we created
    /// for it. Unknown intents are acknowledged without action so
    /// Stripe stops redelivering them.
    async fn intent_for_known_payment(
        &self,
        event: &StripeEvent,
    ) -> WebhookResult<Option<(StripePaymentIntentObject, domain::entities::payments::PaymentEntity)>>
    {
        let intent = match event.payment_intent() {
            Ok(intent) => intent,
            Err(err) => {
                warn!(event_id = %event.id, error = ?err, "webhook: malformed event object");
                return Ok(None);
            }
        };

        let payment = self
            .payment_repo
            .find_by_provider_payment_id(&intent.id)
            .await
            .map_err(WebhookError::Internal)?;
        match payment {
            Some(payment) => Ok(Some((intent, payment))),
            None => {
                info!(event_id = %event.id, intent_id = %intent.id, "webhook: unknown payment intent");
                Ok(None)
            }
        }
    }

    async fn enqueue_order_confirmation(
        &self,
        order_id: i64,
        user_id: uuid::Uuid,
    ) -> WebhookResult<()> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(WebhookError::Internal)?;
        let Some(user) = user else {
            error!(order_id, %user_id, "webhook: paid order has no user, skipping mail");
            return Ok(());
        };
        let order = self
            .order_repo
            .find_order_by_id(order_id)
            .await
            .map_err(WebhookError::Internal)?;
        let Some(order) = order else {
            error!(order_id, "webhook: paid order vanished, skipping mail");
            return Ok(());
        };

        let enqueued = self
            .job_repo
            .enqueue_email_job(EmailJobPayload {
                kind: EmailKind::OrderConfirmation,
                recipient: user.email,
                token: None,
                order_id: Some(order_id),
                total_minor: Some(order.total_minor),
            })
            .await
            .map_err(WebhookError::Internal)?;
        if enqueued.is_none() {
            info!(order_id, "webhook: confirmation mail already queued");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use domain::entities::payments::PaymentEntity;
    use domain::entities::users::UserEntity;
    use domain::repositories::{
        jobs::MockJobRepository, orders::MockOrderRepository, payments::MockPaymentRepository,
        users::MockUserRepository,
    };
    use domain::value_objects::enums::payment_statuses::PaymentStatus;

    use crate::interfaces::stripe::{MockStripeGateway, StripeEventData};

    fn succeeded_event() -> StripeEvent {
        StripeEvent {
            id: "evt_1".to_string(),
            type_: EVENT_PAYMENT_SUCCEEDED.to_string(),
            data: StripeEventData {
                object: json!({"id": "pi_123", "status": "succeeded", "amount": 1998}),
            },
        }
    }

    fn pending_payment(user_id: Uuid) -> PaymentEntity {
        PaymentEntity {
            id: 11,
            order_id: 77,
            user_id,
            amount_minor: 1998,
            status: PaymentStatus::Pending.to_string(),
            provider_payment_id: Some("pi_123".to_string()),
            error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(user_id: Uuid) -> UserEntity {
        UserEntity {
            id: user_id,
            email: "viewer@example.com".to_string(),
            password_hash: "x".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn verifying_gateway(event: StripeEvent) -> MockStripeGateway {
        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_verify_webhook_signature()
            .returning(move |_, _| Ok(event.clone()));
        stripe
    }

    #[tokio::test]
    async fn bad_signature_is_rejected_without_side_effects() {
        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_verify_webhook_signature()
            .returning(|_, _| Err(anyhow::anyhow!("signature mismatch")));

        let usecase = PaymentWebhookUseCase::new(
            Arc::new(MockPaymentRepository::new()),
            Arc::new(MockOrderRepository::new()),
            Arc::new(MockJobRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(stripe),
        );
        let err = usecase.handle_event(b"{}", "t=1,v1=bad").await;
        assert!(matches!(err, Err(WebhookError::InvalidSignature)));
    }

    #[tokio::test]
    async fn success_event_marks_paid_and_queues_confirmation() {
        let user_id = Uuid::new_v4();

        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_provider_payment_id()
            .returning(move |_| Ok(Some(pending_payment(user_id))));
        payment_repo
            .expect_mark_payment_succeeded()
            .times(1)
            .returning(|_| Ok(true));

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_mark_order_paid()
            .with(mockall::predicate::eq(77))
            .times(1)
            .returning(|_| Ok(true));
        order_repo.expect_find_order_by_id().returning(move |id| {
            Ok(Some(domain::entities::orders::OrderEntity {
                id,
                user_id,
                status: "paid".to_string(),
                total_minor: 1998,
                created_at: Utc::now(),
            }))
        });

        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_enqueue_email_job()
            .withf(|payload| {
                payload.kind == EmailKind::OrderConfirmation
                    && payload.recipient == "viewer@example.com"
                    && payload.order_id == Some(77)
                    && payload.total_minor == Some(1998)
            })
            .times(1)
            .returning(|_| Ok(Some(1)));

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user(user_id))));

        let usecase = PaymentWebhookUseCase::new(
            Arc::new(payment_repo),
            Arc::new(order_repo),
            Arc::new(job_repo),
            Arc::new(user_repo),
            Arc::new(verifying_gateway(succeeded_event())),
        );
        usecase.handle_event(b"{}", "t=1,v1=ok").await.unwrap();
    }

    #[tokio::test]
    async fn redelivered_success_event_sends_no_second_mail() {
        let user_id = Uuid::new_v4();

        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_provider_payment_id()
            .returning(move |_| {
                Ok(Some(PaymentEntity {
                    status: PaymentStatus::Succeeded.to_string(),
                    ..pending_payment(user_id)
                }))
            });
        // Guarded updates match zero rows on the second delivery.
        payment_repo
            .expect_mark_payment_succeeded()
            .returning(|_| Ok(false));

        let mut order_repo = MockOrderRepository::new();
        order_repo.expect_mark_order_paid().returning(|_| Ok(false));

        // No enqueue expectation set: any call would panic the mock.
        let usecase = PaymentWebhookUseCase::new(
            Arc::new(payment_repo),
            Arc::new(order_repo),
            Arc::new(MockJobRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(verifying_gateway(succeeded_event())),
        );
        usecase.handle_event(b"{}", "t=1,v1=ok").await.unwrap();
    }

    #[tokio::test]
    async fn success_event_after_cancel_sends_no_confirmation() {
        let user_id = Uuid::new_v4();

        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_provider_payment_id()
            .returning(move |_| Ok(Some(pending_payment(user_id))));
        payment_repo
            .expect_mark_payment_succeeded()
            .times(1)
            .returning(|_| Ok(true));

        // The order left `pending` already, so the guarded update misses.
        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_mark_order_paid()
            .with(mockall::predicate::eq(77))
            .times(1)
            .returning(|_| Ok(false));

        // No enqueue expectation set: any call would panic the mock.
        let usecase = PaymentWebhookUseCase::new(
            Arc::new(payment_repo),
            Arc::new(order_repo),
            Arc::new(MockJobRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(verifying_gateway(succeeded_event())),
        );
        usecase.handle_event(b"{}", "t=1,v1=ok").await.unwrap();
    }

    #[tokio::test]
    async fn unknown_payment_intent_is_acknowledged() {
        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_provider_payment_id()
            .returning(|_| Ok(None));

        let usecase = PaymentWebhookUseCase::new(
            Arc::new(payment_repo),
            Arc::new(MockOrderRepository::new()),
            Arc::new(MockJobRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(verifying_gateway(succeeded_event())),
        );
        usecase.handle_event(b"{}", "t=1,v1=ok").await.unwrap();
    }

    #[tokio::test]
    async fn failed_event_records_reason_and_keeps_order_pending() {
        let user_id = Uuid::new_v4();
        let event = StripeEvent {
            id: "evt_2".to_string(),
            type_: EVENT_PAYMENT_FAILED.to_string(),
            data: StripeEventData {
                object: json!({
                    "id": "pi_123",
                    "status": "requires_payment_method",
                    "amount": 1998,
                    "last_payment_error": {"message": "card declined"}
                }),
            },
        };

        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_provider_payment_id()
            .returning(move |_| Ok(Some(pending_payment(user_id))));
        payment_repo
            .expect_mark_payment_failed()
            .withf(|id, reason| *id == 11 && reason == "card declined")
            .times(1)
            .returning(|_, _| Ok(true));

        // Order repo gets no calls at all for a failure event.
        let usecase = PaymentWebhookUseCase::new(
            Arc::new(payment_repo),
            Arc::new(MockOrderRepository::new()),
            Arc::new(MockJobRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(verifying_gateway(event)),
        );
        usecase.handle_event(b"{}", "t=1,v1=ok").await.unwrap();
    }

    #[tokio::test]
    async fn unrelated_event_types_are_ignored() {
        let event = StripeEvent {
            id: "evt_3".to_string(),
            type_: "charge.updated".to_string(),
            data: StripeEventData { object: json!({}) },
        };

        let usecase = PaymentWebhookUseCase::new(
            Arc::new(MockPaymentRepository::new()),
            Arc::new(MockOrderRepository::new()),
            Arc::new(MockJobRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(verifying_gateway(event)),
        );
        usecase.handle_event(b"{}", "t=1,v1=ok").await.unwrap();
    }
}
