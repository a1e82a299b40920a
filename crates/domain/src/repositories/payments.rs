use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::entities::payments::{InsertPaymentEntity, PaymentEntity};

#[automock]
#[async_trait]
pub trait PaymentRepository {
    async fn record_payment(&self, payment: InsertPaymentEntity) -> Result<i64>;

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<PaymentEntity>>;

    async fn find_succeeded_payment_by_order(
        &self,
        order_id: i64,
    ) -> Result<Option<PaymentEntity>>;

    async fn list_payments_by_order(&self, order_id: i64) -> Result<Vec<PaymentEntity>>;

    /// Guarded transition pending -> succeeded. `false` means the row
    /// had already left pending (duplicate webhook delivery).
    async fn mark_payment_succeeded(&self, payment_id: i64) -> Result<bool>;

    /// Guarded transition pending -> failed, recording the gateway error.
    async fn mark_payment_failed(&self, payment_id: i64, error: &str) -> Result<bool>;

    /// Guarded transition succeeded -> refunded.
    async fn mark_payment_refunded(&self, payment_id: i64) -> Result<bool>;
}
