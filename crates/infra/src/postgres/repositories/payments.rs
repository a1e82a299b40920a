use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{insert_into, prelude::*, update};

use crate::postgres::postgres_connection::PgPoolSquad;
use domain::{
    entities::payments::{InsertPaymentEntity, PaymentEntity},
    repositories::payments::PaymentRepository,
    schema::payments,
    value_objects::enums::payment_statuses::PaymentStatus,
};

pub struct PaymentsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }

    async fn transition(
        &self,
        payment_id: i64,
        from: PaymentStatus,
        to: PaymentStatus,
        error: Option<&str>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let moved = update(
            payments::table
                .find(payment_id)
                .filter(payments::status.eq(from.to_string())),
        )
        .set((
            payments::status.eq(to.to_string()),
            payments::error.eq(error),
            payments::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(moved > 0)
    }
}

#[async_trait]
impl PaymentRepository for PaymentsPostgres {
    async fn record_payment(&self, payment: InsertPaymentEntity) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(payments::table)
            .values(&payment)
            .returning(payments::id)
            .get_result::<i64>(&mut conn)?;

        Ok(id)
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payments::table
            .filter(payments::provider_payment_id.eq(provider_payment_id))
            .order(payments::created_at.desc())
            .select(PaymentEntity::as_select())
            .first::<PaymentEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_succeeded_payment_by_order(
        &self,
        order_id: i64,
    ) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payments::table
            .filter(payments::order_id.eq(order_id))
            .filter(payments::status.eq(PaymentStatus::Succeeded.to_string()))
            .select(PaymentEntity::as_select())
            .first::<PaymentEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_payments_by_order(&self, order_id: i64) -> Result<Vec<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payments::table
            .filter(payments::order_id.eq(order_id))
            .select(PaymentEntity::as_select())
            .order(payments::created_at.desc())
            .load::<PaymentEntity>(&mut conn)?;

        Ok(result)
    }

    async fn mark_payment_succeeded(&self, payment_id: i64) -> Result<bool> {
        self.transition(payment_id, PaymentStatus::Pending, PaymentStatus::Succeeded, None)
            .await
    }

    async fn mark_payment_failed(&self, payment_id: i64, error: &str) -> Result<bool> {
        self.transition(
            payment_id,
            PaymentStatus::Pending,
            PaymentStatus::Failed,
            Some(error),
        )
        .await
    }

    async fn mark_payment_refunded(&self, payment_id: i64) -> Result<bool> {
        self.transition(
            payment_id,
            PaymentStatus::Succeeded,
            PaymentStatus::Refunded,
            None,
        )
        .await
    }
}
