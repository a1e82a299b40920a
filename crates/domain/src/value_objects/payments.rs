use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::payments::PaymentEntity;
use crate::value_objects::enums::payment_statuses::PaymentStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDto {
    pub id: i64,
    pub order_id: i64,
    pub amount_minor: i32,
    pub status: PaymentStatus,
    pub provider_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentEntity> for PaymentDto {
    fn from(entity: PaymentEntity) -> Self {
        Self {
            id: entity.id,
            order_id: entity.order_id,
            amount_minor: entity.amount_minor,
            status: PaymentStatus::from_str(&entity.status).unwrap_or(PaymentStatus::Pending),
            provider_payment_id: entity.provider_payment_id,
            created_at: entity.created_at,
        }
    }
}
