use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::orders::{OrderEntity, OrderItemEntity};
use crate::value_objects::enums::order_statuses::OrderStatus;

/// Line item captured from a cart snapshot, before the order id exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub movie_id: i64,
    pub quantity: i32,
    pub price_minor: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemDto {
    pub movie_id: i64,
    pub quantity: i32,
    pub price_minor: i32,
}

impl From<OrderItemEntity> for OrderItemDto {
    fn from(entity: OrderItemEntity) -> Self {
        Self {
            movie_id: entity.movie_id,
            quantity: entity.quantity,
            price_minor: entity.price_minor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: i64,
    pub status: OrderStatus,
    pub total_minor: i32,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemDto>,
}

impl OrderDto {
    pub fn from_entity(order: OrderEntity, items: Vec<OrderItemEntity>) -> Self {
        Self {
            id: order.id,
            status: OrderStatus::from_str(&order.status).unwrap_or(OrderStatus::Pending),
            total_minor: order.total_minor,
            created_at: order.created_at,
            items: items.into_iter().map(OrderItemDto::from).collect(),
        }
    }
}

/// Result of a successful checkout: the durable order plus the
/// client-facing payment handle from the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutDto {
    pub order_id: i64,
    pub total_minor: i32,
    pub excluded_movie_ids: Vec<i64>,
    pub client_secret: String,
}
