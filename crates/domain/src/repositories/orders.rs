use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::orders::{OrderEntity, OrderItemEntity};
use crate::value_objects::orders::NewOrderItem;

#[automock]
#[async_trait]
pub trait OrderRepository {
    /// Inserts the order and its line items and clears the user's cart,
    /// all in one transaction. The order is durable when this returns.
    async fn create_order_from_cart(
        &self,
        user_id: Uuid,
        total_minor: i32,
        items: Vec<NewOrderItem>,
    ) -> Result<i64>;

    async fn find_order_by_id(&self, order_id: i64) -> Result<Option<OrderEntity>>;

    async fn list_order_items(&self, order_id: i64) -> Result<Vec<OrderItemEntity>>;

    async fn list_orders_by_user(&self, user_id: Uuid) -> Result<Vec<OrderEntity>>;

    async fn has_paid_order_with_movie(&self, user_id: Uuid, movie_id: i64) -> Result<bool>;

    async fn has_pending_order_with_movie(&self, user_id: Uuid, movie_id: i64) -> Result<bool>;

    /// Guarded transition pending -> paid. Returns `false` when the
    /// order was not pending (already applied, or canceled).
    async fn mark_order_paid(&self, order_id: i64) -> Result<bool>;

    /// Guarded transition pending -> canceled.
    async fn mark_order_canceled(&self, order_id: i64) -> Result<bool>;
}
