use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{Connection, delete, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::postgres::postgres_connection::PgPoolSquad;
use domain::{
    entities::orders::{InsertOrderEntity, InsertOrderItemEntity, OrderEntity, OrderItemEntity},
    repositories::orders::OrderRepository,
    schema::{cart_items, carts, order_items, orders},
    value_objects::{enums::order_statuses::OrderStatus, orders::NewOrderItem},
};

pub struct OrdersPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl OrdersPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl OrderRepository for OrdersPostgres {
    async fn create_order_from_cart(
        &self,
        user_id: Uuid,
        total_minor: i32,
        items: Vec<NewOrderItem>,
    ) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let order_id = conn.transaction::<i64, diesel::result::Error, _>(|tx| {
            let order_id: i64 = insert_into(orders::table)
                .values(&InsertOrderEntity {
                    user_id,
                    status: OrderStatus::Pending.to_string(),
                    total_minor,
                })
                .returning(orders::id)
                .get_result::<i64>(tx)?;

            let line_items: Vec<InsertOrderItemEntity> = items
                .iter()
                .map(|item| InsertOrderItemEntity {
                    order_id,
                    movie_id: item.movie_id,
                    quantity: item.quantity,
                    price_minor: item.price_minor,
                })
                .collect();
            insert_into(order_items::table)
                .values(&line_items)
                .execute(tx)?;

            // The whole cart empties, excluded items included; they are
            // reported back to the caller, not silently kept.
            let cart_ids = carts::table
                .filter(carts::user_id.eq(user_id))
                .select(carts::id);
            delete(cart_items::table.filter(cart_items::cart_id.eq_any(cart_ids)))
                .execute(tx)?;

            Ok(order_id)
        })?;

        Ok(order_id)
    }

    async fn find_order_by_id(&self, order_id: i64) -> Result<Option<OrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = orders::table
            .find(order_id)
            .select(OrderEntity::as_select())
            .first::<OrderEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_order_items(&self, order_id: i64) -> Result<Vec<OrderItemEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = order_items::table
            .filter(order_items::order_id.eq(order_id))
            .select(OrderItemEntity::as_select())
            .order(order_items::id.asc())
            .load::<OrderItemEntity>(&mut conn)?;

        Ok(result)
    }

    async fn list_orders_by_user(&self, user_id: Uuid) -> Result<Vec<OrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = orders::table
            .filter(orders::user_id.eq(user_id))
            .select(OrderEntity::as_select())
            .order(orders::created_at.desc())
            .load::<OrderEntity>(&mut conn)?;

        Ok(result)
    }

    async fn has_paid_order_with_movie(&self, user_id: Uuid, movie_id: i64) -> Result<bool> {
        self.has_order_with_movie(user_id, movie_id, OrderStatus::Paid)
            .await
    }

    async fn has_pending_order_with_movie(&self, user_id: Uuid, movie_id: i64) -> Result<bool> {
        self.has_order_with_movie(user_id, movie_id, OrderStatus::Pending)
            .await
    }

    async fn mark_order_paid(&self, order_id: i64) -> Result<bool> {
        self.transition(order_id, OrderStatus::Pending, OrderStatus::Paid)
            .await
    }

    async fn mark_order_canceled(&self, order_id: i64) -> Result<bool> {
        self.transition(order_id, OrderStatus::Pending, OrderStatus::Canceled)
            .await
    }
}

impl OrdersPostgres {
    async fn has_order_with_movie(
        &self,
        user_id: Uuid,
        movie_id: i64,
        status: OrderStatus,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count: i64 = order_items::table
            .inner_join(orders::table)
            .filter(orders::user_id.eq(user_id))
            .filter(orders::status.eq(status.to_string()))
            .filter(order_items::movie_id.eq(movie_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count > 0)
    }

    /// Guarded status move. Matching on the current status makes the
    /// update idempotent under concurrent webhook deliveries.
    async fn transition(&self, order_id: i64, from: OrderStatus, to: OrderStatus) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let moved = update(
            orders::table
                .find(order_id)
                .filter(orders::status.eq(from.to_string())),
        )
        .set(orders::status.eq(to.to_string()))
        .execute(&mut conn)?;

        Ok(moved > 0)
    }
}
