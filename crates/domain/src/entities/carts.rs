use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{cart_items, carts};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = carts)]
pub struct CartEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = carts)]
pub struct InsertCartEntity {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = cart_items)]
pub struct CartItemEntity {
    pub id: i64,
    pub cart_id: i64,
    pub movie_id: i64,
    pub quantity: i32,
    /// Unit price snapshot taken when the movie was added to the cart.
    pub price_minor: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cart_items)]
pub struct InsertCartItemEntity {
    pub cart_id: i64,
    pub movie_id: i64,
    pub quantity: i32,
    pub price_minor: i32,
}
