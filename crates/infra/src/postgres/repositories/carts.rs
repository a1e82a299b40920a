use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{delete, insert_into, prelude::*};
use uuid::Uuid;

use crate::postgres::postgres_connection::PgPoolSquad;
use domain::{
    entities::carts::{CartItemEntity, InsertCartEntity, InsertCartItemEntity},
    repositories::carts::CartRepository,
    schema::{cart_items, carts, movies},
    value_objects::carts::CartItemDto,
};

pub struct CartsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CartsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CartRepository for CartsPostgres {
    async fn find_or_create_cart(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        if let Some(cart_id) = carts::table
            .filter(carts::user_id.eq(user_id))
            .select(carts::id)
            .first::<i64>(&mut conn)
            .optional()?
        {
            return Ok(cart_id);
        }

        // Concurrent first-adds race here; the unique user_id index
        // lets one insert win and the loser re-reads.
        let inserted = insert_into(carts::table)
            .values(&InsertCartEntity { user_id })
            .on_conflict(carts::user_id)
            .do_nothing()
            .returning(carts::id)
            .get_result::<i64>(&mut conn)
            .optional()?;

        match inserted {
            Some(cart_id) => Ok(cart_id),
            None => {
                let cart_id = carts::table
                    .filter(carts::user_id.eq(user_id))
                    .select(carts::id)
                    .first::<i64>(&mut conn)?;
                Ok(cart_id)
            }
        }
    }

    async fn add_item(&self, item: InsertCartItemEntity) -> Result<Option<i64>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(cart_items::table)
            .values(&item)
            .on_conflict((cart_items::cart_id, cart_items::movie_id))
            .do_nothing()
            .returning(cart_items::id)
            .get_result::<i64>(&mut conn)
            .optional()?;

        Ok(inserted)
    }

    async fn remove_item(&self, user_id: Uuid, movie_id: i64) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let cart_ids = carts::table
            .filter(carts::user_id.eq(user_id))
            .select(carts::id);
        let removed = delete(
            cart_items::table
                .filter(cart_items::cart_id.eq_any(cart_ids))
                .filter(cart_items::movie_id.eq(movie_id)),
        )
        .execute(&mut conn)?;

        Ok(removed > 0)
    }

    async fn list_items(&self, user_id: Uuid) -> Result<Vec<CartItemEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = cart_items::table
            .inner_join(carts::table)
            .filter(carts::user_id.eq(user_id))
            .select(CartItemEntity::as_select())
            .order(cart_items::added_at.asc())
            .load::<CartItemEntity>(&mut conn)?;

        Ok(result)
    }

    async fn list_items_with_titles(&self, user_id: Uuid) -> Result<Vec<CartItemDto>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = cart_items::table
            .inner_join(carts::table)
            .inner_join(movies::table)
            .filter(carts::user_id.eq(user_id))
            .select((CartItemEntity::as_select(), movies::title))
            .order(cart_items::added_at.asc())
            .load::<(CartItemEntity, String)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(item, title)| CartItemDto {
                movie_id: item.movie_id,
                title,
                quantity: item.quantity,
                price_minor: item.price_minor,
                added_at: item.added_at,
            })
            .collect())
    }
}
