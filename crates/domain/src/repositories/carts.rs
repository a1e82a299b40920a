use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::carts::{CartItemEntity, InsertCartItemEntity};
use crate::value_objects::carts::CartItemDto;

#[automock]
#[async_trait]
pub trait CartRepository {
    async fn find_or_create_cart(&self, user_id: Uuid) -> Result<i64>;

    /// Returns `None` when the movie is already in the cart
    /// (unique cart_id + movie_id).
    async fn add_item(&self, item: InsertCartItemEntity) -> Result<Option<i64>>;

    async fn remove_item(&self, user_id: Uuid, movie_id: i64) -> Result<bool>;

    async fn list_items(&self, user_id: Uuid) -> Result<Vec<CartItemEntity>>;

    /// Items joined with their movie titles, for the cart view.
    async fn list_items_with_titles(&self, user_id: Uuid) -> Result<Vec<CartItemDto>>;
}
