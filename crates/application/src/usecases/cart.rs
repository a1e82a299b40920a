use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use domain::{
    entities::carts::InsertCartItemEntity,
    repositories::{carts::CartRepository, movies::MovieRepository},
    value_objects::carts::CartDto,
};

const MAX_QUANTITY: i32 = 10;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("{0}")]
    Validation(String),
    #[error("movie not found or unavailable")]
    MovieNotFound,
    #[error("movie is already in the cart")]
    AlreadyInCart,
    #[error("movie is not in the cart")]
    NotInCart,
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl CartError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            CartError::Validation(_) => StatusCode::BAD_REQUEST,
            CartError::MovieNotFound | CartError::NotInCart => StatusCode::NOT_FOUND,
            CartError::AlreadyInCart => StatusCode::CONFLICT,
            CartError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct CartUseCase<C, M>
where
    C: CartRepository + Send + Sync + 'static,
    M: MovieRepository + Send + Sync + 'static,
{
    cart_repo: Arc<C>,
    movie_repo: Arc<M>,
}

impl<C, M> CartUseCase<C, M>
where
    C: CartRepository + Send + Sync + 'static,
    M: MovieRepository + Send + Sync + 'static,
{
    pub fn new(cart_repo: Arc<C>, movie_repo: Arc<M>) -> Self {
        Self {
            cart_repo,
            movie_repo,
        }
    }

    /// Adds a movie with its unit price snapshotted at add time; the
    /// checkout total is computed from these snapshots, not live prices.
    pub async fn add_movie(
        &self,
        user_id: Uuid,
        movie_id: i64,
        quantity: i32,
    ) -> Result<CartDto, CartError> {
        if quantity < 1 || quantity > MAX_QUANTITY {
            return Err(CartError::Validation(format!(
                "quantity must be between 1 and {}",
                MAX_QUANTITY
            )));
        }

        let movie = self
            .movie_repo
            .find_available_movie_by_id(movie_id)
            .await
            .map_err(CartError::Internal)?
            .ok_or(CartError::MovieNotFound)?;

        let cart_id = self
            .cart_repo
            .find_or_create_cart(user_id)
            .await
            .map_err(CartError::Internal)?;

        let inserted = self
            .cart_repo
            .add_item(InsertCartItemEntity {
                cart_id,
                movie_id,
                quantity,
                price_minor: movie.price_minor,
            })
            .await
            .map_err(CartError::Internal)?;

        if inserted.is_none() {
            return Err(CartError::AlreadyInCart);
        }

        info!(%user_id, movie_id, quantity, "cart: movie added");
        self.view(user_id).await
    }

    pub async fn remove_movie(&self, user_id: Uuid, movie_id: i64) -> Result<CartDto, CartError> {
        let removed = self
            .cart_repo
            .remove_item(user_id, movie_id)
            .await
            .map_err(CartError::Internal)?;
        if !removed {
            return Err(CartError::NotInCart);
        }

        info!(%user_id, movie_id, "cart: movie removed");
        self.view(user_id).await
    }

    pub async fn view(&self, user_id: Uuid) -> Result<CartDto, CartError> {
        let items = self
            .cart_repo
            .list_items_with_titles(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "cart: failed to load items");
                CartError::Internal(err)
            })?;
        Ok(CartDto::from_items(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::entities::movies::MovieEntity;
    use domain::repositories::{carts::MockCartRepository, movies::MockMovieRepository};
    use domain::value_objects::carts::CartItemDto;

    fn movie(id: i64, price_minor: i32) -> MovieEntity {
        MovieEntity {
            id,
            title: "Inception".to_string(),
            description: None,
            year: 2010,
            duration_min: Some(148),
            price_minor,
            imdb_score: Some(8.8),
            is_available: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn add_rejects_zero_quantity() {
        let usecase = CartUseCase::new(
            Arc::new(MockCartRepository::new()),
            Arc::new(MockMovieRepository::new()),
        );
        let err = usecase.add_movie(Uuid::new_v4(), 1, 0).await;
        assert!(matches!(err, Err(CartError::Validation(_))));
    }

    #[tokio::test]
    async fn add_snapshots_movie_price() {
        let mut movie_repo = MockMovieRepository::new();
        movie_repo
            .expect_find_available_movie_by_id()
            .returning(|id| Ok(Some(movie(id, 999))));

        let mut cart_repo = MockCartRepository::new();
        cart_repo.expect_find_or_create_cart().returning(|_| Ok(5));
        cart_repo
            .expect_add_item()
            .withf(|item| item.cart_id == 5 && item.price_minor == 999 && item.quantity == 2)
            .returning(|_| Ok(Some(1)));
        cart_repo.expect_list_items_with_titles().returning(|_| {
            Ok(vec![CartItemDto {
                movie_id: 1,
                title: "Inception".to_string(),
                quantity: 2,
                price_minor: 999,
                added_at: Utc::now(),
            }])
        });

        let usecase = CartUseCase::new(Arc::new(cart_repo), Arc::new(movie_repo));
        let cart = usecase.add_movie(Uuid::new_v4(), 1, 2).await.unwrap();
        assert_eq!(cart.total_minor, 1998);
    }

    #[tokio::test]
    async fn duplicate_movie_is_a_conflict() {
        let mut movie_repo = MockMovieRepository::new();
        movie_repo
            .expect_find_available_movie_by_id()
            .returning(|id| Ok(Some(movie(id, 999))));

        let mut cart_repo = MockCartRepository::new();
        cart_repo.expect_find_or_create_cart().returning(|_| Ok(5));
        cart_repo.expect_add_item().returning(|_| Ok(None));

        let usecase = CartUseCase::new(Arc::new(cart_repo), Arc::new(movie_repo));
        let err = usecase.add_movie(Uuid::new_v4(), 1, 1).await;
        assert!(matches!(err, Err(CartError::AlreadyInCart)));
    }

    #[tokio::test]
    async fn removing_absent_movie_is_not_found() {
        let mut cart_repo = MockCartRepository::new();
        cart_repo.expect_remove_item().returning(|_, _| Ok(false));

        let usecase = CartUseCase::new(Arc::new(cart_repo), Arc::new(MockMovieRepository::new()));
        let err = usecase.remove_movie(Uuid::new_v4(), 1).await;
        assert!(matches!(err, Err(CartError::NotInCart)));
    }
}
