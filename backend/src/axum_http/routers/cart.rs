use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use tracing::error;

use crate::{auth::AuthUser, axum_http::error_responses::error_response};
use application::usecases::cart::{CartError, CartUseCase};
use domain::repositories::{carts::CartRepository, movies::MovieRepository};
use infra::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{carts::CartsPostgres, movies::MoviesPostgres},
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let carts_repository = CartsPostgres::new(Arc::clone(&db_pool));
    let movies_repository = MoviesPostgres::new(Arc::clone(&db_pool));
    let cart_usecase = CartUseCase::new(Arc::new(carts_repository), Arc::new(movies_repository));

    Router::new()
        .route("/", get(view))
        .route("/items", post(add_item))
        .route("/items/:movie_id", delete(remove_item))
        .with_state(Arc::new(cart_usecase))
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub movie_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn cart_error_response(context: &str, err: CartError) -> axum::response::Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(context, error = ?err, "cart: request failed");
    }
    error_response(status, &err.to_string())
}

pub async fn view<C, M>(
    State(cart_usecase): State<Arc<CartUseCase<C, M>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    C: CartRepository + Send + Sync + 'static,
    M: MovieRepository + Send + Sync + 'static,
{
    match cart_usecase.view(auth.user_id).await {
        Ok(cart) => (StatusCode::OK, Json(cart)).into_response(),
        Err(e) => cart_error_response("view", e),
    }
}

pub async fn add_item<C, M>(
    State(cart_usecase): State<Arc<CartUseCase<C, M>>>,
    auth: AuthUser,
    Json(payload): Json<AddItemRequest>,
) -> impl IntoResponse
where
    C: CartRepository + Send + Sync + 'static,
    M: MovieRepository + Send + Sync + 'static,
{
    match cart_usecase
        .add_movie(auth.user_id, payload.movie_id, payload.quantity)
        .await
    {
        Ok(cart) => (StatusCode::CREATED, Json(cart)).into_response(),
        Err(e) => cart_error_response("add_item", e),
    }
}

pub async fn remove_item<C, M>(
    State(cart_usecase): State<Arc<CartUseCase<C, M>>>,
    auth: AuthUser,
    Path(movie_id): Path<i64>,
) -> impl IntoResponse
where
    C: CartRepository + Send + Sync + 'static,
    M: MovieRepository + Send + Sync + 'static,
{
    match cart_usecase.remove_movie(auth.user_id, movie_id).await {
        Ok(cart) => (StatusCode::OK, Json(cart)).into_response(),
        Err(e) => cart_error_response("remove_item", e),
    }
}
