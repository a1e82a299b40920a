use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::error;

use crate::axum_http::error_responses::error_response;
use application::usecases::movies::MovieUseCase;
use domain::{
    repositories::movies::MovieRepository,
    value_objects::movies::{DEFAULT_PAGE_SIZE, MovieFilter},
};
use infra::postgres::{
    postgres_connection::PgPoolSquad, repositories::movies::MoviesPostgres,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let movies_repository = MoviesPostgres::new(Arc::clone(&db_pool));
    let movies_usecase = MovieUseCase::new(Arc::new(movies_repository));

    Router::new()
        .route("/", get(list))
        .route("/:movie_id", get(detail))
        .with_state(Arc::new(movies_usecase))
}

#[derive(Debug, Deserialize)]
pub struct MovieListQuery {
    pub search: Option<String>,
    pub year: Option<i32>,
    pub genre_id: Option<i64>,
    pub min_price_minor: Option<i32>,
    pub max_price_minor: Option<i32>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl From<MovieListQuery> for MovieFilter {
    fn from(query: MovieListQuery) -> Self {
        MovieFilter {
            search: query.search,
            year: query.year,
            genre_id: query.genre_id,
            min_price_minor: query.min_price_minor,
            max_price_minor: query.max_price_minor,
            page: query.page.unwrap_or(1),
            page_size: query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

pub async fn list<M>(
    State(movies_usecase): State<Arc<MovieUseCase<M>>>,
    Query(query): Query<MovieListQuery>,
) -> impl IntoResponse
where
    M: MovieRepository + Send + Sync + 'static,
{
    match movies_usecase.list(query.into()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                error!(error = ?e, "movies: list failed");
            }
            error_response(status, &e.to_string())
        }
    }
}

pub async fn detail<M>(
    State(movies_usecase): State<Arc<MovieUseCase<M>>>,
    Path(movie_id): Path<i64>,
) -> impl IntoResponse
where
    M: MovieRepository + Send + Sync + 'static,
{
    match movies_usecase.detail(movie_id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                error!(movie_id, error = ?e, "movies: detail failed");
            }
            error_response(status, &e.to_string())
        }
    }
}
