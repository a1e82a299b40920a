use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::entities::movies::MovieEntity;
use crate::value_objects::movies::{MovieDetailDto, MovieFilter};

#[automock]
#[async_trait]
pub trait MovieRepository {
    async fn list_movies(&self, filter: MovieFilter) -> Result<Vec<MovieEntity>>;

    async fn count_movies(&self, filter: MovieFilter) -> Result<i64>;

    async fn find_available_movie_by_id(&self, movie_id: i64) -> Result<Option<MovieEntity>>;

    async fn find_movie_detail(&self, movie_id: i64) -> Result<Option<MovieDetailDto>>;
}
