use std::sync::Arc;

use thiserror::Error;
use tracing::error;

use domain::{
    repositories::movies::MovieRepository,
    value_objects::movies::{
        DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MovieDetailDto, MovieFilter, MoviePageDto,
        MovieSummaryDto,
    },
};

#[derive(Debug, Error)]
pub enum MovieError {
    #[error("{0}")]
    Validation(String),
    #[error("movie not found")]
    NotFound,
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl MovieError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            MovieError::Validation(_) => StatusCode::BAD_REQUEST,
            MovieError::NotFound => StatusCode::NOT_FOUND,
            MovieError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct MovieUseCase<M>
where
    M: MovieRepository + Send + Sync + 'static,
{
    movie_repo: Arc<M>,
}

impl<M> MovieUseCase<M>
where
    M: MovieRepository + Send + Sync + 'static,
{
    pub fn new(movie_repo: Arc<M>) -> Self {
        Self { movie_repo }
    }

    pub async fn list(&self, mut filter: MovieFilter) -> Result<MoviePageDto, MovieError> {
        if filter.page < 1 {
            filter.page = 1;
        }
        if filter.page_size < 1 {
            filter.page_size = DEFAULT_PAGE_SIZE;
        }
        if filter.page_size > MAX_PAGE_SIZE {
            return Err(MovieError::Validation(format!(
                "page_size must be <= {}",
                MAX_PAGE_SIZE
            )));
        }
        if let (Some(min), Some(max)) = (filter.min_price_minor, filter.max_price_minor) {
            if min > max {
                return Err(MovieError::Validation(
                    "min_price must not exceed max_price".to_string(),
                ));
            }
        }

        let total = self
            .movie_repo
            .count_movies(filter.clone())
            .await
            .map_err(|err| {
                error!(db_error = ?err, "movies: failed to count catalog page");
                MovieError::Internal(err)
            })?;
        let items = self
            .movie_repo
            .list_movies(filter.clone())
            .await
            .map_err(|err| {
                error!(db_error = ?err, "movies: failed to load catalog page");
                MovieError::Internal(err)
            })?;

        Ok(MoviePageDto {
            items: items.into_iter().map(MovieSummaryDto::from).collect(),
            total,
            page: filter.page,
            page_size: filter.page_size,
        })
    }

    pub async fn detail(&self, movie_id: i64) -> Result<MovieDetailDto, MovieError> {
        self.movie_repo
            .find_movie_detail(movie_id)
            .await
            .map_err(|err| {
                error!(movie_id, db_error = ?err, "movies: failed to load movie detail");
                MovieError::Internal(err)
            })?
            .ok_or(MovieError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::repositories::movies::MockMovieRepository;

    #[tokio::test]
    async fn list_caps_page_size() {
        let usecase = MovieUseCase::new(Arc::new(MockMovieRepository::new()));
        let filter = MovieFilter {
            page_size: MAX_PAGE_SIZE + 1,
            ..MovieFilter::default()
        };
        assert!(matches!(
            usecase.list(filter).await,
            Err(MovieError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn list_normalizes_page_and_page_size() {
        let mut repo = MockMovieRepository::new();
        repo.expect_count_movies()
            .withf(|f| f.page == 1 && f.page_size == DEFAULT_PAGE_SIZE)
            .returning(|_| Ok(0));
        repo.expect_list_movies()
            .withf(|f| f.page == 1 && f.page_size == DEFAULT_PAGE_SIZE)
            .returning(|_| Ok(vec![]));

        let usecase = MovieUseCase::new(Arc::new(repo));
        let page = usecase.list(MovieFilter::default()).await.unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.page, 1);
    }

    #[tokio::test]
    async fn missing_movie_is_not_found() {
        let mut repo = MockMovieRepository::new();
        repo.expect_find_movie_detail().returning(|_| Ok(None));

        let usecase = MovieUseCase::new(Arc::new(repo));
        assert!(matches!(
            usecase.detail(404).await,
            Err(MovieError::NotFound)
        ));
    }
}
