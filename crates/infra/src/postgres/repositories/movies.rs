use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;

use crate::postgres::postgres_connection::PgPoolSquad;
use domain::{
    entities::movies::MovieEntity,
    repositories::movies::MovieRepository,
    schema::{directors, genres, movie_directors, movie_genres, movie_stars, movies, stars},
    value_objects::movies::{MovieDetailDto, MovieFilter},
};

pub struct MoviesPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MoviesPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

type BoxedMovieQuery<'a> = movies::BoxedQuery<'a, diesel::pg::Pg>;

/// Shared filter stem for the listing and its count, so the page and
/// the total can never disagree.
fn filtered(filter: &MovieFilter) -> BoxedMovieQuery<'_> {
    let mut query = movies::table
        .filter(movies::is_available.eq(true))
        .into_boxed();

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search.replace('%', "\\%").replace('_', "\\_"));
        query = query.filter(
            movies::title
                .ilike(pattern.clone())
                .or(movies::description.ilike(pattern)),
        );
    }

    if let Some(year) = filter.year {
        query = query.filter(movies::year.eq(year));
    }

    if let Some(genre_id) = filter.genre_id {
        let movie_ids = movie_genres::table
            .filter(movie_genres::genre_id.eq(genre_id))
            .select(movie_genres::movie_id);
        query = query.filter(movies::id.eq_any(movie_ids));
    }

    if let Some(min) = filter.min_price_minor {
        query = query.filter(movies::price_minor.ge(min));
    }

    if let Some(max) = filter.max_price_minor {
        query = query.filter(movies::price_minor.le(max));
    }

    query
}

#[async_trait]
impl MovieRepository for MoviesPostgres {
    async fn list_movies(&self, filter: MovieFilter) -> Result<Vec<MovieEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let offset = (filter.page - 1).max(0) * filter.page_size;
        let result = filtered(&filter)
            .select(MovieEntity::as_select())
            .order((movies::year.desc(), movies::id.desc()))
            .limit(filter.page_size)
            .offset(offset)
            .load::<MovieEntity>(&mut conn)?;

        Ok(result)
    }

    async fn count_movies(&self, filter: MovieFilter) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = filtered(&filter).count().get_result::<i64>(&mut conn)?;

        Ok(total)
    }

    async fn find_available_movie_by_id(&self, movie_id: i64) -> Result<Option<MovieEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = movies::table
            .find(movie_id)
            .filter(movies::is_available.eq(true))
            .select(MovieEntity::as_select())
            .first::<MovieEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_movie_detail(&self, movie_id: i64) -> Result<Option<MovieDetailDto>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let Some(movie) = movies::table
            .find(movie_id)
            .filter(movies::is_available.eq(true))
            .select(MovieEntity::as_select())
            .first::<MovieEntity>(&mut conn)
            .optional()?
        else {
            return Ok(None);
        };

        let genre_names = movie_genres::table
            .inner_join(genres::table)
            .filter(movie_genres::movie_id.eq(movie_id))
            .order(genres::name.asc())
            .select(genres::name)
            .load::<String>(&mut conn)?;

        let director_names = movie_directors::table
            .inner_join(directors::table)
            .filter(movie_directors::movie_id.eq(movie_id))
            .order(directors::name.asc())
            .select(directors::name)
            .load::<String>(&mut conn)?;

        let star_names = movie_stars::table
            .inner_join(stars::table)
            .filter(movie_stars::movie_id.eq(movie_id))
            .order(stars::name.asc())
            .select(stars::name)
            .load::<String>(&mut conn)?;

        Ok(Some(MovieDetailDto {
            id: movie.id,
            title: movie.title,
            description: movie.description,
            year: movie.year,
            duration_min: movie.duration_min,
            price_minor: movie.price_minor,
            imdb_score: movie.imdb_score,
            genres: genre_names,
            directors: director_names,
            stars: star_names,
            created_at: movie.created_at,
        }))
    }
}
