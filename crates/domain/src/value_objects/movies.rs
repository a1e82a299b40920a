use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::movies::MovieEntity;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Catalog listing filter, bound to query parameters by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    pub search: Option<String>,
    pub year: Option<i32>,
    pub genre_id: Option<i64>,
    pub min_price_minor: Option<i32>,
    pub max_price_minor: Option<i32>,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummaryDto {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub price_minor: i32,
    pub imdb_score: Option<f64>,
}

impl From<MovieEntity> for MovieSummaryDto {
    fn from(entity: MovieEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            year: entity.year,
            price_minor: entity.price_minor,
            imdb_score: entity.imdb_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetailDto {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub year: i32,
    pub duration_min: Option<i32>,
    pub price_minor: i32,
    pub imdb_score: Option<f64>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub stars: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoviePageDto {
    pub items: Vec<MovieSummaryDto>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
