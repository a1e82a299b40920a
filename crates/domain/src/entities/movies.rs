use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::schema::{directors, genres, movies, stars};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = movies)]
pub struct MovieEntity {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub year: i32,
    pub duration_min: Option<i32>,
    pub price_minor: i32,
    pub imdb_score: Option<f64>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = movies)]
pub struct InsertMovieEntity {
    pub title: String,
    pub description: Option<String>,
    pub year: i32,
    pub duration_min: Option<i32>,
    pub price_minor: i32,
    pub is_available: bool,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = genres)]
pub struct GenreEntity {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = directors)]
pub struct DirectorEntity {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = stars)]
pub struct StarEntity {
    pub id: i64,
    pub name: String,
}
