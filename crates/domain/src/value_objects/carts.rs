use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemDto {
    pub movie_id: i64,
    pub title: String,
    pub quantity: i32,
    pub price_minor: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartDto {
    pub items: Vec<CartItemDto>,
    pub total_minor: i64,
}

impl CartDto {
    pub fn from_items(items: Vec<CartItemDto>) -> Self {
        let total_minor = items
            .iter()
            .map(|item| i64::from(item.price_minor) * i64::from(item.quantity))
            .sum();
        Self { items, total_minor }
    }
}
