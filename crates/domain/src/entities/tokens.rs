use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{activation_tokens, password_reset_tokens, refresh_tokens};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = activation_tokens)]
pub struct ActivationTokenEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = activation_tokens)]
pub struct InsertActivationTokenEntity {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = password_reset_tokens)]
pub struct PasswordResetTokenEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = password_reset_tokens)]
pub struct InsertPasswordResetTokenEntity {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = refresh_tokens)]
pub struct RefreshTokenEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct InsertRefreshTokenEntity {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
