use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{delete, insert_into, prelude::*};
use uuid::Uuid;

use crate::postgres::postgres_connection::PgPoolSquad;
use domain::{
    entities::tokens::{
        ActivationTokenEntity, InsertActivationTokenEntity, InsertPasswordResetTokenEntity,
        InsertRefreshTokenEntity, PasswordResetTokenEntity, RefreshTokenEntity,
    },
    repositories::tokens::TokenRepository,
    schema::{activation_tokens, password_reset_tokens, refresh_tokens},
};

pub struct TokensPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TokensPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl TokenRepository for TokensPostgres {
    async fn insert_activation_token(&self, token: InsertActivationTokenEntity) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(activation_tokens::table)
            .values(&token)
            .returning(activation_tokens::id)
            .get_result::<i64>(&mut conn)?;

        Ok(id)
    }

    async fn find_activation_token(&self, token: &str) -> Result<Option<ActivationTokenEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = activation_tokens::table
            .filter(activation_tokens::token.eq(token))
            .select(ActivationTokenEntity::as_select())
            .first::<ActivationTokenEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn delete_activation_token(&self, token_id: i64) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(activation_tokens::table.find(token_id)).execute(&mut conn)?;

        Ok(())
    }

    async fn upsert_password_reset_token(
        &self,
        token: InsertPasswordResetTokenEntity,
    ) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // One outstanding reset token per user (unique user_id).
        let id = insert_into(password_reset_tokens::table)
            .values(&token)
            .on_conflict(password_reset_tokens::user_id)
            .do_update()
            .set((
                password_reset_tokens::token.eq(&token.token),
                password_reset_tokens::expires_at.eq(token.expires_at),
            ))
            .returning(password_reset_tokens::id)
            .get_result::<i64>(&mut conn)?;

        Ok(id)
    }

    async fn find_password_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetTokenEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = password_reset_tokens::table
            .filter(password_reset_tokens::token.eq(token))
            .select(PasswordResetTokenEntity::as_select())
            .first::<PasswordResetTokenEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn delete_password_reset_token(&self, token_id: i64) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(password_reset_tokens::table.find(token_id)).execute(&mut conn)?;

        Ok(())
    }

    async fn insert_refresh_token(&self, token: InsertRefreshTokenEntity) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(refresh_tokens::table)
            .values(&token)
            .returning(refresh_tokens::id)
            .get_result::<i64>(&mut conn)?;

        Ok(id)
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = refresh_tokens::table
            .filter(refresh_tokens::token.eq(token))
            .select(RefreshTokenEntity::as_select())
            .first::<RefreshTokenEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn delete_refresh_token(&self, token: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let removed = delete(refresh_tokens::table.filter(refresh_tokens::token.eq(token)))
            .execute(&mut conn)?;

        Ok(removed > 0)
    }

    async fn delete_refresh_tokens_for_user(&self, user_id: Uuid) -> Result<u64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let removed = delete(refresh_tokens::table.filter(refresh_tokens::user_id.eq(user_id)))
            .execute(&mut conn)?;

        Ok(removed as u64)
    }

    async fn delete_expired_tokens(&self) -> Result<u64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let mut removed = delete(
            activation_tokens::table.filter(activation_tokens::expires_at.lt(now)),
        )
        .execute(&mut conn)?;
        removed += delete(
            password_reset_tokens::table.filter(password_reset_tokens::expires_at.lt(now)),
        )
        .execute(&mut conn)?;
        removed += delete(refresh_tokens::table.filter(refresh_tokens::expires_at.lt(now)))
            .execute(&mut conn)?;

        Ok(removed as u64)
    }
}
