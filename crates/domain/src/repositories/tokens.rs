use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::tokens::{
    ActivationTokenEntity, InsertActivationTokenEntity, InsertPasswordResetTokenEntity,
    InsertRefreshTokenEntity, PasswordResetTokenEntity, RefreshTokenEntity,
};

#[automock]
#[async_trait]
pub trait TokenRepository {
    async fn insert_activation_token(&self, token: InsertActivationTokenEntity) -> Result<i64>;

    async fn find_activation_token(&self, token: &str) -> Result<Option<ActivationTokenEntity>>;

    async fn delete_activation_token(&self, token_id: i64) -> Result<()>;

    /// Replaces any outstanding reset token for the same user.
    async fn upsert_password_reset_token(
        &self,
        token: InsertPasswordResetTokenEntity,
    ) -> Result<i64>;

    async fn find_password_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetTokenEntity>>;

    async fn delete_password_reset_token(&self, token_id: i64) -> Result<()>;

    async fn insert_refresh_token(&self, token: InsertRefreshTokenEntity) -> Result<i64>;

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenEntity>>;

    /// Returns `true` when a row was actually removed.
    async fn delete_refresh_token(&self, token: &str) -> Result<bool>;

    async fn delete_refresh_tokens_for_user(&self, user_id: Uuid) -> Result<u64>;

    /// Sweeps expired rows from all three token tables.
    async fn delete_expired_tokens(&self) -> Result<u64>;
}
