use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::users::{InsertUserEntity, UserEntity};

#[automock]
#[async_trait]
pub trait UserRepository {
    /// Returns `None` when the email is already taken.
    async fn create_user(&self, user: InsertUserEntity) -> Result<Option<Uuid>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;

    async fn activate_user(&self, user_id: Uuid) -> Result<()>;

    async fn update_password(&self, user_id: Uuid, password_hash: String) -> Result<()>;
}
