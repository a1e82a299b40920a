use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, distributions::Alphanumeric};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use domain::{
    entities::{
        tokens::{
            InsertActivationTokenEntity, InsertPasswordResetTokenEntity, InsertRefreshTokenEntity,
        },
        users::{InsertUserEntity, UserEntity},
    },
    repositories::{jobs::JobRepository, tokens::TokenRepository, users::UserRepository},
    value_objects::email_jobs::{EmailJobPayload, EmailKind},
};

const ACTIVATION_TOKEN_TTL_HOURS: i64 = 24;
const PASSWORD_RESET_TOKEN_TTL_HOURS: i64 = 1;
const TOKEN_LENGTH: usize = 48;
const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("email is already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account is not activated")]
    AccountInactive,
    #[error("invalid or unknown token")]
    InvalidToken,
    #[error("token has expired")]
    TokenExpired,
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::AccountInactive => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken | AuthError::TokenExpired => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Internal(err)
    }
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

pub struct AuthUseCase<U, T, J>
where
    U: UserRepository + Send + Sync + 'static,
    T: TokenRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    job_repo: Arc<J>,
}

impl<U, T, J> AuthUseCase<U, T, J>
where
    U: UserRepository + Send + Sync + 'static,
    T: TokenRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, token_repo: Arc<T>, job_repo: Arc<J>) -> Self {
        Self {
            user_repo,
            token_repo,
            job_repo,
        }
    }

    /// Creates an inactive account and enqueues the activation email.
    pub async fn register(&self, email: &str, password: &str) -> AuthResult<Uuid> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation("a valid email is required".into()));
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let password_hash = hash_password(password)?;
        let user_id = self
            .user_repo
            .create_user(InsertUserEntity {
                id: Uuid::new_v4(),
                email: email.clone(),
                password_hash,
                is_active: false,
            })
            .await?
            .ok_or(AuthError::EmailTaken)?;

        let token = generate_token();
        self.token_repo
            .insert_activation_token(InsertActivationTokenEntity {
                user_id,
                token: token.clone(),
                expires_at: Utc::now() + Duration::hours(ACTIVATION_TOKEN_TTL_HOURS),
            })
            .await?;

        self.job_repo
            .enqueue_email_job(EmailJobPayload {
                kind: EmailKind::Activation,
                recipient: email.clone(),
                token: Some(token),
                order_id: None,
                total_minor: None,
            })
            .await?;

        info!(%user_id, "auth: user registered, activation email enqueued");
        Ok(user_id)
    }

    /// Verifies the activation token and switches the account active.
    pub async fn activate(&self, token: &str) -> AuthResult<()> {
        let record = self
            .token_repo
            .find_activation_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if record.expires_at <= Utc::now() {
            self.token_repo.delete_activation_token(record.id).await?;
            return Err(AuthError::TokenExpired);
        }

        let user = self
            .user_repo
            .find_by_id(record.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal(anyhow!("activation token without user")))?;

        self.user_repo.activate_user(record.user_id).await?;
        self.token_repo.delete_activation_token(record.id).await?;

        self.job_repo
            .enqueue_email_job(EmailJobPayload {
                kind: EmailKind::ActivationComplete,
                recipient: user.email,
                token: None,
                order_id: None,
                total_minor: None,
            })
            .await?;

        info!(user_id = %record.user_id, "auth: account activated");
        Ok(())
    }

    /// Credential check for login. The caller mints the JWT pair.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> AuthResult<UserEntity> {
        let email = email.trim().to_lowercase();
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "auth: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        Ok(user)
    }

    pub async fn store_refresh_token(
        &self,
        user_id: Uuid,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        self.token_repo
            .insert_refresh_token(InsertRefreshTokenEntity {
                user_id,
                token,
                expires_at,
            })
            .await?;
        Ok(())
    }

    /// The refresh JWT must also exist in the database and belong to
    /// the user it claims, so a logout truly revokes it.
    pub async fn validate_refresh_token(&self, user_id: Uuid, token: &str) -> AuthResult<()> {
        let record = self
            .token_repo
            .find_refresh_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if record.user_id != user_id {
            warn!(%user_id, "auth: refresh token user mismatch");
            return Err(AuthError::InvalidToken);
        }
        if record.expires_at <= Utc::now() {
            return Err(AuthError::TokenExpired);
        }
        Ok(())
    }

    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        if !self.token_repo.delete_refresh_token(token).await? {
            return Err(AuthError::InvalidToken);
        }
        Ok(())
    }

    /// Always succeeds from the caller's point of view so the endpoint
    /// cannot be used to probe which emails are registered.
    pub async fn request_password_reset(&self, email: &str) -> AuthResult<()> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            info!("auth: password reset requested for unknown email");
            return Ok(());
        };

        let token = generate_token();
        self.token_repo
            .upsert_password_reset_token(InsertPasswordResetTokenEntity {
                user_id: user.id,
                token: token.clone(),
                expires_at: Utc::now() + Duration::hours(PASSWORD_RESET_TOKEN_TTL_HOURS),
            })
            .await?;

        self.job_repo
            .enqueue_email_job(EmailJobPayload {
                kind: EmailKind::PasswordReset,
                recipient: email,
                token: Some(token),
                order_id: None,
                total_minor: None,
            })
            .await?;

        info!(user_id = %user.id, "auth: password reset email enqueued");
        Ok(())
    }

    pub async fn complete_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let record = self
            .token_repo
            .find_password_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if record.expires_at <= Utc::now() {
            self.token_repo
                .delete_password_reset_token(record.id)
                .await?;
            return Err(AuthError::TokenExpired);
        }

        let user = self
            .user_repo
            .find_by_id(record.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal(anyhow!("reset token without user")))?;

        let password_hash = hash_password(new_password)?;
        self.user_repo
            .update_password(record.user_id, password_hash)
            .await?;
        self.token_repo
            .delete_password_reset_token(record.id)
            .await?;
        // Any stolen session dies with the old password.
        self.token_repo
            .delete_refresh_tokens_for_user(record.user_id)
            .await?;

        self.job_repo
            .enqueue_email_job(EmailJobPayload {
                kind: EmailKind::PasswordResetComplete,
                recipient: user.email,
                token: None,
                order_id: None,
                total_minor: None,
            })
            .await?;

        info!(user_id = %record.user_id, "auth: password reset completed");
        Ok(())
    }
}

fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AuthError::Internal(anyhow!("argon2 hash failed: {err}")))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> AuthResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| AuthError::Internal(anyhow!("stored password hash invalid: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::repositories::{
        jobs::MockJobRepository, tokens::MockTokenRepository, users::MockUserRepository,
    };

    fn usecase(
        user_repo: MockUserRepository,
        token_repo: MockTokenRepository,
        job_repo: MockJobRepository,
    ) -> AuthUseCase<MockUserRepository, MockTokenRepository, MockJobRepository> {
        AuthUseCase::new(Arc::new(user_repo), Arc::new(token_repo), Arc::new(job_repo))
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let usecase = usecase(
            MockUserRepository::new(),
            MockTokenRepository::new(),
            MockJobRepository::new(),
        );

        let err = usecase.register("user@example.com", "short").await;
        assert!(matches!(err, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn register_surfaces_taken_email() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_create_user().returning(|_| Ok(None));

        let usecase = usecase(
            user_repo,
            MockTokenRepository::new(),
            MockJobRepository::new(),
        );
        let err = usecase
            .register("user@example.com", "long enough password")
            .await;
        assert!(matches!(err, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn register_enqueues_activation_email() {
        let user_id = Uuid::new_v4();

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_create_user()
            .withf(|user| !user.is_active && user.email == "user@example.com")
            .returning(move |_| Ok(Some(user_id)));

        let mut token_repo = MockTokenRepository::new();
        token_repo
            .expect_insert_activation_token()
            .withf(move |t| t.user_id == user_id && t.token.len() == TOKEN_LENGTH)
            .returning(|_| Ok(1));

        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_enqueue_email_job()
            .withf(|payload| {
                payload.kind == EmailKind::Activation && payload.token.is_some()
            })
            .times(1)
            .returning(|_| Ok(Some(1)));

        let usecase = usecase(user_repo, token_repo, job_repo);
        let created = usecase
            .register("User@Example.com", "long enough password")
            .await
            .unwrap();
        assert_eq!(created, user_id);
    }

    #[tokio::test]
    async fn expired_activation_token_is_rejected_and_deleted() {
        let mut token_repo = MockTokenRepository::new();
        token_repo.expect_find_activation_token().returning(|_| {
            Ok(Some(domain::entities::tokens::ActivationTokenEntity {
                id: 7,
                user_id: Uuid::new_v4(),
                token: "t".into(),
                expires_at: Utc::now() - Duration::minutes(1),
            }))
        });
        token_repo
            .expect_delete_activation_token()
            .with(mockall::predicate::eq(7))
            .times(1)
            .returning(|_| Ok(()));

        let usecase = usecase(
            MockUserRepository::new(),
            token_repo,
            MockJobRepository::new(),
        );
        let err = usecase.activate("t").await;
        assert!(matches!(err, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn inactive_account_cannot_login() {
        let hash = hash_password("long enough password").unwrap();
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_email().returning(move |_| {
            Ok(Some(UserEntity {
                id: Uuid::new_v4(),
                email: "user@example.com".into(),
                password_hash: hash.clone(),
                is_active: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });

        let usecase = usecase(
            user_repo,
            MockTokenRepository::new(),
            MockJobRepository::new(),
        );
        let err = usecase
            .verify_credentials("user@example.com", "long enough password")
            .await;
        assert!(matches!(err, Err(AuthError::AccountInactive)));
    }

    #[tokio::test]
    async fn password_reset_request_never_reveals_unknown_email() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_email().returning(|_| Ok(None));

        let usecase = usecase(
            user_repo,
            MockTokenRepository::new(),
            MockJobRepository::new(),
        );
        assert!(usecase
            .request_password_reset("nobody@example.com")
            .await
            .is_ok());
    }
}
