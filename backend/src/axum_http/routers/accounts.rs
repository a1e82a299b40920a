use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::{
    auth::{
        self, AuthUser, REFRESH_TOKEN_TTL_DAYS, TOKEN_TYPE_REFRESH, ACCESS_TOKEN_TTL_SECS,
    },
    axum_http::error_responses::error_response,
    config::config_model::DotEnvyConfig,
};
use application::usecases::auth::{AuthError, AuthUseCase};
use domain::repositories::{
    jobs::JobRepository, tokens::TokenRepository, users::UserRepository,
};
use infra::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{jobs::JobsPostgres, tokens::TokensPostgres, users::UsersPostgres},
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let users_repository = UsersPostgres::new(Arc::clone(&db_pool));
    let tokens_repository = TokensPostgres::new(Arc::clone(&db_pool));
    let jobs_repository = JobsPostgres::new(Arc::clone(&db_pool));
    let auth_usecase = AuthUseCase::new(
        Arc::new(users_repository),
        Arc::new(tokens_repository),
        Arc::new(jobs_repository),
    );

    Router::new()
        .route("/register", post(register))
        .route("/activate", get(activate))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/password-reset/request", post(request_password_reset))
        .route("/password-reset/complete", post(complete_password_reset))
        .route("/me", get(me))
        .with_state(Arc::new(auth_usecase))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetComplete {
    pub token: String,
    pub new_password: String,
}

fn auth_error_response(context: &str, err: AuthError) -> axum::response::Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(context, error = ?err, "accounts: request failed");
    }
    error_response(status, &err.to_string())
}

pub async fn register<U, T, J>(
    State(auth_usecase): State<Arc<AuthUseCase<U, T, J>>>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    T: TokenRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
{
    match auth_usecase.register(&payload.email, &payload.password).await {
        Ok(user_id) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                user_id,
                message: "Check your inbox for the activation link".to_string(),
            }),
        )
            .into_response(),
        Err(e) => auth_error_response("register", e),
    }
}

pub async fn activate<U, T, J>(
    State(auth_usecase): State<Arc<AuthUseCase<U, T, J>>>,
    Query(query): Query<ActivateQuery>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    T: TokenRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
{
    match auth_usecase.activate(&query.token).await {
        Ok(()) => (StatusCode::OK, "Account activated").into_response(),
        Err(e) => auth_error_response("activate", e),
    }
}

pub async fn login<U, T, J>(
    State(auth_usecase): State<Arc<AuthUseCase<U, T, J>>>,
    Extension(config): Extension<Arc<DotEnvyConfig>>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    T: TokenRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
{
    let user = match auth_usecase
        .verify_credentials(&payload.email, &payload.password)
        .await
    {
        Ok(user) => user,
        Err(e) => return auth_error_response("login", e),
    };

    let access_token =
        match auth::create_access_token(user.id, &user.email, &config.jwt.access_secret) {
            Ok(token) => token,
            Err(e) => {
                error!(error = ?e, "accounts: failed to mint access token");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "");
            }
        };
    let refresh_token =
        match auth::create_refresh_token(user.id, &user.email, &config.jwt.refresh_secret) {
            Ok(token) => token,
            Err(e) => {
                error!(error = ?e, "accounts: failed to mint refresh token");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "");
            }
        };

    // The refresh token is also persisted so logout can revoke it.
    let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS);
    if let Err(e) = auth_usecase
        .store_refresh_token(user.id, refresh_token.clone(), expires_at)
        .await
    {
        return auth_error_response("login", e);
    }

    (
        StatusCode::OK,
        Json(TokenPairResponse {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: ACCESS_TOKEN_TTL_SECS,
        }),
    )
        .into_response()
}

pub async fn refresh<U, T, J>(
    State(auth_usecase): State<Arc<AuthUseCase<U, T, J>>>,
    Extension(config): Extension<Arc<DotEnvyConfig>>,
    Json(payload): Json<RefreshRequest>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    T: TokenRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
{
    let claims = match auth::validate_token(
        &payload.refresh_token,
        &config.jwt.refresh_secret,
        TOKEN_TYPE_REFRESH,
    ) {
        Ok(claims) => claims,
        Err(e) => return error_response(StatusCode::UNAUTHORIZED, &e.to_string()),
    };
    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid user ID in token");
    };

    if let Err(e) = auth_usecase
        .validate_refresh_token(user_id, &payload.refresh_token)
        .await
    {
        return auth_error_response("refresh", e);
    }

    match auth::create_access_token(user_id, &claims.email, &config.jwt.access_secret) {
        Ok(access_token) => (
            StatusCode::OK,
            Json(AccessTokenResponse {
                access_token,
                token_type: "Bearer",
                expires_in: ACCESS_TOKEN_TTL_SECS,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = ?e, "accounts: failed to mint access token");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "")
        }
    }
}

pub async fn logout<U, T, J>(
    State(auth_usecase): State<Arc<AuthUseCase<U, T, J>>>,
    Json(payload): Json<RefreshRequest>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    T: TokenRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
{
    match auth_usecase.logout(&payload.refresh_token).await {
        Ok(()) => (StatusCode::OK, "Logged out").into_response(),
        Err(e) => auth_error_response("logout", e),
    }
}

pub async fn request_password_reset<U, T, J>(
    State(auth_usecase): State<Arc<AuthUseCase<U, T, J>>>,
    Json(payload): Json<PasswordResetRequest>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    T: TokenRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
{
    // Same response whether or not the account exists.
    match auth_usecase.request_password_reset(&payload.email).await {
        Ok(()) => (
            StatusCode::OK,
            "If that address is registered, a reset link is on its way",
        )
            .into_response(),
        Err(e) => auth_error_response("request_password_reset", e),
    }
}

pub async fn complete_password_reset<U, T, J>(
    State(auth_usecase): State<Arc<AuthUseCase<U, T, J>>>,
    Json(payload): Json<PasswordResetComplete>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    T: TokenRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
{
    match auth_usecase
        .complete_password_reset(&payload.token, &payload.new_password)
        .await
    {
        Ok(()) => (StatusCode::OK, "Password updated").into_response(),
        Err(e) => auth_error_response("complete_password_reset", e),
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: String,
}

pub async fn me<U, T, J>(
    State(_auth_usecase): State<Arc<AuthUseCase<U, T, J>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    T: TokenRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
{
    (
        StatusCode::OK,
        Json(MeResponse {
            user_id: auth.user_id,
            email: auth.email,
        }),
    )
        .into_response()
}
