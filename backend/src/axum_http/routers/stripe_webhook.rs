use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use tracing::error;

use crate::{axum_http::error_responses::error_response, config::config_model::DotEnvyConfig};
use application::{
    interfaces::stripe::StripeGateway,
    usecases::payment_webhook::{PaymentWebhookUseCase, WebhookError},
};
use domain::repositories::{
    jobs::JobRepository, orders::OrderRepository, payments::PaymentRepository,
    users::UserRepository,
};
use infra::{
    payments::stripe_client::StripeClient,
    postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{
            jobs::JobsPostgres, orders::OrdersPostgres, payments::PaymentsPostgres,
            users::UsersPostgres,
        },
    },
};

pub fn routes(config: &DotEnvyConfig, db_pool: Arc<PgPoolSquad>) -> Router {
    let payments_repository = PaymentsPostgres::new(Arc::clone(&db_pool));
    let orders_repository = OrdersPostgres::new(Arc::clone(&db_pool));
    let jobs_repository = JobsPostgres::new(Arc::clone(&db_pool));
    let users_repository = UsersPostgres::new(Arc::clone(&db_pool));
    let stripe_client = StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
    );
    let webhook_usecase = PaymentWebhookUseCase::new(
        Arc::new(payments_repository),
        Arc::new(orders_repository),
        Arc::new(jobs_repository),
        Arc::new(users_repository),
        Arc::new(stripe_client),
    );

    Router::new()
        .route("/stripe", post(handle))
        .with_state(Arc::new(webhook_usecase))
}

/// Signature verification needs the exact raw bytes Stripe signed, so
/// the body is taken as `Bytes`, never as parsed JSON.
pub async fn handle<P, O, J, U, S>(
    State(webhook_usecase): State<Arc<PaymentWebhookUseCase<P, O, J, U, S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse
where
    P: PaymentRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    J: JobRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    let Some(signature) = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
    else {
        return error_response(StatusCode::BAD_REQUEST, "Missing stripe-signature header");
    };

    match webhook_usecase.handle_event(&body, signature).await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                error!(error = ?e, "webhook: processing failed");
            }
            match e {
                WebhookError::InvalidSignature => error_response(status, &e.to_string()),
                WebhookError::Internal(_) => error_response(status, ""),
            }
        }
    }
}
