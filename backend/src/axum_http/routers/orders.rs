use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use tracing::error;

use crate::{
    auth::AuthUser, axum_http::error_responses::error_response,
    config::config_model::DotEnvyConfig,
};
use application::{
    interfaces::stripe::StripeGateway,
    usecases::checkout::{CheckoutError, CheckoutUseCase},
};
use domain::repositories::{
    carts::CartRepository, orders::OrderRepository, payments::PaymentRepository,
};
use infra::{
    payments::stripe_client::StripeClient,
    postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{
            carts::CartsPostgres, orders::OrdersPostgres, payments::PaymentsPostgres,
        },
    },
};

pub fn routes(config: &DotEnvyConfig, db_pool: Arc<PgPoolSquad>) -> Router {
    let carts_repository = CartsPostgres::new(Arc::clone(&db_pool));
    let orders_repository = OrdersPostgres::new(Arc::clone(&db_pool));
    let payments_repository = PaymentsPostgres::new(Arc::clone(&db_pool));
    let stripe_client = StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
    );
    let checkout_usecase = CheckoutUseCase::new(
        Arc::new(carts_repository),
        Arc::new(orders_repository),
        Arc::new(payments_repository),
        Arc::new(stripe_client),
    );

    Router::new()
        .route("/", get(list))
        .route("/checkout", post(checkout))
        .route("/:order_id/pay", post(pay))
        .route("/:order_id/cancel", post(cancel))
        .route("/:order_id/refund", post(refund))
        .route("/:order_id/payments", get(payments))
        .with_state(Arc::new(checkout_usecase))
}

#[derive(Debug, Serialize)]
pub struct ClientSecretResponse {
    pub client_secret: String,
}

fn checkout_error_response(context: &str, err: CheckoutError) -> axum::response::Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(context, error = ?err, "orders: request failed");
    }
    error_response(status, &err.to_string())
}

pub async fn checkout<C, O, P, S>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<C, O, P, S>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    C: CartRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    match checkout_usecase.checkout(auth.user_id).await {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(e) => checkout_error_response("checkout", e),
    }
}

pub async fn list<C, O, P, S>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<C, O, P, S>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    C: CartRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    match checkout_usecase.list_orders(auth.user_id).await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(e) => checkout_error_response("list", e),
    }
}

pub async fn pay<C, O, P, S>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<C, O, P, S>>>,
    auth: AuthUser,
    Path(order_id): Path<i64>,
) -> impl IntoResponse
where
    C: CartRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    match checkout_usecase.initiate_payment(order_id, auth.user_id).await {
        Ok(client_secret) => {
            (StatusCode::OK, Json(ClientSecretResponse { client_secret })).into_response()
        }
        Err(e) => checkout_error_response("pay", e),
    }
}

pub async fn cancel<C, O, P, S>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<C, O, P, S>>>,
    auth: AuthUser,
    Path(order_id): Path<i64>,
) -> impl IntoResponse
where
    C: CartRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    match checkout_usecase.cancel_order(order_id, auth.user_id).await {
        Ok(()) => (StatusCode::OK, "Order canceled").into_response(),
        Err(e) => checkout_error_response("cancel", e),
    }
}

pub async fn refund<C, O, P, S>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<C, O, P, S>>>,
    auth: AuthUser,
    Path(order_id): Path<i64>,
) -> impl IntoResponse
where
    C: CartRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    match checkout_usecase.refund(order_id, auth.user_id).await {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(e) => checkout_error_response("refund", e),
    }
}

pub async fn payments<C, O, P, S>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<C, O, P, S>>>,
    auth: AuthUser,
    Path(order_id): Path<i64>,
) -> impl IntoResponse
where
    C: CartRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    match checkout_usecase
        .list_order_payments(order_id, auth.user_id)
        .await
    {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(e) => checkout_error_response("payments", e),
    }
}
