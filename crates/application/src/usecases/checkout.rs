use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use domain::{
    entities::payments::InsertPaymentEntity,
    repositories::{
        carts::CartRepository, orders::OrderRepository, payments::PaymentRepository,
    },
    value_objects::{
        enums::{order_statuses::OrderStatus, payment_statuses::PaymentStatus},
        orders::{CheckoutDto, NewOrderItem, OrderDto},
        payments::PaymentDto,
    },
};

use crate::interfaces::stripe::StripeGateway;

pub const CHECKOUT_CURRENCY: &str = "usd";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    CartEmpty,
    #[error("no purchasable items in cart")]
    NothingToOrder,
    #[error("order not found")]
    OrderNotFound,
    #[error("not authorized for this order")]
    Forbidden,
    #[error("order cannot be paid")]
    OrderNotPayable,
    #[error("no refundable payment for this order")]
    NoRefundablePayment,
    #[error("payment gateway unavailable, payment pending, try again")]
    GatewayUnavailable,
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl CheckoutError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            CheckoutError::CartEmpty
            | CheckoutError::NothingToOrder
            | CheckoutError::OrderNotPayable => StatusCode::BAD_REQUEST,
            CheckoutError::OrderNotFound | CheckoutError::NoRefundablePayment => {
                StatusCode::NOT_FOUND
            }
            CheckoutError::Forbidden => StatusCode::FORBIDDEN,
            CheckoutError::GatewayUnavailable => StatusCode::BAD_GATEWAY,
            CheckoutError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type CheckoutResult<T> = std::result::Result<T, CheckoutError>;

pub struct CheckoutUseCase<C, O, P, S>
where
    C: CartRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    cart_repo: Arc<C>,
    order_repo: Arc<O>,
    payment_repo: Arc<P>,
    stripe_client: Arc<S>,
}

impl<C, O, P, S> CheckoutUseCase<C, O, P, S>
where
    C: CartRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        cart_repo: Arc<C>,
        order_repo: Arc<O>,
        payment_repo: Arc<P>,
        stripe_client: Arc<S>,
    ) -> Self {
        Self {
            cart_repo,
            order_repo,
            payment_repo,
            stripe_client,
        }
    }

    /// Turns the cart into a durable pending order, then asks the
    /// gateway for a PaymentIntent. The order is committed before any
    /// gateway call, so a dying gateway can never lose an order; the
    /// payment can be re-initiated via `initiate_payment`.
    pub async fn checkout(&self, user_id: Uuid) -> CheckoutResult<CheckoutDto> {
        info!(%user_id, "checkout: requested");

        let cart_items = self
            .cart_repo
            .list_items(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "checkout: failed to load cart");
                CheckoutError::Internal(err)
            })?;
        if cart_items.is_empty() {
            return Err(CheckoutError::CartEmpty);
        }

        // A movie the user already owns, or has a pending order for,
        // is silently dropped and reported back.
        let mut valid_items: Vec<NewOrderItem> = Vec::new();
        let mut excluded_movie_ids: Vec<i64> = Vec::new();
        for item in &cart_items {
            let already_purchased = self
                .order_repo
                .has_paid_order_with_movie(user_id, item.movie_id)
                .await
                .map_err(CheckoutError::Internal)?;
            let already_pending = if already_purchased {
                true
            } else {
                self.order_repo
                    .has_pending_order_with_movie(user_id, item.movie_id)
                    .await
                    .map_err(CheckoutError::Internal)?
            };

            if already_pending {
                excluded_movie_ids.push(item.movie_id);
            } else {
                valid_items.push(NewOrderItem {
                    movie_id: item.movie_id,
                    quantity: item.quantity,
                    price_minor: item.price_minor,
                });
            }
        }

        if valid_items.is_empty() {
            warn!(%user_id, ?excluded_movie_ids, "checkout: nothing left to order");
            return Err(CheckoutError::NothingToOrder);
        }

        let total_minor: i64 = valid_items
            .iter()
            .map(|item| i64::from(item.price_minor) * i64::from(item.quantity))
            .sum();
        let total_minor =
            i32::try_from(total_minor).map_err(|_| CheckoutError::Internal(
                anyhow::anyhow!("order total overflows amount column"),
            ))?;

        let order_id = self
            .order_repo
            .create_order_from_cart(user_id, total_minor, valid_items)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "checkout: failed to create order");
                CheckoutError::Internal(err)
            })?;

        info!(
            %user_id,
            order_id,
            total_minor,
            excluded = excluded_movie_ids.len(),
            "checkout: order committed, creating payment intent"
        );

        let client_secret = self
            .create_intent_and_record_payment(order_id, user_id, total_minor)
            .await?;

        Ok(CheckoutDto {
            order_id,
            total_minor,
            excluded_movie_ids,
            client_secret,
        })
    }

    /// Re-initiates payment for an own pending order, e.g. after the
    /// gateway was unreachable during checkout.
    pub async fn initiate_payment(&self, order_id: i64, user_id: Uuid) -> CheckoutResult<String> {
        let order = self.load_own_order(order_id, user_id).await?;
        if OrderStatus::from_str(&order.status) != Some(OrderStatus::Pending) {
            return Err(CheckoutError::OrderNotPayable);
        }

        self.create_intent_and_record_payment(order_id, user_id, order.total_minor)
            .await
    }

    pub async fn cancel_order(&self, order_id: i64, user_id: Uuid) -> CheckoutResult<()> {
        let order = self.load_own_order(order_id, user_id).await?;
        if OrderStatus::from_str(&order.status) != Some(OrderStatus::Pending) {
            return Err(CheckoutError::OrderNotPayable);
        }

        if !self
            .order_repo
            .mark_order_canceled(order_id)
            .await
            .map_err(CheckoutError::Internal)?
        {
            // Lost the race against a webhook; the order got paid first.
            return Err(CheckoutError::OrderNotPayable);
        }

        info!(%user_id, order_id, "checkout: order canceled");
        Ok(())
    }

    pub async fn list_orders(&self, user_id: Uuid) -> CheckoutResult<Vec<OrderDto>> {
        let orders = self
            .order_repo
            .list_orders_by_user(user_id)
            .await
            .map_err(CheckoutError::Internal)?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self
                .order_repo
                .list_order_items(order.id)
                .await
                .map_err(CheckoutError::Internal)?;
            result.push(OrderDto::from_entity(order, items));
        }
        Ok(result)
    }

    pub async fn refund(&self, order_id: i64, user_id: Uuid) -> CheckoutResult<PaymentDto> {
        self.load_own_order(order_id, user_id).await?;

        let payment = self
            .payment_repo
            .find_succeeded_payment_by_order(order_id)
            .await
            .map_err(CheckoutError::Internal)?
            .ok_or(CheckoutError::NoRefundablePayment)?;

        let provider_payment_id = payment
            .provider_payment_id
            .clone()
            .ok_or_else(|| {
                CheckoutError::Internal(anyhow::anyhow!(
                    "succeeded payment missing provider payment id"
                ))
            })?;

        self.stripe_client
            .refund_payment(&provider_payment_id, None)
            .await
            .map_err(|err| {
                error!(
                    order_id,
                    %provider_payment_id,
                    error = ?err,
                    "checkout: gateway refund failed"
                );
                CheckoutError::GatewayUnavailable
            })?;

        // A concurrent duplicate refund sees zero rows moved; that is a
        // no-op, not an error.
        let transitioned = self
            .payment_repo
            .mark_payment_refunded(payment.id)
            .await
            .map_err(CheckoutError::Internal)?;
        if !transitioned {
            info!(order_id, payment_id = payment.id, "checkout: refund already applied");
        } else {
            info!(order_id, payment_id = payment.id, "checkout: payment refunded");
        }

        let refreshed = self
            .payment_repo
            .list_payments_by_order(order_id)
            .await
            .map_err(CheckoutError::Internal)?
            .into_iter()
            .find(|p| p.id == payment.id)
            .unwrap_or(payment);
        Ok(PaymentDto::from(refreshed))
    }

    pub async fn list_order_payments(
        &self,
        order_id: i64,
        user_id: Uuid,
    ) -> CheckoutResult<Vec<PaymentDto>> {
        self.load_own_order(order_id, user_id).await?;

        let payments = self
            .payment_repo
            .list_payments_by_order(order_id)
            .await
            .map_err(CheckoutError::Internal)?;
        Ok(payments.into_iter().map(PaymentDto::from).collect())
    }

    async fn load_own_order(
        &self,
        order_id: i64,
        user_id: Uuid,
    ) -> CheckoutResult<domain::entities::orders::OrderEntity> {
        let order = self
            .order_repo
            .find_order_by_id(order_id)
            .await
            .map_err(CheckoutError::Internal)?
            .ok_or(CheckoutError::OrderNotFound)?;
        if order.user_id != user_id {
            warn!(%user_id, order_id, "checkout: order ownership mismatch");
            return Err(CheckoutError::Forbidden);
        }
        Ok(order)
    }

    async fn create_intent_and_record_payment(
        &self,
        order_id: i64,
        user_id: Uuid,
        total_minor: i32,
    ) -> CheckoutResult<String> {
        let intent = self
            .stripe_client
            .create_payment_intent(order_id, i64::from(total_minor), CHECKOUT_CURRENCY)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    order_id,
                    error = ?err,
                    "checkout: payment intent creation failed, order stays pending"
                );
                CheckoutError::GatewayUnavailable
            })?;

        // The payment amount mirrors the order total by construction.
        self.payment_repo
            .record_payment(InsertPaymentEntity {
                order_id,
                user_id,
                amount_minor: total_minor,
                status: PaymentStatus::Pending.to_string(),
                provider_payment_id: Some(intent.id.clone()),
                error: None,
            })
            .await
            .map_err(|err| {
                error!(order_id, db_error = ?err, "checkout: failed to record payment");
                CheckoutError::Internal(err)
            })?;

        info!(%user_id, order_id, intent_id = %intent.id, "checkout: payment intent created");
        Ok(intent.client_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::entities::carts::CartItemEntity;
    use domain::entities::orders::OrderEntity;
    use domain::entities::payments::PaymentEntity;
    use domain::repositories::{
        carts::MockCartRepository, orders::MockOrderRepository, payments::MockPaymentRepository,
    };

    use crate::interfaces::stripe::{MockStripeGateway, PaymentIntent};

    fn cart_item(movie_id: i64, quantity: i32, price_minor: i32) -> CartItemEntity {
        CartItemEntity {
            id: movie_id,
            cart_id: 1,
            movie_id,
            quantity,
            price_minor,
            added_at: Utc::now(),
        }
    }

    fn pending_order(order_id: i64, user_id: Uuid, total_minor: i32) -> OrderEntity {
        OrderEntity {
            id: order_id,
            user_id,
            status: OrderStatus::Pending.to_string(),
            total_minor,
            created_at: Utc::now(),
        }
    }

    fn gateway_returning_intent() -> MockStripeGateway {
        let mut stripe = MockStripeGateway::new();
        stripe.expect_create_payment_intent().returning(|_, _, _| {
            Ok(PaymentIntent {
                id: "pi_123".to_string(),
                client_secret: "pi_123_secret".to_string(),
            })
        });
        stripe
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let mut cart_repo = MockCartRepository::new();
        cart_repo.expect_list_items().returning(|_| Ok(vec![]));

        let usecase = CheckoutUseCase::new(
            Arc::new(cart_repo),
            Arc::new(MockOrderRepository::new()),
            Arc::new(MockPaymentRepository::new()),
            Arc::new(MockStripeGateway::new()),
        );
        let err = usecase.checkout(Uuid::new_v4()).await;
        assert!(matches!(err, Err(CheckoutError::CartEmpty)));
    }

    #[tokio::test]
    async fn checkout_total_is_sum_of_price_times_quantity() {
        // Spec scenario: one movie at 9.99 with quantity 2 -> 19.98.
        let user_id = Uuid::new_v4();

        let mut cart_repo = MockCartRepository::new();
        cart_repo
            .expect_list_items()
            .returning(|_| Ok(vec![cart_item(1, 2, 999)]));

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_has_paid_order_with_movie()
            .returning(|_, _| Ok(false));
        order_repo
            .expect_has_pending_order_with_movie()
            .returning(|_, _| Ok(false));
        order_repo
            .expect_create_order_from_cart()
            .withf(move |uid, total, items| {
                *uid == user_id
                    && *total == 1998
                    && items
                        == &vec![NewOrderItem {
                            movie_id: 1,
                            quantity: 2,
                            price_minor: 999,
                        }]
            })
            .returning(|_, _, _| Ok(77));

        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_record_payment()
            .withf(|payment| {
                payment.order_id == 77
                    && payment.amount_minor == 1998
                    && payment.status == "pending"
                    && payment.provider_payment_id.as_deref() == Some("pi_123")
            })
            .times(1)
            .returning(|_| Ok(1));

        let usecase = CheckoutUseCase::new(
            Arc::new(cart_repo),
            Arc::new(order_repo),
            Arc::new(payment_repo),
            Arc::new(gateway_returning_intent()),
        );

        let outcome = usecase.checkout(user_id).await.unwrap();
        assert_eq!(outcome.order_id, 77);
        assert_eq!(outcome.total_minor, 1998);
        assert_eq!(outcome.client_secret, "pi_123_secret");
        assert!(outcome.excluded_movie_ids.is_empty());
    }

    #[tokio::test]
    async fn already_purchased_movies_are_excluded() {
        let mut cart_repo = MockCartRepository::new();
        cart_repo
            .expect_list_items()
            .returning(|_| Ok(vec![cart_item(1, 1, 999), cart_item(2, 1, 500)]));

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_has_paid_order_with_movie()
            .returning(|_, movie_id| Ok(movie_id == 1));
        order_repo
            .expect_has_pending_order_with_movie()
            .returning(|_, _| Ok(false));
        order_repo
            .expect_create_order_from_cart()
            .withf(|_, total, items| *total == 500 && items.len() == 1 && items[0].movie_id == 2)
            .returning(|_, _, _| Ok(78));

        let mut payment_repo = MockPaymentRepository::new();
        payment_repo.expect_record_payment().returning(|_| Ok(1));

        let usecase = CheckoutUseCase::new(
            Arc::new(cart_repo),
            Arc::new(order_repo),
            Arc::new(payment_repo),
            Arc::new(gateway_returning_intent()),
        );

        let outcome = usecase.checkout(Uuid::new_v4()).await.unwrap();
        assert_eq!(outcome.excluded_movie_ids, vec![1]);
        assert_eq!(outcome.total_minor, 500);
    }

    #[tokio::test]
    async fn all_items_excluded_means_nothing_to_order() {
        let mut cart_repo = MockCartRepository::new();
        cart_repo
            .expect_list_items()
            .returning(|_| Ok(vec![cart_item(1, 1, 999)]));

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_has_paid_order_with_movie()
            .returning(|_, _| Ok(true));

        let usecase = CheckoutUseCase::new(
            Arc::new(cart_repo),
            Arc::new(order_repo),
            Arc::new(MockPaymentRepository::new()),
            Arc::new(MockStripeGateway::new()),
        );
        let err = usecase.checkout(Uuid::new_v4()).await;
        assert!(matches!(err, Err(CheckoutError::NothingToOrder)));
    }

    #[tokio::test]
    async fn gateway_failure_after_order_commit_is_retryable() {
        let mut cart_repo = MockCartRepository::new();
        cart_repo
            .expect_list_items()
            .returning(|_| Ok(vec![cart_item(1, 1, 999)]));

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_has_paid_order_with_movie()
            .returning(|_, _| Ok(false));
        order_repo
            .expect_has_pending_order_with_movie()
            .returning(|_, _| Ok(false));
        // The order is created even though the gateway then fails.
        order_repo
            .expect_create_order_from_cart()
            .times(1)
            .returning(|_, _, _| Ok(79));

        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_create_payment_intent()
            .returning(|_, _, _| Err(anyhow::anyhow!("connection refused")));

        let usecase = CheckoutUseCase::new(
            Arc::new(cart_repo),
            Arc::new(order_repo),
            Arc::new(MockPaymentRepository::new()),
            Arc::new(stripe),
        );
        let err = usecase.checkout(Uuid::new_v4()).await;
        assert!(matches!(err, Err(CheckoutError::GatewayUnavailable)));
    }

    #[tokio::test]
    async fn initiate_payment_rejects_foreign_order() {
        let owner = Uuid::new_v4();
        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_find_order_by_id()
            .returning(move |id| Ok(Some(pending_order(id, owner, 999))));

        let usecase = CheckoutUseCase::new(
            Arc::new(MockCartRepository::new()),
            Arc::new(order_repo),
            Arc::new(MockPaymentRepository::new()),
            Arc::new(MockStripeGateway::new()),
        );
        let err = usecase.initiate_payment(1, Uuid::new_v4()).await;
        assert!(matches!(err, Err(CheckoutError::Forbidden)));
    }

    #[tokio::test]
    async fn paid_order_cannot_be_canceled() {
        let user_id = Uuid::new_v4();
        let mut order_repo = MockOrderRepository::new();
        order_repo.expect_find_order_by_id().returning(move |id| {
            Ok(Some(OrderEntity {
                status: OrderStatus::Paid.to_string(),
                ..pending_order(id, user_id, 999)
            }))
        });

        let usecase = CheckoutUseCase::new(
            Arc::new(MockCartRepository::new()),
            Arc::new(order_repo),
            Arc::new(MockPaymentRepository::new()),
            Arc::new(MockStripeGateway::new()),
        );
        let err = usecase.cancel_order(1, user_id).await;
        assert!(matches!(err, Err(CheckoutError::OrderNotPayable)));
    }

    #[tokio::test]
    async fn refund_transitions_succeeded_payment() {
        let user_id = Uuid::new_v4();
        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_find_order_by_id()
            .returning(move |id| Ok(Some(pending_order(id, user_id, 999))));

        let payment = PaymentEntity {
            id: 11,
            order_id: 1,
            user_id,
            amount_minor: 999,
            status: PaymentStatus::Succeeded.to_string(),
            provider_payment_id: Some("pi_123".to_string()),
            error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut payment_repo = MockPaymentRepository::new();
        {
            let payment = payment.clone();
            payment_repo
                .expect_find_succeeded_payment_by_order()
                .returning(move |_| Ok(Some(payment.clone())));
        }
        payment_repo
            .expect_mark_payment_refunded()
            .with(mockall::predicate::eq(11))
            .times(1)
            .returning(|_| Ok(true));
        payment_repo.expect_list_payments_by_order().returning(move |_| {
            Ok(vec![PaymentEntity {
                status: PaymentStatus::Refunded.to_string(),
                ..payment.clone()
            }])
        });

        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_refund_payment()
            .withf(|id, amount| id == "pi_123" && amount.is_none())
            .times(1)
            .returning(|_, _| Ok(()));

        let usecase = CheckoutUseCase::new(
            Arc::new(MockCartRepository::new()),
            Arc::new(order_repo),
            Arc::new(payment_repo),
            Arc::new(stripe),
        );
        let refunded = usecase.refund(1, user_id).await.unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);
    }
}
