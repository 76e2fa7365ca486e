//! Checkout
//!
//! Submits the cart to the payment processor and clears it once the backend
//! confirms the payment.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use investomart::{
    cart::Cart,
    checkout::{CheckoutError, OrderSummary, PaymentMethod, PaymentRequest},
    session::{AuthToken, Session},
};
use mockall::automock;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};

/// Status reported by the backend for a completed payment.
pub const PAYMENT_SUCCESS: &str = "success";

/// Backend answer to a payment request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentReceipt {
    pub status: String,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl PaymentReceipt {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == PAYMENT_SUCCESS
    }
}

#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("sign in to complete the purchase")]
    LoginRequired,

    #[error("payment was not completed (status {status})")]
    Declined { status: String, message: Option<String> },

    #[error("payment request failed")]
    Api(#[from] ApiError),
}

impl CheckoutServiceError {
    /// Message shown on the checkout page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Validation { message, .. }) => message.clone(),
            Self::Checkout(_) | Self::LoginRequired => self.to_string(),
            Self::Declined { .. } | Self::Api(_) => {
                "Payment failed to process. Please try again.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpPaymentsService {
    api: ApiClient,
}

impl HttpPaymentsService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PaymentsService for HttpPaymentsService {
    async fn process(
        &self,
        request: &PaymentRequest,
        token: &AuthToken,
    ) -> Result<PaymentReceipt, ApiError> {
        let request = self
            .api
            .post("payments/process/")
            .header("Authorization", format!("Token {}", token.expose()))
            .json(request);

        self.api.send_json(request, "process payment").await
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Submit a payment for processing.
    async fn process(
        &self,
        request: &PaymentRequest,
        token: &AuthToken,
    ) -> Result<PaymentReceipt, ApiError>;
}

/// Turns a cart into a processed payment.
#[derive(Clone)]
pub struct CheckoutService {
    payments: Arc<dyn PaymentsService>,
}

impl fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutService").finish_non_exhaustive()
    }
}

impl CheckoutService {
    #[must_use]
    pub fn new(payments: Arc<dyn PaymentsService>) -> Self {
        Self { payments }
    }

    /// Pay for everything in the cart.
    ///
    /// The cart is cleared only when the backend reports success; on any other
    /// outcome it is left untouched so the purchase can be retried.
    ///
    /// # Errors
    ///
    /// Returns an error when the cart is empty, nobody is signed in, the
    /// request fails, or the backend does not confirm the payment.
    pub async fn checkout(
        &self,
        cart: &mut Cart,
        payment_method: PaymentMethod,
        session: Option<&Session>,
    ) -> Result<PaymentReceipt, CheckoutServiceError> {
        let request = PaymentRequest::from_cart(cart, payment_method)?;
        let session = session.ok_or(CheckoutServiceError::LoginRequired)?;
        let summary = OrderSummary::from_cart(cart);

        info!(
            user_id = session.user().id,
            lines = request.items.len(),
            subtotal = %summary.subtotal,
            platform_fee = %summary.platform_fee,
            total = %summary.total,
            %payment_method,
            "submitting payment"
        );

        let receipt = self.payments.process(&request, session.token()).await?;

        if !receipt.is_success() {
            warn!(status = %receipt.status, "payment not confirmed, keeping cart");

            return Err(CheckoutServiceError::Declined {
                status: receipt.status,
                message: receipt.message,
            });
        }

        info!(
            transaction_id = receipt.transaction_id.as_deref().unwrap_or_default(),
            "payment confirmed"
        );

        cart.clear();

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::test::{SOLD_OUT_ITEM, TEST_TOKEN, TestBackend, livestock, product, session};

    use super::*;

    fn filled_cart() -> Cart {
        let mut cart = Cart::new();

        cart.add_item(&product("PRD-FEED-01", 1250, 10));
        cart.add_item(&product("PRD-FEED-01", 1250, 10));
        cart.add_item(&livestock("ANM-0007", 18_000));

        cart
    }

    async fn http_checkout() -> TestResult<(TestBackend, CheckoutService)> {
        let backend = TestBackend::spawn().await?;
        let payments = HttpPaymentsService::new(backend.client()?);

        Ok((backend, CheckoutService::new(Arc::new(payments))))
    }

    #[tokio::test]
    async fn successful_payment_clears_the_cart() -> TestResult {
        let (backend, checkout) = http_checkout().await?;
        let mut cart = filled_cart();
        let session = session();

        let receipt = checkout
            .checkout(&mut cart, PaymentMethod::Esewa, Some(&session))
            .await?;

        assert_eq!(receipt.transaction_id.as_deref(), Some("TRX-TEST0001"));
        assert!(cart.is_empty());

        let payments = backend.state.payments().await;
        let body = payments.first().ok_or("no payment recorded")?;

        // 20 500 subtotal plus the 5% fee.
        assert_eq!(body["amount"], 21_525.0);
        assert_eq!(body["payment_method"], "esewa");
        assert_eq!(body["items"][0]["quantity"], 2);
        assert_eq!(body["items"][1]["item_type"], "livestock");

        Ok(())
    }

    #[tokio::test]
    async fn rejected_payment_keeps_the_cart() -> TestResult {
        let (_backend, checkout) = http_checkout().await?;
        let mut cart = filled_cart();
        cart.add_item(&livestock(SOLD_OUT_ITEM, 9_000));

        let session = session();
        let result = checkout
            .checkout(&mut cart, PaymentMethod::Card, Some(&session))
            .await;

        let Err(error) = result else {
            return Err("expected checkout to fail".into());
        };

        assert_eq!(error.user_message(), "Livestock ANM-SOLD is unavailable.");
        assert_eq!(cart.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn unconfirmed_payment_keeps_the_cart() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments.expect_process().returning(|_, _| {
            Ok(PaymentReceipt {
                status: "pending".to_string(),
                message: None,
                transaction_id: None,
            })
        });

        let checkout = CheckoutService::new(Arc::new(payments));
        let mut cart = filled_cart();
        let session = session();

        let result = checkout
            .checkout(&mut cart, PaymentMethod::Ips, Some(&session))
            .await;

        assert!(
            matches!(&result, Err(CheckoutServiceError::Declined { status, .. }) if status == "pending"),
            "expected Declined, got {result:?}"
        );
        assert_eq!(cart.total(), Decimal::from(20_500));

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_without_a_request() {
        let mut payments = MockPaymentsService::new();

        payments.expect_process().never();

        let checkout = CheckoutService::new(Arc::new(payments));
        let session = session();

        let result = checkout
            .checkout(&mut Cart::new(), PaymentMethod::Esewa, Some(&session))
            .await;

        assert!(
            matches!(result, Err(CheckoutServiceError::Checkout(CheckoutError::EmptyCart))),
            "expected EmptyCart, got {result:?}"
        );
    }

    #[tokio::test]
    async fn anonymous_checkout_requires_login() {
        let mut payments = MockPaymentsService::new();

        payments.expect_process().never();

        let checkout = CheckoutService::new(Arc::new(payments));
        let mut cart = filled_cart();

        let result = checkout.checkout(&mut cart, PaymentMethod::Esewa, None).await;

        assert!(
            matches!(result, Err(CheckoutServiceError::LoginRequired)),
            "expected LoginRequired, got {result:?}"
        );
        assert_eq!(cart.count(), 3);
    }

    #[tokio::test]
    async fn payment_is_sent_with_the_session_token() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments
            .expect_process()
            .withf(|_, token| token.expose() == TEST_TOKEN)
            .times(1)
            .returning(|_, _| {
                Ok(PaymentReceipt {
                    status: PAYMENT_SUCCESS.to_string(),
                    message: Some("Payment processed".to_string()),
                    transaction_id: Some("TRX-1".to_string()),
                })
            });

        let checkout = CheckoutService::new(Arc::new(payments));
        let session = session();

        checkout
            .checkout(&mut filled_cart(), PaymentMethod::Esewa, Some(&session))
            .await?;

        Ok(())
    }
}
