//! Checkout

use std::fmt::{self, Display, Formatter};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    cart::{Cart, CartLine},
    catalog::{ItemId, ItemKind},
};

/// Share of the subtotal charged as a platform fee.
pub const PLATFORM_FEE_RATE: f64 = 0.05;

/// Errors raised while preparing a checkout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// There is nothing to pay for.
    #[error("cart is empty")]
    EmptyCart,
}

/// Supported payment rails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// eSewa wallet
    #[default]
    Esewa,

    /// Interbank payment
    Ips,

    /// Debit or credit card
    Card,
}

impl PaymentMethod {
    /// Wire name of the method.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Esewa => "esewa",
            Self::Ips => "ips",
            Self::Card => "card",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Totals shown on the checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSummary {
    /// Sum of line totals
    pub subtotal: Decimal,

    /// Platform fee on the subtotal
    pub platform_fee: Decimal,

    /// Amount charged
    pub total: Decimal,
}

impl OrderSummary {
    /// Compute the totals for the current cart contents.
    pub fn from_cart(cart: &Cart) -> Self {
        let subtotal = cart.total();
        let platform_fee = (Percentage::from(PLATFORM_FEE_RATE) * subtotal).round_dp(2);

        Self {
            subtotal,
            platform_fee,
            total: subtotal + platform_fee,
        }
    }
}

/// One purchased line in a payment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLine {
    /// Catalog identity
    pub item_id: ItemId,

    /// Product or livestock
    pub item_type: ItemKind,

    /// Units bought
    pub quantity: u32,

    /// Unit price at the time of purchase
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

impl From<&CartLine> for PaymentLine {
    fn from(line: &CartLine) -> Self {
        Self {
            item_id: line.id().clone(),
            item_type: line.kind(),
            quantity: line.quantity(),
            unit_price: line.price(),
        }
    }
}

/// Body of the payment processing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Purchased lines
    pub items: SmallVec<[PaymentLine; 4]>,

    /// Amount charged, platform fee included
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// Payment rail
    pub payment_method: PaymentMethod,
}

impl PaymentRequest {
    /// Build a payment request for everything in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart has no lines.
    pub fn from_cart(cart: &Cart, payment_method: PaymentMethod) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        Ok(Self {
            items: cart.lines().iter().map(PaymentLine::from).collect(),
            amount: OrderSummary::from_cart(cart).total,
            payment_method,
        })
    }
}
