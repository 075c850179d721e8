//! Checkout Flow
//!
//! Walks a cart through review → shipping → confirmation and turns it into an
//! order. The flow only reads and clears the [`Store`]; it never edits line
//! items. There is no payment step and placed orders are not persisted.

use crate::errors::{Result, StorefrontError};
use crate::store::events::{NotificationSink, StoreEvent};
use crate::store::helpers::format_item_summary;
use crate::store::models::{CartItem, Money};
use crate::store::state::Store;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Express delivery fee in base currency when none is configured
pub const DEFAULT_EXPRESS_FEE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

// =============================================================================
// Shipping
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    /// Free delivery
    #[default]
    Standard,
    Express,
}

/// Delivery address as entered on the shipping form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub emirate: String,
}

impl ShippingInfo {
    /// Checks the required fields, reporting the first blank one
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("fullName", &self.full_name),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(StorefrontError::MissingField(*field)),
            None => Ok(()),
        }
    }
}

/// Amounts due for the current cart, all in base currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderQuote {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

// =============================================================================
// Flow
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Cart,
    Shipping,
    Confirmation,
}

/// A placed order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: String,
    pub placed_at: DateTime<Utc>,
    pub lines: Vec<CartItem>,
    pub shipping_method: ShippingMethod,
    pub shipping_info: ShippingInfo,
    pub quote: OrderQuote,
}

/// State of one checkout attempt
#[derive(Debug, Clone)]
pub struct Checkout {
    step: CheckoutStep,
    shipping_method: ShippingMethod,
    shipping_info: Option<ShippingInfo>,
    express_fee: Money,
    order: Option<Order>,
}

impl Default for Checkout {
    fn default() -> Self {
        Self::new(DEFAULT_EXPRESS_FEE)
    }
}

impl Checkout {
    pub fn new(express_fee: Money) -> Self {
        Self {
            step: CheckoutStep::Cart,
            shipping_method: ShippingMethod::default(),
            shipping_info: None,
            express_fee,
            order: None,
        }
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn shipping_method(&self) -> ShippingMethod {
        self.shipping_method
    }

    pub fn set_shipping_method(&mut self, method: ShippingMethod) {
        self.shipping_method = method;
    }

    pub fn shipping_cost(&self) -> Money {
        match self.shipping_method {
            ShippingMethod::Standard => Decimal::ZERO,
            ShippingMethod::Express => self.express_fee,
        }
    }

    /// Subtotal, shipping and total for what is in `store` right now
    pub fn quote(&self, store: &Store) -> OrderQuote {
        let subtotal = store.cart_total();
        let shipping = self.shipping_cost();
        OrderQuote {
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }

    /// Cart review → shipping form. Refused for an empty cart.
    pub fn proceed_to_shipping(&mut self, store: &Store) -> Result<()> {
        self.expect_step(CheckoutStep::Cart, "proceed to shipping")?;
        if store.is_cart_empty() {
            return Err(StorefrontError::EmptyCart);
        }
        self.step = CheckoutStep::Shipping;
        Ok(())
    }

    /// Shipping form → cart review
    pub fn back_to_cart(&mut self) -> Result<()> {
        self.expect_step(CheckoutStep::Shipping, "go back to the cart")?;
        self.step = CheckoutStep::Cart;
        Ok(())
    }

    /// Validates the address and moves on to confirmation
    pub fn submit_shipping(&mut self, info: ShippingInfo) -> Result<()> {
        self.expect_step(CheckoutStep::Shipping, "submit shipping details")?;
        info.validate()?;
        self.shipping_info = Some(info);
        self.step = CheckoutStep::Confirmation;
        Ok(())
    }

    /// Places the order: snapshots the cart, clears it and reports both the
    /// `CartCleared` and `OrderPlaced` events to `sink`.
    pub fn place_order(
        &mut self,
        store: &mut Store,
        sink: &dyn NotificationSink,
    ) -> Result<&Order> {
        self.expect_step(CheckoutStep::Confirmation, "place an order")?;
        if self.order.is_some() {
            return Err(StorefrontError::InvalidStep {
                action: "place a second order",
                step: self.step,
            });
        }
        if store.is_cart_empty() {
            return Err(StorefrontError::EmptyCart);
        }
        let shipping_info = self
            .shipping_info
            .clone()
            .ok_or(StorefrontError::MissingField("shippingInfo"))?;

        let placed_at = Utc::now();
        let order = Order {
            order_number: order_number(placed_at),
            placed_at,
            lines: store.cart_items().cloned().collect(),
            shipping_method: self.shipping_method,
            shipping_info,
            quote: self.quote(store),
        };

        tracing::info!(
            order_number = %order.order_number,
            total = %order.quote.total,
            "Order placed: {}",
            format_item_summary(&order.lines)
        );

        sink.notify(&store.clear_cart());
        sink.notify(&StoreEvent::OrderPlaced {
            order_number: order.order_number.clone(),
        });

        Ok(&*self.order.insert(order))
    }

    fn expect_step(&self, expected: CheckoutStep, action: &'static str) -> Result<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(StorefrontError::InvalidStep {
                action,
                step: self.step,
            })
        }
    }
}

/// `ORD-` followed by the last eight digits of the epoch milliseconds
pub fn order_number(at: DateTime<Utc>) -> String {
    format!("ORD-{:08}", at.timestamp_millis().rem_euclid(100_000_000))
}
