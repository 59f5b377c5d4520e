use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::currency::{check_amount, CurrencyCode, Money};
use super::customer::NewCustomer;
use super::errors::{check_length, DomainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::Validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub total: BigDecimal,
    pub currency: CurrencyCode,
    pub status: OrderStatus,
    pub payment_method: String,
    /// Copied from the customer when the order was placed.
    pub shipping_address: String,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn total_money(&self) -> Money {
        Money::new(self.total.clone(), self.currency)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    /// Unit price at the moment of purchase.
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub total: BigDecimal,
    pub currency: CurrencyCode,
    pub payment_method: String,
    pub shipping_address: String,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// One cart line as submitted at checkout.
#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer: NewCustomer,
    pub items: Vec<OrderItemInput>,
    pub total: BigDecimal,
    pub currency: CurrencyCode,
    pub payment_method: String,
    pub idempotency_key: Option<String>,
}

pub const MAX_PAYMENT_METHOD_LEN: usize = 100;
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;
/// Digits before the decimal point that fit `NUMERIC(14, 2)`.
const AMOUNT_INTEGER_DIGITS: u32 = 12;

/// Largest accepted gap between a submitted total and the sum of its lines.
pub fn total_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

pub fn items_total(items: &[OrderItemInput]) -> BigDecimal {
    items
        .iter()
        .map(|i| &i.unit_price * BigDecimal::from(i.quantity))
        .fold(BigDecimal::from(0), |acc, line| acc + line)
}

impl CheckoutRequest {
    /// Checks everything that can be checked without touching the store.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::Validation("an order needs at least one item".into()));
        }
        if self.payment_method.trim().is_empty() {
            return Err(DomainError::Validation("payment method is required".into()));
        }
        check_length("payment method", self.payment_method.trim(), MAX_PAYMENT_METHOD_LEN)?;
        if let Some(key) = &self.idempotency_key {
            if key.trim().is_empty() {
                return Err(DomainError::Validation("idempotency key must not be blank".into()));
            }
            check_length("idempotency key", key, MAX_IDEMPOTENCY_KEY_LEN)?;
        }
        check_amount("total", &self.total, AMOUNT_INTEGER_DIGITS)?;
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(DomainError::Validation(format!(
                    "quantity for product {} must be positive, got {}",
                    item.product_id, item.quantity
                )));
            }
            if item.unit_price <= BigDecimal::from(0) {
                return Err(DomainError::Validation(format!(
                    "unit price for product {} must be positive",
                    item.product_id
                )));
            }
            check_amount("unit price", &item.unit_price, AMOUNT_INTEGER_DIGITS)?;
        }
        let computed = items_total(&self.items);
        if (&self.total - &computed).abs() > total_tolerance() {
            return Err(DomainError::Conflict(format!(
                "order total {} does not match the sum of its items {}",
                self.total, computed
            )));
        }
        Ok(())
    }
}
