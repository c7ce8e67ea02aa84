use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
pub use shop_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(ConversionError(format!("'{s}' is not a valid order id"))),
        }
    }
}

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------       ProductId       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ProductId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been created and is waiting for the payment provider to report settlement.
    Pending,
    /// Payment has settled and stock has been taken for every line item. Terminal.
    Paid,
    /// The provider reported that the payment session is dead (expired or declined). Terminal; no stock effect.
    Failed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Paid => write!(f, "paid"),
            OrderStatusType::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------   CustomerDetails     ---------------------------------------------------------
/// Optional contact details captured at checkout. None of them are verified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default, alias = "customerEmail")]
    pub customer_email: Option<String>,
    #[serde(default, alias = "customerName")]
    pub customer_name: Option<String>,
    #[serde(default, alias = "customerPhone")]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

//--------------------------------------       LineItem        ---------------------------------------------------------
/// A line item snapshot, as captured when the order was placed. Never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub order_id: OrderId,
    /// `None` if the product did not exist in the inventory when the order was created.
    pub product_id: Option<ProductId>,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl LineItem {
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl NewLineItem {
    pub fn new<S: Into<String>>(name: S, unit_price: Money, quantity: i64) -> Self {
        Self { product_id: None, name: name.into(), unit_price, quantity }
    }

    pub fn with_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub items: Vec<NewLineItem>,
    pub customer: CustomerDetails,
    pub currency: String,
    total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NewOrderError {
    #[error("An order must contain at least one line item")]
    NoItems,
    #[error("Line item '{0}' has a quantity less than one")]
    InvalidQuantity(String),
    #[error("Line item '{0}' has a negative unit price")]
    NegativePrice(String),
    #[error("The order total does not fit in the amount type")]
    TotalOverflow,
}

impl NewOrder {
    /// Builds a new order, computing the total from the line item snapshots.
    pub fn new(items: Vec<NewLineItem>, customer: CustomerDetails, currency: &str) -> Result<Self, NewOrderError> {
        if items.is_empty() {
            return Err(NewOrderError::NoItems);
        }
        let mut total = Money::default();
        for item in &items {
            if item.quantity < 1 {
                return Err(NewOrderError::InvalidQuantity(item.name.clone()));
            }
            if item.unit_price.is_negative() {
                return Err(NewOrderError::NegativePrice(item.name.clone()));
            }
            total = item
                .unit_price
                .checked_mul(item.quantity)
                .and_then(|line| total.checked_add(line))
                .ok_or(NewOrderError::TotalOverflow)?;
        }
        Ok(Self { items, customer, currency: currency.to_ascii_lowercase(), total })
    }

    pub fn total(&self) -> Money {
        self.total
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
/// A row of the `orders` table, without its line items.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct OrderRow {
    pub id: OrderId,
    pub total: Money,
    pub currency: String,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub address: Option<String>,
    pub status: OrderStatusType,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub(crate) fn with_items(self, items: Vec<LineItem>) -> Order {
        Order {
            id: self.id,
            items,
            total: self.total,
            currency: self.currency,
            customer: CustomerDetails {
                customer_email: self.customer_email,
                customer_name: self.customer_name,
                customer_phone: self.customer_phone,
                address: self.address,
            },
            status: self.status,
            session_id: self.session_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// An order together with its full, ordered list of line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<LineItem>,
    pub total: Money,
    pub currency: String,
    #[serde(flatten)]
    pub customer: CustomerDetails,
    pub status: OrderStatusType,
    /// The payment provider's session reference. Assigned at most once.
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.status == OrderStatusType::Paid
    }

    /// Recomputes the total from the line item snapshots.
    pub fn items_total(&self) -> Option<Money> {
        self.items.iter().try_fold(Money::default(), |acc, item| item.line_total().and_then(|t| acc.checked_add(t)))
    }
}

//--------------------------------------    InventoryRecord    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}
