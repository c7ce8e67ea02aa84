use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db_types::{CustomerDetails, Money, NewLineItem, Order, OrderId, ProductId},
    traits::{RedirectUrls, SettlementStatus},
    OrderFlowError,
};

const DEFAULT_ITEM_NAME: &str = "Product";
/// Product references are 32-bit in the catalog.
const MAX_PRODUCT_ID: i64 = i32::MAX as i64;

//--------------------------------------      InputPolicy      ---------------------------------------------------------
/// How checkout treats missing or malformed prices and quantities.
///
/// | input                          | `Strict`         | `Lenient`        |
/// |--------------------------------|------------------|------------------|
/// | empty item list                | rejected         | rejected         |
/// | price missing or not a number  | rejected         | 0                |
/// | price zero                     | rejected         | accepted         |
/// | price negative                 | rejected         | rejected         |
/// | quantity missing               | 1                | 1                |
/// | quantity invalid or below 1    | rejected         | 1                |
/// | fractional quantity            | rejected         | truncated        |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPolicy {
    #[default]
    Strict,
    Lenient,
}

impl Display for InputPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lenient => write!(f, "lenient"),
        }
    }
}

//--------------------------------------    CheckoutRequest    ---------------------------------------------------------
/// A cart line as sent by the storefront. Field types are not trusted; they are interpreted under an
/// [`InputPolicy`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutItem {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub product_id: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
}

impl CheckoutItem {
    pub fn new<S: Into<String>>(name: S, price: Value, quantity: i64) -> Self {
        Self {
            name: Some(Value::String(name.into())),
            price: Some(price),
            quantity: Some(Value::from(quantity)),
            ..Default::default()
        }
    }

    pub fn with_product_id(mut self, product_id: i64) -> Self {
        self.product_id = Some(Value::from(product_id));
        self
    }

    /// `title`, then `name`, then a generic placeholder.
    pub fn display_name(&self) -> String {
        [&self.title, &self.name]
            .into_iter()
            .flatten()
            .find_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| DEFAULT_ITEM_NAME.to_string())
    }

    /// `product_id`, then `id`. Only positive whole numbers in the 32-bit range are accepted.
    pub fn product_ref(&self) -> Option<ProductId> {
        self.product_id.as_ref().or(self.id.as_ref()).and_then(|v| {
            let n = match v {
                Value::Number(n) => n.as_i64().or_else(|| parse_truncated(v)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }?;
            (1..=MAX_PRODUCT_ID).contains(&n).then_some(ProductId(n))
        })
    }

    fn unit_price(&self, policy: InputPolicy, index: usize) -> Result<Money, OrderFlowError> {
        let parsed = self.price.as_ref().and_then(parse_money);
        match (parsed, policy) {
            (Some(p), _) if p.is_negative() => {
                Err(OrderFlowError::Validation(format!("Item {index}: price cannot be negative")))
            },
            (Some(p), InputPolicy::Strict) if p.is_zero() => {
                Err(OrderFlowError::Validation(format!("Item {index}: price must be greater than zero")))
            },
            (Some(p), _) => Ok(p),
            (None, InputPolicy::Strict) => {
                Err(OrderFlowError::Validation(format!("Item {index}: price is missing or is not a number")))
            },
            (None, InputPolicy::Lenient) => Ok(Money::default()),
        }
    }

    fn quantity(&self, policy: InputPolicy, index: usize) -> Result<i64, OrderFlowError> {
        let Some(raw) = self.quantity.as_ref() else {
            return Ok(1);
        };
        match policy {
            InputPolicy::Strict => match parse_whole_number(raw) {
                Some(q) if q >= 1 => Ok(q),
                _ => Err(OrderFlowError::Validation(format!(
                    "Item {index}: quantity must be a whole number of 1 or more"
                ))),
            },
            InputPolicy::Lenient => Ok(parse_truncated(raw).filter(|q| *q >= 1).unwrap_or(1)),
        }
    }

    /// Interprets the item under the given policy.
    pub fn to_line_item(&self, policy: InputPolicy, index: usize) -> Result<NewLineItem, OrderFlowError> {
        let unit_price = self.unit_price(policy, index)?;
        let quantity = self.quantity(policy, index)?;
        let item = NewLineItem { product_id: self.product_ref(), name: self.display_name(), unit_price, quantity };
        Ok(item)
    }
}

/// Decimal amounts arrive either as JSON numbers or strings. Both are parsed exactly.
fn parse_money(v: &Value) -> Option<Money> {
    match v {
        Value::Number(n) => Money::from_decimal_str(&n.to_string()).ok(),
        Value::String(s) => Money::from_decimal_str(s).ok(),
        _ => None,
    }
}

fn parse_whole_number(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => {
            n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e15).map(|f| f as i64))
        },
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn parse_truncated(v: &Value) -> Option<i64> {
    let f = match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => return Some(i),
            None => n.as_f64()?,
        },
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (f.is_finite() && f.abs() < 1e15).then(|| f.trunc() as i64)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    #[serde(default, alias = "customerEmail")]
    pub customer_email: Option<String>,
    #[serde(default, alias = "customerName")]
    pub customer_name: Option<String>,
    #[serde(default, alias = "customerPhone")]
    pub customer_phone: Option<String>,
    /// Free text, or a structured address which is stored as JSON text.
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

impl CheckoutRequest {
    pub fn new(items: Vec<CheckoutItem>) -> Self {
        Self { items, ..Default::default() }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn line_items(&self, policy: InputPolicy) -> Result<Vec<NewLineItem>, OrderFlowError> {
        if self.items.is_empty() {
            return Err(OrderFlowError::Validation("At least one item is required".into()));
        }
        self.items.iter().enumerate().map(|(i, item)| item.to_line_item(policy, i)).collect()
    }

    pub fn customer_details(&self) -> CustomerDetails {
        let clean = |s: &Option<String>| s.as_ref().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let address = match &self.address {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.trim().to_string()).filter(|v| !v.is_empty()),
            Some(other) => Some(other.to_string()),
        };
        CustomerDetails {
            customer_email: clean(&self.customer_email),
            customer_name: clean(&self.customer_name),
            customer_phone: clean(&self.customer_phone),
            address,
        }
    }

    /// The redirect URLs from the request, falling back to the given defaults.
    pub fn redirect_urls(&self, defaults: &RedirectUrls) -> RedirectUrls {
        let pick =
            |s: &Option<String>, d: &str| s.as_ref().filter(|v| !v.is_empty()).cloned().unwrap_or_else(|| d.to_string());
        RedirectUrls {
            success_url: pick(&self.success_url, &defaults.success_url),
            cancel_url: pick(&self.cancel_url, &defaults.cancel_url),
        }
    }
}

//--------------------------------------       Outcomes        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResult {
    /// The payment provider's session id
    #[serde(rename = "id")]
    pub session_id: String,
    /// Where to send the customer to pay
    pub url: Option<String>,
    pub order: Order,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// This call changed the order's status.
    Applied,
    /// The order was already in a terminal state. Nothing was written.
    NoChange,
}

/// The result of a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub order: Order,
    pub transition: Transition,
    /// Problems with side effects (e.g. notifications) that did not affect the committed order state.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl TransitionOutcome {
    pub fn applied(order: Order) -> Self {
        Self { order, transition: Transition::Applied, warnings: vec![] }
    }

    pub fn no_change(order: Order) -> Self {
        Self { order, transition: Transition::NoChange, warnings: vec![] }
    }

    pub fn is_applied(&self) -> bool {
        self.transition == Transition::Applied
    }
}

/// What happened as a result of an authenticated push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PushOutcome {
    Confirmed(TransitionOutcome),
    /// Checkout completed, but the funds have not settled yet. Nothing was written.
    Pending { order_id: Option<OrderId>, payment_status: SettlementStatus },
    Failed(TransitionOutcome),
    Ignored { event_type: String },
}

/// Response of the pull (verify-session) path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResult {
    pub confirmed: bool,
    pub order: Option<Order>,
    pub payment_status: SettlementStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
