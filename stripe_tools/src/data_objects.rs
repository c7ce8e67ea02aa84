use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shop_common::Money;

use crate::StripeApiError;

/// The subset of a Stripe Checkout Session object that the shop cares about.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    /// `paid`, `unpaid` or `no_payment_required`
    #[serde(default)]
    pub payment_status: String,
    /// `open`, `complete` or `expired`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CheckoutSession {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeEventData {
    pub object: Value,
}

/// A webhook event envelope. The payload in `data.object` depends on `event_type`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<i64>,
    pub data: StripeEventData,
}

impl StripeEvent {
    /// Interprets `data.object` as a Checkout Session. Only meaningful for `checkout.session.*` events.
    pub fn checkout_session(&self) -> Result<CheckoutSession, StripeApiError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| StripeApiError::JsonError(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
    pub name: String,
    pub unit_amount: Money,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewCheckoutSession {
    pub line_items: Vec<SessionLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: Vec<(String, String)>,
    pub customer_email: Option<String>,
}

impl NewCheckoutSession {
    /// Stripe's REST API takes nested parameters as bracketed form keys.
    pub fn form_params(&self, currency: &str) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];
        for (i, item) in self.line_items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            params.push((format!("{prefix}[price_data][currency]"), currency.to_string()));
            params.push((format!("{prefix}[price_data][product_data][name]"), item.name.clone()));
            params.push((format!("{prefix}[price_data][unit_amount]"), item.unit_amount.value().to_string()));
            params.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        }
        for (key, value) in &self.metadata {
            params.push((format!("metadata[{key}]"), value.clone()));
        }
        if let Some(email) = &self.customer_email {
            params.push(("customer_email".to_string(), email.clone()));
        }
        params
    }
}
