use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Order, OrderId};

/// Whether the provider considers the funds for a session captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

impl SettlementStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::NoPaymentRequired)
    }

    /// Unknown values are treated as unpaid.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "paid" => Self::Paid,
            "no_payment_required" => Self::NoPaymentRequired,
            _ => Self::Unpaid,
        }
    }
}

impl Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paid => write!(f, "paid"),
            Self::Unpaid => write!(f, "unpaid"),
            Self::NoPaymentRequired => write!(f, "no_payment_required"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Complete,
    /// The session can no longer be paid.
    Expired,
}

impl SessionStatus {
    /// Unknown or missing values are treated as open.
    pub fn from_provider(s: Option<&str>) -> Self {
        match s {
            Some("complete") => Self::Complete,
            Some("expired") => Self::Expired,
            _ => Self::Open,
        }
    }
}

/// A provider-neutral view of a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub id: String,
    /// Where to send the customer to pay. Only present on freshly created sessions.
    pub url: Option<String>,
    pub payment_status: SettlementStatus,
    pub status: SessionStatus,
    /// The order id carried in the session metadata, if present and well-formed.
    pub order_id: Option<OrderId>,
}

impl ProviderSession {
    pub fn new<S: Into<String>>(id: S, payment_status: SettlementStatus, status: SessionStatus) -> Self {
        Self { id: id.into(), url: None, payment_status, status, order_id: None }
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RedirectUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// An authenticated push notification from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The customer finished the checkout. Payment may still be outstanding for delayed payment methods.
    SessionCompleted(ProviderSession),
    AsyncPaymentSucceeded(ProviderSession),
    AsyncPaymentFailed(ProviderSession),
    SessionExpired(ProviderSession),
    /// Any other event type. Acknowledged and otherwise ignored.
    Ignored(String),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("The event signature could not be verified. {0}")]
    InvalidSignature(String),
    #[error("The event could not be interpreted. {0}")]
    MalformedEvent(String),
    #[error("The payment session {0} does not exist")]
    SessionNotFound(String),
    #[error("The request to the payment provider failed. {0}")]
    RequestFailed(String),
}

/// The external payment provider.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// The name of the HTTP header that carries the push notification signature.
    fn signature_header(&self) -> &'static str;

    /// Verifies the push notification against the raw, unparsed body before interpreting any of it.
    fn authenticate_event(&self, payload: &[u8], signature: &str) -> Result<ProviderEvent, ProviderError>;

    /// Creates a hosted payment session for the order, tagged with the order id.
    async fn create_session(&self, order: &Order, urls: &RedirectUrls) -> Result<ProviderSession, ProviderError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession, ProviderError>;
}
