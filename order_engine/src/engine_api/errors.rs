use thiserror::Error;

use crate::{
    db_types::{NewOrderError, OrderId, OrderStatusType, ProductId},
    traits::{PaymentGatewayError, ProviderError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid request. {0}")]
    Validation(String),
    #[error("The payment notification could not be authenticated. {0}")]
    Signature(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Payment session {0} does not exist")]
    SessionNotFound(String),
    #[error("Not enough stock of product {product_id} to fill order {order_id} ({requested} units requested)")]
    InsufficientStock { order_id: OrderId, product_id: ProductId, requested: i64 },
    #[error("The payment event could not be interpreted. {0}")]
    MalformedEvent(String),
    #[error("Order {id} is {status} and cannot be {action}")]
    InvalidTransition { id: OrderId, status: OrderStatusType, action: &'static str },
    #[error("The payment provider call failed. {0}")]
    Provider(String),
    #[error("Database error. {0}")]
    Database(String),
}

impl From<PaymentGatewayError> for OrderFlowError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::DatabaseError(s) => Self::Database(s),
            PaymentGatewayError::OrderNotFound(id) => Self::OrderNotFound(id),
            PaymentGatewayError::InvalidTransition { id, status, action } => {
                Self::InvalidTransition { id, status, action }
            },
        }
    }
}

impl From<ProviderError> for OrderFlowError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::InvalidSignature(s) => Self::Signature(s),
            ProviderError::MalformedEvent(s) => Self::MalformedEvent(s),
            ProviderError::SessionNotFound(s) => Self::SessionNotFound(s),
            ProviderError::RequestFailed(s) => Self::Provider(s),
        }
    }
}

impl From<NewOrderError> for OrderFlowError {
    fn from(e: NewOrderError) -> Self {
        Self::Validation(e.to_string())
    }
}
