use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The request to Stripe timed out")]
    Timeout,
    #[error("Missing or malformed Stripe-Signature header: {0}")]
    MalformedSignatureHeader(String),
    #[error("Webhook signature does not match the payload")]
    SignatureMismatch,
    #[error("Webhook timestamp is outside the tolerance window ({age}s > {tolerance}s)")]
    TimestampOutOfTolerance { age: i64, tolerance: i64 },
}

impl StripeApiError {
    /// True for the errors that mean the webhook could not be authenticated.
    pub fn is_signature_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedSignatureHeader(_) | Self::SignatureMismatch | Self::TimestampOutOfTolerance { .. }
        )
    }
}

impl From<reqwest::Error> for StripeApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_builder() {
            Self::RestRequestError(e.to_string())
        } else {
            Self::RestResponseError(e.to_string())
        }
    }
}
