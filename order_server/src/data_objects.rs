use std::fmt::Display;

use order_engine::order_objects::PushOutcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifySessionRequest {
    #[serde(default, alias = "sessionId")]
    pub session_id: String,
}

/// The webhook acknowledgement. `received` is always true for anything that passed authentication; problems
/// with the order itself are reported in `error` so that the provider does not retry them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub received: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PushOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookResponse {
    pub fn handled(outcome: PushOutcome) -> Self {
        Self { received: true, outcome: Some(outcome), error: None }
    }

    pub fn refused<S: Display>(error: S) -> Self {
        Self { received: true, outcome: None, error: Some(error.to_string()) }
    }
}
