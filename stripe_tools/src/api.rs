use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::StripeConfig,
    data_objects::{CheckoutSession, NewCheckoutSession},
    webhook,
    StripeApiError,
    StripeEvent,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let mut val = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.api_url.trim_end_matches('/'))
    }

    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(String, String)]>,
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(form) = form {
            req = req.form(form);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await?;
            Err(StripeApiError::QueryError { status, message })
        }
    }

    pub async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
    ) -> Result<CheckoutSession, StripeApiError> {
        let params = session.form_params(&self.config.currency);
        debug!("Creating checkout session with {} line items", session.line_items.len());
        let result = self.rest_query::<CheckoutSession>(Method::POST, "/checkout/sessions", Some(&params)).await?;
        info!("Created checkout session {}", result.id);
        Ok(result)
    }

    pub async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, StripeApiError> {
        if session_id.is_empty() || !session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(StripeApiError::RestRequestError(format!("Invalid session id: {session_id}")));
        }
        let path = format!("/checkout/sessions/{session_id}");
        debug!("Retrieving checkout session {session_id}");
        let result = self.rest_query::<CheckoutSession>(Method::GET, &path, None).await?;
        debug!("Checkout session {session_id} has payment status '{}'", result.payment_status);
        Ok(result)
    }

    /// Authenticates a raw webhook body against the configured signing secret and parses it.
    pub fn construct_event(&self, payload: &[u8], signature_header: &str) -> Result<StripeEvent, StripeApiError> {
        webhook::construct_event(
            payload,
            signature_header,
            self.config.webhook_secret.reveal(),
            self.config.webhook_tolerance,
        )
    }
}
