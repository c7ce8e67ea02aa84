//! Adapts the Stripe client to the engine's provider-neutral [`PaymentProvider`] contract.
use std::str::FromStr;

use log::*;
use order_engine::{
    db_types::{Order, OrderId},
    traits::{
        PaymentProvider,
        ProviderError,
        ProviderEvent,
        ProviderSession,
        RedirectUrls,
        SessionStatus,
        SettlementStatus,
    },
};
use stripe_tools::{
    webhook::SIGNATURE_HEADER,
    CheckoutSession,
    NewCheckoutSession,
    SessionLineItem,
    StripeApi,
    StripeApiError,
    StripeConfig,
    StripeEvent,
};

/// The metadata key that ties a Stripe session to one of our orders.
pub const ORDER_ID_KEY: &str = "order_id";

#[derive(Clone)]
pub struct StripeProvider {
    api: StripeApi,
}

impl StripeProvider {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let api = StripeApi::new(config)?;
        Ok(Self { api })
    }

    pub fn api(&self) -> &StripeApi {
        &self.api
    }
}

impl PaymentProvider for StripeProvider {
    fn signature_header(&self) -> &'static str {
        SIGNATURE_HEADER
    }

    fn authenticate_event(&self, payload: &[u8], signature: &str) -> Result<ProviderEvent, ProviderError> {
        let event = self.api.construct_event(payload, signature).map_err(|e| {
            if e.is_signature_error() {
                ProviderError::InvalidSignature(e.to_string())
            } else {
                ProviderError::MalformedEvent(e.to_string())
            }
        })?;
        debug!("Stripe event {} ({}) authenticated", event.id, event.event_type);
        to_provider_event(&event)
    }

    async fn create_session(&self, order: &Order, urls: &RedirectUrls) -> Result<ProviderSession, ProviderError> {
        let request = new_session_request(order, urls);
        let session = self.api.create_checkout_session(&request).await.map_err(request_failed)?;
        Ok(to_provider_session(session))
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession, ProviderError> {
        match self.api.retrieve_session(session_id).await {
            Ok(session) => Ok(to_provider_session(session)),
            Err(StripeApiError::QueryError { status: 404, .. }) | Err(StripeApiError::RestRequestError(_)) => {
                Err(ProviderError::SessionNotFound(session_id.to_string()))
            },
            Err(e) => Err(request_failed(e)),
        }
    }
}

fn request_failed(e: StripeApiError) -> ProviderError {
    warn!("Stripe request failed. {e}");
    ProviderError::RequestFailed(e.to_string())
}

pub fn new_session_request(order: &Order, urls: &RedirectUrls) -> NewCheckoutSession {
    let line_items = order
        .items
        .iter()
        .map(|item| SessionLineItem { name: item.name.clone(), unit_amount: item.unit_price, quantity: item.quantity })
        .collect();
    NewCheckoutSession {
        line_items,
        success_url: urls.success_url.clone(),
        cancel_url: urls.cancel_url.clone(),
        metadata: vec![(ORDER_ID_KEY.to_string(), order.id.value().to_string())],
        customer_email: order.customer.customer_email.clone(),
    }
}

pub fn to_provider_session(session: CheckoutSession) -> ProviderSession {
    let order_id = session.metadata_value(ORDER_ID_KEY).and_then(|s| OrderId::from_str(s).ok());
    ProviderSession {
        payment_status: SettlementStatus::from_provider(&session.payment_status),
        status: SessionStatus::from_provider(session.status.as_deref()),
        order_id,
        url: session.url,
        id: session.id,
    }
}

fn to_provider_event(event: &StripeEvent) -> Result<ProviderEvent, ProviderError> {
    let session = || {
        event.checkout_session().map(to_provider_session).map_err(|e| ProviderError::MalformedEvent(e.to_string()))
    };
    let result = match event.event_type.as_str() {
        "checkout.session.completed" => ProviderEvent::SessionCompleted(session()?),
        "checkout.session.async_payment_succeeded" => ProviderEvent::AsyncPaymentSucceeded(session()?),
        "checkout.session.async_payment_failed" => ProviderEvent::AsyncPaymentFailed(session()?),
        "checkout.session.expired" => ProviderEvent::SessionExpired(session()?),
        other => ProviderEvent::Ignored(other.to_string()),
    };
    Ok(result)
}
