use std::fmt::Debug;

use log::*;

use crate::{
    db_types::NewOrder,
    order_objects::{CheckoutRequest, CheckoutResult, InputPolicy},
    traits::{PaymentGatewayDatabase, PaymentProvider, RedirectUrls},
    OrderFlowError,
};

/// Creates pending orders and the payment sessions that will (eventually) settle them.
pub struct CheckoutApi<B, P> {
    db: B,
    provider: P,
    policy: InputPolicy,
    currency: String,
    default_urls: RedirectUrls,
}

impl<B, P> Debug for CheckoutApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({} input, {})", self.policy, self.currency)
    }
}

impl<B, P> CheckoutApi<B, P> {
    pub fn new(db: B, provider: P, currency: &str, default_urls: RedirectUrls) -> Self {
        let currency = currency.to_ascii_lowercase();
        Self { db, provider, policy: InputPolicy::default(), currency, default_urls }
    }

    pub fn with_policy(mut self, policy: InputPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> InputPolicy {
        self.policy
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, P> CheckoutApi<B, P>
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    /// Validates the cart, stores a `pending` order with its line item snapshots, asks the provider for a payment
    /// session tagged with the new order id, and records the session reference on the order.
    ///
    /// If the provider call fails, the order stays `pending` with no session reference and
    /// [`OrderFlowError::Provider`] is returned.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutResult, OrderFlowError> {
        let items = request.line_items(self.policy)?;
        let new_order = NewOrder::new(items, request.customer_details(), &self.currency)?;
        let total = new_order.total();
        let order = self.db.insert_order(new_order).await?;
        debug!("🧾️ Order {} created for {total} {} with {} items", order.id, order.currency, order.items.len());
        let urls = request.redirect_urls(&self.default_urls);
        let session = self.provider.create_session(&order, &urls).await.map_err(|e| {
            warn!("🧾️ Could not create a payment session for order {}. It stays pending without one. {e}", order.id);
            OrderFlowError::Provider(e.to_string())
        })?;
        let order = self.db.attach_session(order.id, &session.id).await?;
        info!("🧾️ Order {} is waiting for payment in session {}", order.id, session.id);
        Ok(CheckoutResult { session_id: session.id, url: session.url, order })
    }
}
