use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{OrderId, OrderStatusType},
    order_objects::{PushOutcome, TransitionOutcome, VerifyResult},
    traits::{
        PaymentGatewayDatabase,
        PaymentProvider,
        ProviderEvent,
        ProviderSession,
        SessionStatus,
    },
    OrderFlowError,
    OrderFlowApi,
};

/// The Reconciliation Gateway.
///
/// Payment confirmation arrives over two independent channels: the provider's webhook (push) and the customer's
/// browser asking us to check on a session (pull). Either may arrive first, either may arrive more than once, and
/// they may arrive at the same time. Both are reduced to the same idempotent [`ReconciliationApi::confirm`] call.
pub struct ReconciliationApi<B, P> {
    flow: OrderFlowApi<B>,
    provider: P,
}

impl<B, P> Debug for ReconciliationApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, P> ReconciliationApi<B, P> {
    pub fn new(flow: OrderFlowApi<B>, provider: P) -> Self {
        Self { flow, provider }
    }

    pub fn flow(&self) -> &OrderFlowApi<B> {
        &self.flow
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<B, P> ReconciliationApi<B, P>
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    /// The name of the header carrying the push notification signature.
    pub fn signature_header(&self) -> &'static str {
        self.provider.signature_header()
    }

    /// The idempotent confirmation. A paid order is returned as is, without touching the store. A pending order goes
    /// through the atomic confirm transition, which checks the status again under the write lock.
    pub async fn confirm(
        &self,
        order_id: OrderId,
        session_id: Option<&str>,
    ) -> Result<TransitionOutcome, OrderFlowError> {
        let order =
            self.flow.db().fetch_order_by_id(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        match order.status {
            OrderStatusType::Paid => {
                debug!("🔄️✅️ Order {order_id} is already paid. Returning it unchanged.");
                Ok(TransitionOutcome::no_change(order))
            },
            OrderStatusType::Failed => {
                Err(OrderFlowError::InvalidTransition { id: order_id, status: order.status, action: "confirmed" })
            },
            OrderStatusType::Pending => self.flow.confirm_payment(order_id, session_id).await,
        }
    }

    /// The push path. The signature is checked over the raw body before anything in it is trusted.
    pub async fn handle_push(&self, payload: &[u8], signature: &str) -> Result<PushOutcome, OrderFlowError> {
        let event = self.provider.authenticate_event(payload, signature).map_err(|e| {
            warn!("🚨️ Rejected a payment notification. {e}");
            OrderFlowError::from(e)
        })?;
        trace!("🔄️📬️ Authenticated payment notification: {event:?}");
        match event {
            ProviderEvent::SessionCompleted(session) if !session.payment_status.is_settled() => {
                let order_id = self.resolve_order_id(&session).await.ok();
                info!(
                    "🔄️📬️ Checkout for session {} completed, but payment is {}. Waiting for settlement.",
                    session.id, session.payment_status
                );
                Ok(PushOutcome::Pending { order_id, payment_status: session.payment_status })
            },
            ProviderEvent::SessionCompleted(session) | ProviderEvent::AsyncPaymentSucceeded(session) => {
                let order_id = self.resolve_order_id(&session).await?;
                let outcome = self.confirm(order_id, Some(&session.id)).await?;
                Ok(PushOutcome::Confirmed(outcome))
            },
            ProviderEvent::AsyncPaymentFailed(session) => {
                let order_id = self.resolve_order_id(&session).await?;
                let outcome = self.flow.mark_payment_failed(order_id, "payment_failed").await?;
                Ok(PushOutcome::Failed(outcome))
            },
            ProviderEvent::SessionExpired(session) => {
                let order_id = self.resolve_order_id(&session).await?;
                let outcome = self.flow.mark_payment_failed(order_id, "expired").await?;
                Ok(PushOutcome::Failed(outcome))
            },
            ProviderEvent::Ignored(event_type) => {
                debug!("🔄️📬️ Ignoring payment notification of type {event_type}");
                Ok(PushOutcome::Ignored { event_type })
            },
        }
    }

    /// The pull path. Asks the provider for the session's status and confirms the order only if the payment has
    /// settled. An unsettled, still open session is a neutral result, not an error.
    pub async fn verify_session(&self, session_id: &str) -> Result<VerifyResult, OrderFlowError> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(OrderFlowError::Validation("session_id is required".into()));
        }
        let session = self.provider.retrieve_session(session_id).await?;
        debug!("🔄️🔎️ Session {session_id} is {:?} with payment {}", session.status, session.payment_status);
        if session.payment_status.is_settled() {
            let order_id = self.resolve_order_id(&session).await?;
            let outcome = self.confirm(order_id, Some(&session.id)).await?;
            return Ok(VerifyResult {
                confirmed: true,
                order: Some(outcome.order),
                payment_status: session.payment_status,
                warnings: outcome.warnings,
            });
        }
        let order_id = self.resolve_order_id(&session).await.ok();
        let (order, warnings) = match (session.status, order_id) {
            (SessionStatus::Expired, Some(id)) => {
                let outcome = self.flow.mark_payment_failed(id, "expired").await?;
                (Some(outcome.order), outcome.warnings)
            },
            (_, Some(id)) => (self.flow.db().fetch_order_by_id(id).await?, vec![]),
            (_, None) => (None, vec![]),
        };
        Ok(VerifyResult { confirmed: false, order, payment_status: session.payment_status, warnings })
    }

    /// The order id from the session metadata or, failing that, the order the session was attached to.
    async fn resolve_order_id(&self, session: &ProviderSession) -> Result<OrderId, OrderFlowError> {
        if let Some(id) = session.order_id {
            return Ok(id);
        }
        match self.flow.db().fetch_order_by_session(&session.id).await? {
            Some(order) => {
                debug!(
                    "🔄️ Session {} has no order id in its metadata. Matched order {} by reference.",
                    session.id, order.id
                );
                Ok(order.id)
            },
            None => Err(OrderFlowError::MalformedEvent(format!("Session {} does not reference an order", session.id))),
        }
    }
}
