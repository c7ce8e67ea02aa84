use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderPaidEvent, PaymentFailedEvent},
    order_objects::TransitionOutcome,
    traits::{ConfirmResult, FailResult, PaymentGatewayDatabase},
    OrderFlowError,
};

/// `OrderFlowApi` is the order state machine. Orders start out `pending` and make exactly one transition, either to
/// `paid` (taking stock for every line item) or to `failed` (no stock effect).
///
/// Events are published after the transition has committed, and only by the call that applied it. Publishing never
/// waits; if it cannot be done, the problem is returned as a warning on the outcome and the order state stands.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Moves the order from `pending` to `paid`, taking the stock for every line item in the same unit of work.
    ///
    /// If the order is already paid, the current order is returned unchanged and no event is published. If any
    /// product is short of stock, nothing changes and [`OrderFlowError::InsufficientStock`] is returned.
    pub async fn confirm_payment(
        &self,
        order_id: OrderId,
        session_id: Option<&str>,
    ) -> Result<TransitionOutcome, OrderFlowError> {
        trace!("🔄️✅️ Confirming payment for order {order_id}");
        match self.db.confirm_payment(order_id, session_id).await? {
            ConfirmResult::Confirmed(order) => {
                info!("🔄️✅️ Order {order_id} is paid ({} {})", order.total, order.currency);
                let warnings = self.call_order_paid_hook(&order);
                Ok(TransitionOutcome { warnings, ..TransitionOutcome::applied(order) })
            },
            ConfirmResult::AlreadyPaid(order) => {
                debug!("🔄️✅️ Order {order_id} was already paid. Nothing to do.");
                Ok(TransitionOutcome::no_change(order))
            },
            ConfirmResult::InsufficientStock { order_id, product_id, requested } => {
                warn!(
                    "🔄️✅️ Order {order_id} could not be confirmed: not enough stock of product {product_id}. The \
                     order remains pending for follow-up."
                );
                Err(OrderFlowError::InsufficientStock { order_id, product_id, requested })
            },
        }
    }

    /// Moves the order from `pending` to `failed`. Orders that have already left `pending` are returned unchanged.
    pub async fn mark_payment_failed(
        &self,
        order_id: OrderId,
        reason: &str,
    ) -> Result<TransitionOutcome, OrderFlowError> {
        trace!("🔄️❌️ Marking payment for order {order_id} as failed ({reason})");
        match self.db.mark_payment_failed(order_id).await? {
            FailResult::Failed(order) => {
                info!("🔄️❌️ Payment for order {order_id} failed: {reason}");
                let warnings = self.call_payment_failed_hook(&order, reason);
                Ok(TransitionOutcome { warnings, ..TransitionOutcome::applied(order) })
            },
            FailResult::Unchanged(order) => {
                if order.status == OrderStatusType::Paid {
                    warn!(
                        "🔄️❌️ Payment failure ({reason}) reported for order {order_id}, which is already paid. \
                         Ignoring."
                    );
                } else {
                    debug!("🔄️❌️ Order {order_id} is already marked as failed.");
                }
                Ok(TransitionOutcome::no_change(order))
            },
        }
    }

    fn call_order_paid_hook(&self, order: &Order) -> Vec<String> {
        let mut warnings = vec![];
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📦️ Notifying order paid hook subscribers");
            if let Err(e) = emitter.try_publish(OrderPaidEvent::new(order.clone())) {
                warn!("🔄️📦️ Order paid notification for {} was not dispatched. {e}", order.id);
                warnings.push(format!("Order paid notification was not dispatched. {e}"));
            }
        }
        warnings
    }

    fn call_payment_failed_hook(&self, order: &Order, reason: &str) -> Vec<String> {
        let mut warnings = vec![];
        for emitter in &self.producers.payment_failed_producer {
            debug!("🔄️📦️ Notifying payment failed hook subscribers");
            if let Err(e) = emitter.try_publish(PaymentFailedEvent::new(order.clone(), reason)) {
                warn!("🔄️📦️ Payment failed notification for {} was not dispatched. {e}", order.id);
                warnings.push(format!("Payment failed notification was not dispatched. {e}"));
            }
        }
        warnings
    }
}
