//! Customer notifications
//!
//! When an order is paid, or its payment fails, the engine publishes an event. The hooks registered here turn those
//! events into a plain-text message for the customer and hand it to a mail relay:
//!
//! 1. OrderPaidEvent - a payment confirmation listing the items, the total and the shipping address.
//! 2. PaymentFailedEvent - a short note with a link back to the cart so the customer can try again.
//!
//! Orders without an email address are skipped. If no relay is configured, the message is logged instead. Delivery
//! is best effort: a failure is logged and dropped, and never affects the order.
use std::{future::Future, pin::Pin, time::Duration};

use log::*;
use order_engine::{
    db_types::Order,
    events::{EventHandlers, EventHooks},
};
use serde::{Deserialize, Serialize};

use crate::config::NotificationConfig;

const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub fn payment_confirmation(order: &Order, config: &NotificationConfig) -> Option<CustomerMessage> {
    let to = order.customer.customer_email.clone()?;
    let name = order.customer.customer_name.as_deref().unwrap_or("customer");
    let mut body = format!("Hello {name},\n\nThank you! We have received your payment for order {}.\n\n", order.id);
    body.push_str(&format!("Order date: {}\n\n", order.created_at.format("%Y-%m-%d")));
    for item in &order.items {
        let line_total = item.line_total().map(|m| m.to_string()).unwrap_or_else(|| "-".into());
        body.push_str(&format!(
            "  {} x {} @ {} = {line_total} {}\n",
            item.quantity,
            item.name,
            item.unit_price,
            order.currency.to_uppercase()
        ));
    }
    body.push_str(&format!("\nTotal: {} {}\n", order.total, order.currency.to_uppercase()));
    if let Some(address) = &order.customer.address {
        body.push_str(&format!("\nShipping to:\n{address}\n"));
    }
    body.push_str("\nYour items will be shipped within 3-5 business days.\n");
    Some(CustomerMessage {
        from: config.from.clone(),
        to,
        subject: format!("Payment received - order {}", order.id),
        body,
    })
}

pub fn payment_failed(order: &Order, reason: &str, config: &NotificationConfig) -> Option<CustomerMessage> {
    let to = order.customer.customer_email.clone()?;
    let name = order.customer.customer_name.as_deref().unwrap_or("customer");
    let reason = match reason {
        "expired" => "the payment session expired before payment was completed",
        _ => "the payment could not be completed",
    };
    let body = format!(
        "Hello {name},\n\nWe could not take payment for order {} ({} {}) because {reason}.\n\nYou can try again \
         here: {}\n",
        order.id,
        order.total,
        order.currency.to_uppercase(),
        config.retry_url(order.id.value())
    );
    Some(CustomerMessage {
        from: config.from.clone(),
        to,
        subject: format!("Payment unsuccessful - order {}", order.id),
        body,
    })
}

#[derive(Clone)]
pub struct Notifier {
    config: NotificationConfig,
    client: reqwest::Client,
}

impl Notifier {
    pub fn new(config: NotificationConfig) -> Self {
        let client = reqwest::Client::builder().timeout(RELAY_TIMEOUT).build().unwrap_or_else(|e| {
            warn!("📬️ Could not configure the notification client. {e}. Using the defaults.");
            reqwest::Client::new()
        });
        Self { config, client }
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    pub async fn deliver(&self, message: CustomerMessage) {
        let Some(relay) = &self.config.relay_url else {
            info!("📬️ No mail relay configured. Message for {}:\n{}\n{}", message.to, message.subject, message.body);
            return;
        };
        match self.client.post(relay).json(&message).send().await.and_then(|r| r.error_for_status()) {
            Ok(_) => info!("📬️ '{}' sent to {}", message.subject, message.to),
            Err(e) => error!("📬️ Could not send '{}' to {}. {e}", message.subject, message.to),
        }
    }
}

fn no_op() -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async {})
}

pub fn create_notification_handlers(notifier: Notifier, buffer_size: usize) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let paid_notifier = notifier.clone();
    hooks.on_order_paid(move |ev| {
        let Some(message) = payment_confirmation(&ev.order, paid_notifier.config()) else {
            debug!("📬️ Order {} has no email address. No confirmation sent.", ev.order.id);
            return no_op();
        };
        let notifier = paid_notifier.clone();
        Box::pin(async move { notifier.deliver(message).await })
    });
    hooks.on_payment_failed(move |ev| {
        let Some(message) = payment_failed(&ev.order, &ev.reason, notifier.config()) else {
            debug!("📬️ Order {} has no email address. No failure notice sent.", ev.order.id);
            return no_op();
        };
        let notifier = notifier.clone();
        Box::pin(async move { notifier.deliver(message).await })
    });
    EventHandlers::new(buffer_size, hooks)
}
