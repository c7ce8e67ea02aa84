//! Order Engine
//!
//! The order engine keeps three things consistent with each other: the status of a customer's order, the payment
//! confirmation reported by the payment provider, and the stock level of every product sold. It is provider-agnostic;
//! the provider is reached through the [`PaymentProvider`] trait.
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@sqlite`]). SQLite is the only supported backend. You should never need to call the low-level
//!    functions directly. Use the public API instead. The data types used in the database are defined in the
//!    [`mod@db_types`] module and are public.
//! 2. Backend contracts ([`mod@traits`]). A backend needs to implement these traits in order to serve as the order
//!    store and inventory ledger for the engine.
//! 3. The public API (`engine_api`). [`CheckoutApi`] creates orders and payment sessions, [`OrderFlowApi`] runs the
//!    order state machine and [`ReconciliationApi`] turns webhook pushes and browser verification calls into one
//!    idempotent confirmation.
//!
//! The engine also emits events after an order is paid or its payment fails. A small actor-style pub-sub in
//! [`mod@events`] lets you hook into these, e.g. to send the customer an email.
pub mod db_types;
pub mod events;
mod engine_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use engine_api::{
    checkout_api::CheckoutApi,
    errors::OrderFlowError,
    inventory_api::InventoryApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    orders_api::OrdersApi,
    reconciliation_api::ReconciliationApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    ConfirmResult,
    InventoryManagement,
    OrderManagement,
    PaymentGatewayDatabase,
    PaymentGatewayError,
    PaymentProvider,
    ProviderError,
};
