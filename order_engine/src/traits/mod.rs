//! # Backend contracts
//!
//! This module defines the behaviour that a storage backend and a payment provider need to expose in order to be
//! driven by the order engine.
//!
//! * [`PaymentGatewayDatabase`] defines the highest level of behaviour for backends: inserting orders, attaching
//!   payment sessions and the atomic confirm-and-decrement transition.
//! * [`OrderManagement`] provides read access to orders and their line items.
//! * [`InventoryManagement`] exposes stock levels and the conditional decrement.
//! * [`PaymentProvider`] is the external payment provider, seen through a provider-neutral lens.
mod inventory_management;
mod order_management;
mod payment_gateway_database;
mod payment_provider;

mod data_objects;

pub use data_objects::{ConfirmResult, FailResult};
pub use inventory_management::InventoryManagement;
pub use order_management::OrderManagement;
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
pub use payment_provider::{
    PaymentProvider,
    ProviderError,
    ProviderEvent,
    ProviderSession,
    RedirectUrls,
    SessionStatus,
    SettlementStatus,
};
