//! # Order engine public API
//!
//! The `engine_api` module exposes the programmatic API of the order engine. The API is modular, so that clients can
//! pick and choose the functionality they want.
//!
//! * [`checkout_api`] creates pending orders and requests a payment session for them.
//! * [`order_flow_api`] runs the order state machine: `pending -> paid` and `pending -> failed`.
//! * [`reconciliation_api`] is the single entry point for both payment notification paths, the provider's webhook
//!   push and the customer's verification pull.
//! * [`orders_api`] and [`inventory_api`] are read-mostly views of the store.
//!
//! # API usage
//!
//! An API instance is created by supplying a backend that implements the traits the API needs.
//!
//! ```rust,ignore
//! use order_engine::{OrdersApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/shop.db", 25).await?;
//! let api = OrdersApi::new(db);
//! let orders = api.orders().await?;
//! ```
pub mod checkout_api;
pub mod errors;
pub mod inventory_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod orders_api;
pub mod reconciliation_api;
