//! # Shop server
//! This crate hosts the HTTP surface of the shop backend. It is responsible for:
//! * Turning a customer's cart into a `pending` order and a hosted payment session.
//! * Receiving payment notifications from the payment provider (push) and verification requests from the customer's
//!   browser (pull), and handing both to the order engine, which confirms each order exactly once.
//! * Read access to orders and stock levels.
//! * Telling customers when their payment has been received, or has failed.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook`: The payment provider's push notifications. Signed; see [`routes::payment_webhook`].
//! * `/api/checkout`: Creates an order and its payment session.
//! * `/api/verify-session`: The success page's check on a payment session.
//! * `/api/orders`, `/api/orders/{id}`, `/api/orders/session/{session_id}`: Order reads.
//! * `/api/inventory/{product_id}`: Stock level of a product.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod notifications;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
