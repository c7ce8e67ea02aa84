//! A deliberately small Stripe client: hosted Checkout sessions over the REST API, and verification of signed
//! webhook deliveries. Nothing here touches the order database.
mod api;
mod config;
mod error;

mod data_objects;
pub mod webhook;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{CheckoutSession, NewCheckoutSession, SessionLineItem, StripeEvent, StripeEventData};
pub use error::StripeApiError;
