use std::time::Duration;

use log::*;
use shop_common::{
    helpers::{env_parse, env_seconds},
    Secret,
};

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_WEBHOOK_TOLERANCE: Duration = Duration::from_secs(300);
pub const DEFAULT_CURRENCY: &str = "thb";

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    /// Upper bound on every outbound call to Stripe.
    pub timeout: Duration,
    /// Maximum age of a signed webhook delivery.
    pub webhook_tolerance: Duration,
    /// ISO currency code, lowercase, for every line item sent to Checkout.
    pub currency: String,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret_key: Secret::default(),
            webhook_secret: Secret::default(),
            timeout: DEFAULT_TIMEOUT,
            webhook_tolerance: DEFAULT_WEBHOOK_TOLERANCE,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("SHOP_STRIPE_API_URL").unwrap_or_else(|_| {
            info!("🪛️ SHOP_STRIPE_API_URL not set, using {DEFAULT_STRIPE_API_URL}");
            DEFAULT_STRIPE_API_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("SHOP_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SHOP_STRIPE_SECRET_KEY not set. Checkout sessions cannot be created.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("SHOP_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ SHOP_STRIPE_WEBHOOK_SECRET not set. Every webhook delivery will be rejected.");
            String::default()
        }));
        let timeout = env_seconds("SHOP_PROVIDER_TIMEOUT_SECS").unwrap_or_else(|| {
            info!("🪛️ SHOP_PROVIDER_TIMEOUT_SECS not set or invalid, using {}s", DEFAULT_TIMEOUT.as_secs());
            DEFAULT_TIMEOUT
        });
        let webhook_tolerance = env_seconds("SHOP_WEBHOOK_TOLERANCE_SECS").unwrap_or(DEFAULT_WEBHOOK_TOLERANCE);
        let currency = env_parse::<String>("SHOP_CURRENCY")
            .map(|s| s.to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        Self { api_url, secret_key, webhook_secret, timeout, webhook_tolerance, currency }
    }

    pub fn with_secrets(mut self, secret_key: &str, webhook_secret: &str) -> Self {
        self.secret_key = Secret::from(secret_key);
        self.webhook_secret = Secret::from(webhook_secret);
        self
    }
}
