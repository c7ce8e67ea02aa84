use std::env;

use log::*;
use order_engine::{order_objects::InputPolicy, traits::RedirectUrls};
use shop_common::helpers::{env_flag, env_parse};
use stripe_tools::StripeConfig;

const DEFAULT_SHOP_HOST: &str = "127.0.0.1";
const DEFAULT_SHOP_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/shop.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_STOREFRONT_URL: &str = "http://localhost:5173";
const DEFAULT_EVENT_BUFFER: usize = 256;
const DEFAULT_NOTIFY_FROM: &str = "Shop <orders@localhost>";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Where customers are sent back to after paying (or giving up). `{CHECKOUT_SESSION_ID}` is filled in by the
    /// payment provider.
    pub redirect_urls: RedirectUrls,
    /// How checkout treats malformed prices and quantities.
    pub input_policy: InputPolicy,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// Capacity of each event channel. When a channel is full, notifications are dropped (and logged), never waited
    /// for.
    pub event_buffer: usize,
    pub notifications: NotificationConfig,
    pub stripe: StripeConfig,
}

/// How to find the client's address when the server sits behind a proxy.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProxyConfig {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    /// If set, customer messages are POSTed here as JSON. Otherwise they are only logged.
    pub relay_url: Option<String>,
    pub from: String,
    /// The storefront's base URL, used for the "try again" link in payment failure messages.
    pub storefront_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { relay_url: None, from: DEFAULT_NOTIFY_FROM.to_string(), storefront_url: DEFAULT_STOREFRONT_URL.into() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SHOP_HOST.to_string(),
            port: DEFAULT_SHOP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            redirect_urls: default_redirect_urls(DEFAULT_STOREFRONT_URL),
            input_policy: InputPolicy::Strict,
            use_x_forwarded_for: false,
            use_forwarded: false,
            event_buffer: DEFAULT_EVENT_BUFFER,
            notifications: NotificationConfig::default(),
            stripe: StripeConfig::default(),
        }
    }
}

fn default_redirect_urls(storefront: &str) -> RedirectUrls {
    let base = storefront.trim_end_matches('/');
    RedirectUrls {
        success_url: format!("{base}/success?session_id={{CHECKOUT_SESSION_ID}}"),
        cancel_url: format!("{base}/cart"),
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig { use_x_forwarded_for: self.use_x_forwarded_for, use_forwarded: self.use_forwarded }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SHOP_HOST").ok().unwrap_or_else(|| DEFAULT_SHOP_HOST.into());
        let port = env::var("SHOP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SHOP_PORT. {e} Using the default, {DEFAULT_SHOP_PORT}, \
                         instead."
                    );
                    DEFAULT_SHOP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SHOP_PORT);
        let database_url = env::var("SHOP_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SHOP_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let max_connections = env_parse::<u32>("SHOP_DB_MAX_CONNECTIONS").filter(|n| *n > 0).unwrap_or_else(|| {
            debug!("🪛️ SHOP_DB_MAX_CONNECTIONS not set or invalid. Using {DEFAULT_MAX_CONNECTIONS}.");
            DEFAULT_MAX_CONNECTIONS
        });
        let notifications = NotificationConfig::from_env_or_default();
        let defaults = default_redirect_urls(&notifications.storefront_url);
        let redirect_urls = RedirectUrls {
            success_url: env::var("SHOP_SUCCESS_URL").ok().filter(|s| !s.is_empty()).unwrap_or(defaults.success_url),
            cancel_url: env::var("SHOP_CANCEL_URL").ok().filter(|s| !s.is_empty()).unwrap_or(defaults.cancel_url),
        };
        let input_policy =
            if env_flag("SHOP_LENIENT_ITEMS", false) { InputPolicy::Lenient } else { InputPolicy::Strict };
        if input_policy == InputPolicy::Lenient {
            warn!(
                "🪛️ SHOP_LENIENT_ITEMS is set. Missing or malformed prices and quantities will be replaced with \
                 defaults instead of being rejected."
            );
        }
        let use_x_forwarded_for = env_flag("SHOP_USE_X_FORWARDED_FOR", false);
        let use_forwarded = env_flag("SHOP_USE_FORWARDED", false);
        let event_buffer = env_parse::<usize>("SHOP_EVENT_BUFFER").filter(|n| *n > 0).unwrap_or(DEFAULT_EVENT_BUFFER);
        let stripe = StripeConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            max_connections,
            redirect_urls,
            input_policy,
            use_x_forwarded_for,
            use_forwarded,
            event_buffer,
            notifications,
            stripe,
        }
    }
}

impl NotificationConfig {
    pub fn from_env_or_default() -> Self {
        let relay_url = env::var("SHOP_NOTIFY_RELAY_URL").ok().filter(|s| !s.trim().is_empty());
        if relay_url.is_none() {
            info!("🪛️ SHOP_NOTIFY_RELAY_URL is not set. Customer notifications will be logged, not sent.");
        }
        let from = env::var("SHOP_NOTIFY_FROM").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| {
            debug!("🪛️ SHOP_NOTIFY_FROM is not set. Using {DEFAULT_NOTIFY_FROM}.");
            DEFAULT_NOTIFY_FROM.into()
        });
        let storefront_url = env::var("SHOP_STOREFRONT_URL").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| {
            info!("🪛️ SHOP_STOREFRONT_URL is not set. Using {DEFAULT_STOREFRONT_URL}.");
            DEFAULT_STOREFRONT_URL.into()
        });
        Self { relay_url, from, storefront_url }
    }

    pub fn retry_url(&self, order_id: i64) -> String {
        format!("{}/cart?retryOrder={order_id}", self.storefront_url.trim_end_matches('/'))
    }
}
