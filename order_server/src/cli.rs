//! The server is configured from the environment only. Any command line argument prints the help text and the
//! configuration the server would start with, then exits.
use std::env::{self, VarError};

/// Echoed back as they are.
const PLAIN_VARS: [&str; 18] = [
    "RUST_LOG",
    "SHOP_HOST",
    "SHOP_PORT",
    "SHOP_DATABASE_URL",
    "SHOP_DB_MAX_CONNECTIONS",
    "SHOP_USE_X_FORWARDED_FOR",
    "SHOP_USE_FORWARDED",
    "SHOP_STOREFRONT_URL",
    "SHOP_SUCCESS_URL",
    "SHOP_CANCEL_URL",
    "SHOP_LENIENT_ITEMS",
    "SHOP_CURRENCY",
    "SHOP_STRIPE_API_URL",
    "SHOP_PROVIDER_TIMEOUT_SECS",
    "SHOP_WEBHOOK_TOLERANCE_SECS",
    "SHOP_EVENT_BUFFER",
    "SHOP_NOTIFY_RELAY_URL",
    "SHOP_NOTIFY_FROM",
];

/// Only reported as set or not set.
const SECRET_VARS: [&str; 2] = ["SHOP_STRIPE_SECRET_KEY", "SHOP_STRIPE_WEBHOOK_SECRET"];

const HELP: &str = include_str!("./cli-help.txt");

/// Returns true if the process should exit instead of starting the server.
pub fn handle_command_line_args() -> bool {
    if env::args().len() <= 1 {
        return false;
    }
    println!("\n{HELP}\n");
    println!("Current environment:");
    environment_report(|name| env::var(name)).iter().for_each(|line| println!("{line}"));
    true
}

fn environment_report<F>(lookup: F) -> Vec<String>
where F: Fn(&str) -> Result<String, VarError> {
    let plain = PLAIN_VARS.iter().map(|&name| (name, describe(lookup(name), false)));
    let secret = SECRET_VARS.iter().map(|&name| (name, describe(lookup(name), true)));
    plain.chain(secret).map(|(name, value)| format!("  {name:<30} {value}")).collect()
}

fn describe(value: Result<String, VarError>, secret: bool) -> String {
    match value {
        Err(VarError::NotPresent) => "Not set".into(),
        Ok(_) if secret => "(set)".into(),
        Err(VarError::NotUnicode(_)) if secret => "Invalid value".into(),
        Ok(s) => s,
        Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
    }
}
