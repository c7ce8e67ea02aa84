//! Stripe signs each webhook delivery with a `Stripe-Signature` header of the form `t=<unix ts>,v1=<hex hmac>`.
//! The HMAC-SHA256 is taken over `"{t}.{raw body}"` using the endpoint's signing secret. The body must be verified
//! exactly as received, before it is parsed.
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{StripeApiError, StripeEvent};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

/// Parses a `Stripe-Signature` header. Unknown schemes (e.g. `v0`) are ignored; several `v1` entries may be present
/// while a secret is being rolled.
pub fn parse_signature_header(header: &str) -> Result<SignatureHeader, StripeApiError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                let ts = value
                    .parse::<i64>()
                    .map_err(|_| StripeApiError::MalformedSignatureHeader("invalid timestamp".into()))?;
                timestamp = Some(ts);
            },
            "v1" => {
                if let Ok(sig) = hex::decode(value) {
                    signatures.push(sig);
                }
            },
            _ => {},
        }
    }
    let timestamp = timestamp.ok_or_else(|| StripeApiError::MalformedSignatureHeader("no timestamp".into()))?;
    if signatures.is_empty() {
        return Err(StripeApiError::MalformedSignatureHeader("no v1 signature".into()));
    }
    Ok(SignatureHeader { timestamp, signatures })
}

fn signed_payload_mac(payload: &[u8], secret: &str, timestamp: i64) -> Result<HmacSha256, StripeApiError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| StripeApiError::Initialization(format!("Invalid webhook secret. {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Hex encoded `v1` signature for the payload. Used to sign test deliveries.
pub fn compute_signature(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, StripeApiError> {
    let mac = signed_payload_mac(payload, secret, timestamp)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks the header against the raw payload. `now` is a unix timestamp in seconds.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: i64,
) -> Result<(), StripeApiError> {
    if secret.is_empty() {
        return Err(StripeApiError::SignatureMismatch);
    }
    let header = parse_signature_header(header)?;
    let matched = header.signatures.iter().try_fold(false, |found, sig| {
        if found {
            return Ok(true);
        }
        let mac = signed_payload_mac(payload, secret, header.timestamp)?;
        Ok::<bool, StripeApiError>(mac.verify_slice(sig).is_ok())
    })?;
    if !matched {
        return Err(StripeApiError::SignatureMismatch);
    }
    let tolerance = i64::try_from(tolerance.as_secs()).unwrap_or(i64::MAX);
    let age = now.saturating_sub(header.timestamp);
    if tolerance > 0 && age.abs() > tolerance {
        return Err(StripeApiError::TimestampOutOfTolerance { age, tolerance });
    }
    Ok(())
}

/// Verifies the delivery and only then parses the event.
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
) -> Result<StripeEvent, StripeApiError> {
    verify_signature(payload, header, secret, tolerance, chrono::Utc::now().timestamp())?;
    serde_json::from_slice(payload).map_err(|e| StripeApiError::JsonError(e.to_string()))
}
