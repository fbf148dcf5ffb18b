use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha512;

use crate::app_error::{AppError, AppResult};

type HmacSha512 = Hmac<Sha512>;

/// Header Paystack uses to carry the payload signature.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Lowercase hex HMAC-SHA512 of `payload` under `secret`.
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks a supplied signature against the raw transport bytes.
///
/// Must be given the exact bytes received, never a re-serialized body.
pub fn verify(payload: &[u8], supplied_signature: Option<&str>, secret: &str) -> bool {
    let Some(supplied) = supplied_signature else {
        return false;
    };
    let expected = sign(payload, secret);
    constant_time_compare(supplied.trim(), &expected)
}

/// Webhook-path entry point: a missing secret rejects the request outright.
pub fn verify_with_configured_secret(
    payload: &[u8],
    supplied_signature: Option<&str>,
    secret: Option<&SecretString>,
) -> AppResult<()> {
    let secret = secret.ok_or_else(|| {
        tracing::error!("Webhook signing secret is not configured; rejecting webhook");
        AppError::Configuration("Webhook signing secret is not configured".into())
    })?;

    if verify(payload, supplied_signature, secret.expose_secret()) {
        Ok(())
    } else {
        Err(AppError::InvalidSignature)
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
