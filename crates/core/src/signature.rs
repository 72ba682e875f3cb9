//! HMAC-SHA256 verification of inbound webhook bodies.
//!
//! Both Gitea and SonarQube sign the raw request body with a shared secret and
//! send the hex encoded digest in a header. A webhook source is only trusted when
//! the secret configuration and the presence of the header agree.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a webhook signature check fails. Each variant carries the name of the
/// webhook source (e.g. `Gitea`) so the log line identifies the sender.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature header received but no {0} webhook secret configured. Request rejected due to possible configuration mismatch.")]
    UnexpectedSignature(String),

    #[error("{0} webhook secret configured but no signature header received. Request rejected due to possible configuration mismatch.")]
    MissingSignature(String),

    #[error("Error decoding signature for {0} webhook.")]
    UndecodableSignature(String),

    #[error("Signature header does not match the received {0} webhook content. Request rejected.")]
    Mismatch(String),
}

/// Checks that `signature_hex` is the HMAC-SHA256 of `payload` under `secret`.
///
/// An empty secret together with an empty signature means the source is not
/// configured for signing, which is accepted. The digest comparison runs in
/// constant time.
///
/// # Arguments
///
/// * `payload` - The raw request body exactly as received
/// * `secret` - The configured webhook secret, empty when none is configured
/// * `signature_hex` - The hex digest from the signature header, empty when absent
/// * `source` - Human readable name of the webhook source, used in error messages
///
/// # Examples
///
/// ```
/// use gitea_sonarqube_bot_core::signature::{verify_signature, SignatureError};
///
/// assert!(verify_signature(b"{}", "", "", "Gitea").is_ok());
/// assert_eq!(
///     verify_signature(b"{}", "secret", "", "Gitea"),
///     Err(SignatureError::MissingSignature("Gitea".to_string()))
/// );
/// ```
pub fn verify_signature(
    payload: &[u8],
    secret: &str,
    signature_hex: &str,
    source: &str,
) -> Result<(), SignatureError> {
    match (secret.is_empty(), signature_hex.is_empty()) {
        (true, true) => {
            debug!(source, "No webhook secret configured, skipping signature check");
            return Ok(());
        }
        (true, false) => return Err(SignatureError::UnexpectedSignature(source.to_string())),
        (false, true) => return Err(SignatureError::MissingSignature(source.to_string())),
        (false, false) => {}
    }

    let expected = hex::decode(signature_hex)
        .map_err(|_| SignatureError::UndecodableSignature(source.to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Mismatch(source.to_string()))?;
    mac.update(payload);

    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch(source.to_string()))
}

/// Computes the hex encoded HMAC-SHA256 digest of `payload`. This is what a
/// webhook sender places in its signature header.
pub fn sign(payload: &[u8], secret: &str) -> String {
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(payload);
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}
