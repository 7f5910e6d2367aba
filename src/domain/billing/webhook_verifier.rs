//! Stripe webhook signature verification.
//!
//! Checks the `Stripe-Signature` header (HMAC-SHA256 over `"{t}.{payload}"`)
//! against the raw request body. `StripeWebhookVerifier` parses nothing; the
//! free `verify` chains it with `StripeEvent::decode`.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::billing_event::VerifiedEvent;
use super::errors::{BillingError, VerificationError};
use super::stripe_event::StripeEvent;

/// Default maximum age for webhook events (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signatures (HMAC-SHA256). Stripe sends several during secret rolls.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>][,v0=<legacy>]`
    pub fn parse(header: &str) -> Result<Self, VerificationError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| bad_signature("invalid header format"))?;

            match key {
                "t" => {
                    timestamp = Some(
                        value
                            .parse()
                            .map_err(|_| bad_signature("invalid timestamp"))?,
                    );
                }
                "v1" => {
                    v1_signatures.push(
                        hex::decode(value).map_err(|_| bad_signature("invalid v1 signature hex"))?,
                    );
                }
                // v0 and unknown schemes are ignored
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| bad_signature("missing timestamp"))?;
        if v1_signatures.is_empty() {
            return Err(bad_signature("missing v1 signature"));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

fn bad_signature(reason: &str) -> VerificationError {
    VerificationError::BadSignature(reason.to_string())
}

/// Verifier for Stripe webhook signatures.
#[derive(Clone)]
pub struct StripeWebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl StripeWebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    /// Checks that `payload` was signed by the provider recently.
    ///
    /// # Errors
    ///
    /// - `BadSignature` - malformed header or no matching v1 signature
    /// - `Stale` - timestamp older than the tolerance or too far in the future
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), VerificationError> {
        self.verify_at(payload, signature_header, Utc::now().timestamp())
    }

    /// Same as `verify` with an explicit clock.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_unix: i64,
    ) -> Result<(), VerificationError> {
        let header = SignatureHeader::parse(signature_header)?;

        let expected = self.compute_signature(header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            return Err(bad_signature("no matching v1 signature"));
        }

        self.validate_timestamp(header.timestamp, now_unix)
    }

    fn validate_timestamp(&self, timestamp: i64, now_unix: i64) -> Result<(), VerificationError> {
        let age_secs = now_unix - timestamp;
        if age_secs > self.tolerance_secs || age_secs < -MAX_CLOCK_SKEW_SECS {
            return Err(VerificationError::Stale { age_secs });
        }
        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, VerificationError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .map_err(|e| bad_signature(&e.to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl std::fmt::Debug for StripeWebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeWebhookVerifier")
            .field("secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

/// Verifies `payload` with the default tolerance, then decodes it.
///
/// # Errors
///
/// - `Verification` - bad or stale signature
/// - `MalformedEvent` - authentic body that is not a known event shape
pub fn verify(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
) -> Result<VerifiedEvent, BillingError> {
    StripeWebhookVerifier::new(secret, DEFAULT_TOLERANCE_SECS).verify(payload, signature_header)?;
    StripeEvent::decode(payload)
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Builds a `Stripe-Signature` header value for `payload`.
///
/// Used by tests and local tooling that replays events.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return format!("t={}", timestamp),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
