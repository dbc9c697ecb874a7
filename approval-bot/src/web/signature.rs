//! Slack request signature verification.
//!
//! Slack signs every request it sends using HMAC-SHA256 over the string
//! `v0:{timestamp}:{raw body}` keyed with the app's signing secret, and sends
//! the result as `X-Slack-Signature: v0=<hex digest>` alongside
//! `X-Slack-Request-Timestamp`.
//! Reference: https://api.slack.com/authentication/verifying-requests-from-slack
//!
//! [`Authenticator::verify`] is a pure decision over one request: it does no
//! I/O, holds no mutable state and takes the current time as an argument.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::Method;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signature scheme version prefix.
pub const SIGNATURE_VERSION: &str = "v0";

/// Header carrying the request issuance time (seconds since epoch).
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Header carrying the `v0=<hex>` signature.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Outcome of verifying a single inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationResult {
    /// Authentic and fresh, or a safe method that needs no signature.
    Accepted,
    /// Timestamp or signature header absent.
    RejectedMissingHeaders,
    /// Timestamp older than the replay window, or not a timestamp at all.
    RejectedStale,
    /// Signature does not match the one computed from the body.
    RejectedBadSignature,
    /// No signing secret configured; nothing can be verified.
    RejectedMisconfigured,
}

impl VerificationResult {
    /// Whether the request may proceed to a handler.
    pub fn is_accepted(self) -> bool {
        matches!(self, VerificationResult::Accepted)
    }

    /// Stable name of the outcome for structured logs.
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationResult::Accepted => "accepted",
            VerificationResult::RejectedMissingHeaders => "missing_headers",
            VerificationResult::RejectedStale => "stale",
            VerificationResult::RejectedBadSignature => "bad_signature",
            VerificationResult::RejectedMisconfigured => "misconfigured",
        }
    }
}

/// The parts of an inbound request that verification looks at.
///
/// `raw_body` must be the body bytes exactly as received, before any form or
/// JSON decoding.
#[derive(Debug, Clone, Copy)]
pub struct SignedRequest<'a> {
    pub method: &'a Method,
    pub timestamp: Option<&'a str>,
    pub signature: Option<&'a str>,
    pub raw_body: &'a [u8],
}

/// Verifies that requests were signed by Slack with the shared secret.
///
/// Constructed once at startup and shared across requests.
#[derive(Debug)]
pub struct Authenticator {
    signing_secret: Option<SecretString>,
    max_age_seconds: u64,
}

impl Authenticator {
    /// Create an authenticator.
    ///
    /// A missing or blank `signing_secret` is accepted here so the service can
    /// start, but every non-safe request will then be rejected as
    /// [`VerificationResult::RejectedMisconfigured`].
    pub fn new(signing_secret: Option<SecretString>, max_age_seconds: u64) -> Self {
        Self {
            signing_secret,
            max_age_seconds,
        }
    }

    /// Whether a usable signing secret is present.
    pub fn is_configured(&self) -> bool {
        self.secret().is_some()
    }

    /// Replay window in seconds.
    pub fn max_age_seconds(&self) -> u64 {
        self.max_age_seconds
    }

    fn secret(&self) -> Option<&str> {
        self.signing_secret
            .as_ref()
            .map(|s| s.expose_secret())
            .filter(|s| !s.trim().is_empty())
    }

    /// Verify a request against the wall clock.
    pub fn verify_now(&self, request: &SignedRequest<'_>) -> VerificationResult {
        self.verify(request, unix_now())
    }

    /// Verify a request as of `now` (seconds since epoch).
    pub fn verify(&self, request: &SignedRequest<'_>, now: u64) -> VerificationResult {
        // Fail closed before anything else: a missing secret never passes.
        let Some(secret) = self.secret() else {
            return VerificationResult::RejectedMisconfigured;
        };

        if is_safe_method(request.method) {
            return VerificationResult::Accepted;
        }

        let (Some(timestamp), Some(signature)) = (
            request.timestamp.filter(|t| !t.is_empty()),
            request.signature.filter(|s| !s.is_empty()),
        ) else {
            return VerificationResult::RejectedMissingHeaders;
        };

        // Only the upper bound is enforced; timestamps from the future pass.
        let Some(issued_at) = parse_timestamp(timestamp) else {
            return VerificationResult::RejectedStale;
        };
        if now.saturating_sub(issued_at) > self.max_age_seconds {
            return VerificationResult::RejectedStale;
        }

        let Some(digest) = decode_signature(signature) else {
            return VerificationResult::RejectedBadSignature;
        };
        let Some(mac) = signature_mac(secret.as_bytes(), timestamp, request.raw_body) else {
            return VerificationResult::RejectedBadSignature;
        };

        // verify_slice compares in constant time and rejects a digest of the wrong length.
        match mac.verify_slice(&digest) {
            Ok(()) => VerificationResult::Accepted,
            Err(_) => VerificationResult::RejectedBadSignature,
        }
    }
}

/// Methods that carry no payload to forge and skip verification.
pub fn is_safe_method(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

/// Compute the `v0=<hex>` signature for a timestamp and raw body.
pub fn compute_signature(secret: &[u8], timestamp: &str, raw_body: &[u8]) -> Option<String> {
    let mac = signature_mac(secret, timestamp, raw_body)?;
    Some(format!(
        "{}={}",
        SIGNATURE_VERSION,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// MAC over the `v0:{timestamp}:{raw body}` base string.
///
/// The base string is fed as bytes so the body is never re-encoded.
fn signature_mac(secret: &[u8], timestamp: &str, raw_body: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;

    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(raw_body);

    Some(mac)
}

/// Digest bytes of a `v0=<lowercase hex>` signature header.
///
/// Slack sends lowercase hex; any other spelling is not the signature it sent.
fn decode_signature(signature: &str) -> Option<Vec<u8>> {
    let hex_digest = signature
        .strip_prefix(SIGNATURE_VERSION)
        .and_then(|rest| rest.strip_prefix('='))?;
    if !hex_digest
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return None;
    }
    hex::decode(hex_digest).ok()
}

/// Parse a timestamp made only of ASCII digits.
fn parse_timestamp(timestamp: &str) -> Option<u64> {
    if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    timestamp.parse().ok()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
