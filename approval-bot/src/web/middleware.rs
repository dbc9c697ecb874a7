//! Request verification middleware.
//!
//! Buffers the raw body, verifies the Slack signature over exactly those
//! bytes, and hands the same bytes on to the handler. Sender-side failures
//! all get the same response; only the logs say which check failed.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::web::handlers::AppState;
use crate::web::signature::{SignedRequest, VerificationResult, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Largest request body accepted for verification.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Body of a rejected request.
#[derive(Serialize)]
pub struct RejectionResponse {
    pub status: &'static str,
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(RejectionResponse {
            status: "unauthorized",
        }),
    )
        .into_response()
}

fn misconfigured() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(RejectionResponse {
            status: "misconfigured",
        }),
    )
        .into_response()
}

/// Header value as a string; values that are not visible ASCII count as absent.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Reject any request that is not a fresh, authentic Slack request.
pub async fn verify_slack_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let raw_body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                method = %parts.method,
                path = %path,
                error = %e,
                "signature_verification_body_unreadable"
            );
            return unauthorized();
        }
    };

    let result = state.authenticator.verify_now(&SignedRequest {
        method: &parts.method,
        timestamp: header_str(&parts.headers, TIMESTAMP_HEADER),
        signature: header_str(&parts.headers, SIGNATURE_HEADER),
        raw_body: &raw_body,
    });

    match result {
        VerificationResult::Accepted => {}
        VerificationResult::RejectedMisconfigured => {
            error!(
                method = %parts.method,
                path = %path,
                reason = result.as_str(),
                "signature_verification_misconfigured"
            );
            return misconfigured();
        }
        VerificationResult::RejectedMissingHeaders
        | VerificationResult::RejectedStale
        | VerificationResult::RejectedBadSignature => {
            warn!(
                method = %parts.method,
                path = %path,
                reason = result.as_str(),
                max_age_seconds = state.authenticator.max_age_seconds(),
                body_length = raw_body.len(),
                "signature_verification_failed"
            );
            return unauthorized();
        }
    }

    next.run(Request::from_parts(parts, Body::from(raw_body)))
        .await
}
