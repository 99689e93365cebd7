//! Per-client rate limiting keyed by client IP.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use manta_core::error::CoreError;
use manta_core::rate_limit::RateDecision;

use crate::error::AppError;
use crate::state::AppState;

pub const HEADER_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const HEADER_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const HEADER_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Count the request against the caller's quota; reject with 429 once exhausted.
///
/// The client is the peer address when the server runs with connect info,
/// otherwise the first `X-Forwarded-For` hop.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let client = client_id(&req);
    let decision = state.rate_limiter.check(&client);

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        tracing::debug!(client = %client, "Rate limit exceeded");
        AppError::Core(CoreError::RateLimited {
            retry_after_secs: reset_secs(&decision),
        })
        .into_response()
    };

    apply_headers(response.headers_mut(), &decision);
    response
}

fn client_id(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Whole seconds until [`RateDecision::reset_in`] elapses, rounded up.
fn reset_secs(decision: &RateDecision) -> u64 {
    let reset = decision.reset_in;
    reset.as_secs() + u64::from(reset.subsec_nanos() > 0)
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert(HEADER_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(HEADER_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(HEADER_RESET, HeaderValue::from(reset_secs(decision)));
}
