// Scrape endpoint and its bearer token gate

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use prometheus::{Encoder, Registry, TextEncoder};

use crate::error::{PromError, Result};

/// Everything the scrape handler needs, cloned into the route
#[derive(Clone)]
pub struct ScrapeState {
    registry: Registry,
    token: String,
}

impl ScrapeState {
    pub fn new(registry: Registry, token: impl Into<String>) -> Self {
        Self {
            registry,
            token: token.into(),
        }
    }
}

/// Extract the token of an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Check a request's headers against the configured token
///
/// An empty token disables the check. Otherwise the header must be exactly
/// `Bearer <token>`.
pub fn authorize(headers: &HeaderMap, token: &str) -> Result<()> {
    if token.is_empty() {
        return Ok(());
    }
    match extract_bearer_token(headers) {
        Some(provided) if provided == token => Ok(()),
        _ => Err(PromError::InvalidToken),
    }
}

/// Serve the text exposition of every series in the registry
pub fn serve_metrics(state: &ScrapeState, headers: &HeaderMap) -> Response {
    if let Err(e) = authorize(headers, &state.token) {
        return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
    }
    render(&state.registry)
}

fn render(registry: &Registry) -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    (
        [(CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
