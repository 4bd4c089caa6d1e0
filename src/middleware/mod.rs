// Request interception
//
// Around-handler hook attached to every route of an `Engine`. Each request
// either passes through untouched (scrape endpoint, unresolved or ignored
// path) or is timed and sized and written into the built-in series.

mod body;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, HOST};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use http_body::Body as _;
use prometheus::Histogram;

use self::body::CountingBody;

use crate::engine::HandlerName;
use crate::exporter::Shared;
use crate::metrics::RequestObservation;

/// Cloneable handle passed to `Engine::use_instrument`
#[derive(Clone)]
pub struct Instrument {
    pub(crate) shared: Arc<Shared>,
}

impl Instrument {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }
}

/// Middleware function wrapped around each route by `Engine::router`
pub async fn intercept(
    State(instrument): State<Instrument>,
    req: Request,
    next: Next,
) -> Response {
    let shared = &instrument.shared;

    if req.uri().path() == shared.config.metrics_path {
        return next.run(req).await;
    }

    // Absent on the fallback, and not served on a 405 from a method router
    let handler = req
        .extensions()
        .get::<HandlerName>()
        .filter(|h| h.serves(req.method()))
        .map(|h| h.name.clone());
    let path = match &shared.request_path_fn {
        Some(request_path) => Some(request_path(&req)),
        None => handler
            .as_deref()
            .and_then(|handler| shared.resolver.resolve(handler)),
    };
    let path = match path {
        Some(path) if !shared.resolver.is_ignored(&path) => path,
        _ => return next.run(req).await,
    };

    let handler = match &shared.handler_name_fn {
        Some(handler_name) => handler_name(&req),
        None => handler.unwrap_or_else(|| path.clone()),
    };
    let extra_labels = match &shared.counter_labels_fn {
        Some(extract) => {
            let values = extract(&req);
            shared
                .counter_labels
                .iter()
                .map(|label| values.get(label).cloned().unwrap_or_default())
                .collect()
        }
        None => Vec::new(),
    };
    let method = req.method().as_str().to_string();
    let host = request_host(&req);
    let request_size = approximate_request_size(&req);

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed_seconds = start.elapsed().as_secs_f64();

    let observation = RequestObservation {
        status: response.status().as_u16().to_string(),
        method,
        handler,
        host,
        path,
        extra_labels,
        elapsed_seconds,
        request_size,
    };

    if let Err(e) = shared.builtins.observe(&observation) {
        tracing::debug!(error = %e, path = %observation.path, "Failed to record request metrics");
    }

    count_response_body(response, shared.builtins.response_size())
}

fn request_host(req: &Request) -> String {
    req.headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or_default()
        .to_string()
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Approximate size of a request in bytes
///
/// Sum of the path, method and protocol version, every header name and
/// value, the URI host and the declared content length. This is not the
/// number of bytes read from the wire.
pub fn approximate_request_size<B>(req: &axum::http::Request<B>) -> f64 {
    let mut size = req.uri().path().len();
    size += req.method().as_str().len();
    size += format!("{:?}", req.version()).len();
    for (name, value) in req.headers() {
        size += name.as_str().len() + value.len();
    }
    size += req.uri().host().map_or(0, str::len);

    size as f64 + content_length(req.headers()).unwrap_or(0) as f64
}

/// Observe the number of response body bytes written
///
/// Bodies of known length are observed immediately; streamed bodies are
/// wrapped and observed when they finish or are dropped.
fn count_response_body(response: Response, histogram: Histogram) -> Response {
    if let Some(size) = response.body().size_hint().exact() {
        histogram.observe(size as f64);
        return response;
    }
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(CountingBody::new(body, histogram)))
}
