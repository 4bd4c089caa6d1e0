// Custom series updated from request handlers

use axum::extract::Path;
use axum::http::StatusCode;
use axum::Extension;
use routeprom::{PromError, Prometheus};

use super::test_harness::*;

async fn enqueue(Extension(prom): Extension<Prometheus>) -> StatusCode {
    prom.increment_gauge_value("queue_depth", &["jobs"]).unwrap();
    prom.increment_counter_value("enqueued", &["jobs"]).unwrap();
    StatusCode::ACCEPTED
}

async fn dequeue(Extension(prom): Extension<Prometheus>) -> StatusCode {
    prom.decrement_gauge_value("queue_depth", &["jobs"]).unwrap();
    StatusCode::OK
}

async fn upload(Path(size): Path<f64>, Extension(prom): Extension<Prometheus>) -> StatusCode {
    prom.add_custom_histogram_value("upload_seconds", &[], size).unwrap();
    StatusCode::OK
}

async fn missing(Extension(prom): Extension<Prometheus>) -> StatusCode {
    // Lookup failures are returned to the handler and never abort the request
    match prom.increment_counter_value("not_declared", &[]) {
        Err(PromError::CounterNotFound) => StatusCode::OK,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn app() -> TestApp {
    let app = TestApp::new();
    app.prom
        .add_custom_gauge("queue_depth", "Jobs waiting", &["queue"])
        .unwrap();
    app.prom
        .add_custom_counter("enqueued", "Jobs enqueued", &["queue"])
        .unwrap();
    app.prom
        .add_custom_histogram("upload_seconds", "Upload time", &[], None)
        .unwrap();
    app.engine
        .post("/enqueue", enqueue)
        .post("/dequeue", dequeue)
        .post("/upload/:size", upload)
        .get("/missing", missing);
    app
}

fn post(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_handlers_update_custom_series() {
    let app = app();
    let router = app.router().layer(Extension(app.prom.clone()));

    send(&router, post("/enqueue")).await;
    send(&router, post("/enqueue")).await;
    send(&router, post("/dequeue")).await;
    send(&router, post("/upload/0.45")).await;
    send(&router, post("/upload/9.56")).await;

    let body = body_string(send(&router, get("/metrics")).await).await;
    assert!(body.contains("axum_engine_queue_depth{queue=\"jobs\"} 1"));
    assert!(body.contains("axum_engine_enqueued{queue=\"jobs\"} 2"));
    assert!(body.contains("axum_engine_upload_seconds_count 2"));
    assert!(body.contains("axum_engine_upload_seconds_bucket{le=\"0.5\"} 1"));
    assert!(body.contains("axum_engine_upload_seconds_bucket{le=\"10\"} 2"));

    assert_eq!(app.requests(&[("path", "/upload/:size"), ("method", "POST")]), 2.0);
    assert_eq!(app.requests(&[("path", "/enqueue"), ("code", "202")]), 2.0);
}

#[tokio::test]
async fn test_lookup_failure_does_not_abort_request() {
    let app = app();
    let router = app.router().layer(Extension(app.prom.clone()));

    let response = send(&router, get("/missing")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.requests(&[("path", "/missing"), ("code", "200")]), 1.0);
}
