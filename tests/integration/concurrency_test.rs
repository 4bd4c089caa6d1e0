// Concurrent request handling
//
// Many requests in flight at once must neither lose nor double count
// increments, and must not deadlock path-map refreshes against lookups.

use std::sync::Arc;

use axum::http::StatusCode;

use super::test_harness::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_counted_exactly() {
    let app = Arc::new(TestApp::new());
    app.engine.get("/user/:id", get_user);
    let router = app.router();

    let tasks: Vec<_> = (0..200)
        .map(|i| {
            let router = router.clone();
            tokio::spawn(async move {
                let response = send(&router, get(&format!("/user/{}", i))).await;
                assert_eq!(response.status(), StatusCode::OK);
            })
        })
        .collect();

    for task in tasks {
        task.await.expect("Request task panicked");
    }

    assert_eq!(app.requests(&[("path", "/user/:id")]), 200.0);
    assert_eq!(app.sample_count(REQUEST_SIZE), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_requests_to_late_routes() {
    let app = Arc::new(TestApp::new());
    for i in 0..20 {
        app.engine.get(&format!("/r{}/:id", i), hello);
    }
    // Every route is unknown to the path map until the first miss refreshes
    let router = app.router();

    let tasks: Vec<_> = (0..20)
        .flat_map(|route| (0..5).map(move |n| (route, n)))
        .map(|(route, n)| {
            let router = router.clone();
            tokio::spawn(async move {
                send(&router, get(&format!("/r{}/{}", route, n))).await;
            })
        })
        .collect();

    for task in tasks {
        task.await.expect("Request task panicked");
    }

    for route in 0..20 {
        let template = format!("/r{}/:id", route);
        assert_eq!(app.requests(&[("path", template.as_str())]), 5.0);
    }
}
