// Path resolution against a live Engine

use std::sync::Arc;

use routeprom::engine::Engine;
use routeprom::resolver::PathResolver;
use routeprom::RouteTable;

async fn get_user() -> &'static str {
    "user"
}

async fn list_orders() -> &'static str {
    "orders"
}

fn handler_for(engine: &Engine, path: &str) -> String {
    engine
        .routes()
        .into_iter()
        .find(|route| route.path == path)
        .map(|route| route.handler)
        .expect("route not registered")
}

#[test]
fn test_resolves_engine_routes_to_templates() {
    let engine = Engine::new();
    engine.get("/user/:id", get_user);

    let resolver = PathResolver::default();
    resolver.bind(Arc::new(engine.clone()));

    let handler = handler_for(&engine, "/user/:id");
    assert_eq!(resolver.resolve(&handler).as_deref(), Some("/user/:id"));
}

#[test]
fn test_routes_added_after_bind_are_discovered() {
    let engine = Engine::new();
    let resolver = PathResolver::default();
    resolver.bind(Arc::new(engine.clone()));
    assert!(resolver.is_empty());

    engine.get("/orders", list_orders);
    let handler = handler_for(&engine, "/orders");

    assert_eq!(resolver.lookup(&handler), None);
    assert_eq!(resolver.resolve(&handler).as_deref(), Some("/orders"));
}

#[test]
fn test_ignored_engine_route_is_unresolved() {
    let engine = Engine::new();
    engine.get("/orders", list_orders).get("/user/:id", get_user);

    let resolver = PathResolver::new(["/orders"]);
    resolver.bind(Arc::new(engine.clone()));

    assert_eq!(resolver.resolve(&handler_for(&engine, "/orders")), None);
    assert_eq!(resolver.len(), 1);
}

#[test]
fn test_empty_engine_never_resolves() {
    let resolver = PathResolver::default();
    resolver.bind(Arc::new(Engine::new()));
    assert_eq!(resolver.resolve("anything"), None);
    assert_eq!(resolver.refresh(), 0);
}

#[test]
fn test_one_handler_on_two_paths_keeps_both_templates() {
    let engine = Engine::new();
    engine.get("/a", get_user).get("/b", get_user);

    let resolver = PathResolver::default();
    resolver.bind(Arc::new(engine.clone()));

    let a = handler_for(&engine, "/a");
    let b = handler_for(&engine, "/b");
    assert_ne!(a, b);
    assert_eq!(resolver.resolve(&a).as_deref(), Some("/a"));
    assert_eq!(resolver.resolve(&b).as_deref(), Some("/b"));
}
