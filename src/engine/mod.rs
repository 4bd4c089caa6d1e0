// Engine module - route registration facade over `axum::Router`
//
// Axum keeps its route table private and has no notion of a handler
// identity. `Engine` records every registration as a `RouteInfo` and, when a
// router is built, stamps each request with the `HandlerName` of the handler
// that matched before any attached instrumentation runs.

use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;

use axum::handler::Handler;
use axum::http::{Method, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::{self, MethodRouter};
use axum::{Extension, Router};
use parking_lot::RwLock;

use crate::middleware::{intercept, Instrument};

/// A registered route: the handler identity and the route template it serves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: Method,
    /// Route template as registered (e.g. `/user/:id`)
    pub path: String,
    /// Identity of the handler serving this route
    pub handler: String,
}

/// Read-only view of the routes a framework instance has registered
pub trait RouteTable: Send + Sync {
    /// Snapshot of every registered route, in registration order
    fn routes(&self) -> Vec<RouteInfo>;
}

/// Request extension carrying the identity of the matched handler
///
/// A method router also answers methods it has no handler for (405), so the
/// extension records the method the handler was registered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerName {
    pub name: String,
    pub method: Method,
}

impl HandlerName {
    /// Whether the registered handler actually serves `method`
    ///
    /// GET handlers also answer HEAD.
    pub fn serves(&self, method: &Method) -> bool {
        self.method == *method || (self.method == Method::GET && *method == Method::HEAD)
    }
}

struct Registration {
    info: RouteInfo,
    endpoint: MethodRouter,
}

#[derive(Default)]
struct EngineInner {
    registrations: Vec<Registration>,
    // handler type name -> (route template -> identity)
    identities: HashMap<String, HashMap<String, String>>,
    instrument: Option<Instrument>,
}

/// Shared, cloneable route registry that builds `axum::Router`s
///
/// Clones share the same registrations, so routes added through one handle
/// are visible to every other handle, including the one held by the
/// instrumentation's path resolver.
#[derive(Clone, Default)]
pub struct Engine {
    inner: Arc<RwLock<EngineInner>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<H, T>(&self, path: &str, handler: H) -> &Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.add(Method::GET, path, type_name::<H>(), routing::get(handler))
    }

    pub fn post<H, T>(&self, path: &str, handler: H) -> &Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.add(Method::POST, path, type_name::<H>(), routing::post(handler))
    }

    pub fn put<H, T>(&self, path: &str, handler: H) -> &Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.add(Method::PUT, path, type_name::<H>(), routing::put(handler))
    }

    pub fn patch<H, T>(&self, path: &str, handler: H) -> &Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.add(Method::PATCH, path, type_name::<H>(), routing::patch(handler))
    }

    pub fn delete<H, T>(&self, path: &str, handler: H) -> &Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.add(Method::DELETE, path, type_name::<H>(), routing::delete(handler))
    }

    /// Attach request instrumentation to every route and to the fallback
    pub fn use_instrument(&self, instrument: Instrument) -> &Self {
        self.inner.write().instrument = Some(instrument);
        self
    }

    /// Build an `axum::Router` from the current registrations
    ///
    /// Routes registered after this call only appear in routers built later.
    pub fn router(&self) -> Router {
        let inner = self.inner.read();
        let mut router = Router::new();

        for registration in &inner.registrations {
            let mut endpoint = registration.endpoint.clone();
            if let Some(instrument) = &inner.instrument {
                endpoint = endpoint.layer(from_fn_with_state(instrument.clone(), intercept));
            }
            // Outermost, so the identity is visible to the instrumentation
            endpoint = endpoint.layer(Extension(HandlerName {
                name: registration.info.handler.clone(),
                method: registration.info.method.clone(),
            }));
            router = router.route(&registration.info.path, endpoint);
        }

        let mut fallback = routing::any(not_found);
        if let Some(instrument) = &inner.instrument {
            fallback = fallback.layer(from_fn_with_state(instrument.clone(), intercept));
        }
        router.fallback_service(fallback)
    }

    fn add(&self, method: Method, path: &str, type_name: &str, endpoint: MethodRouter) -> &Self {
        let mut inner = self.inner.write();
        let handler = inner.assign_identity(type_name, path);

        tracing::debug!(%method, path, handler = %handler, "Route registered");

        inner.registrations.push(Registration {
            info: RouteInfo {
                method,
                path: path.to_string(),
                handler,
            },
            endpoint,
        });
        drop(inner);
        self
    }
}

impl EngineInner {
    /// Derive a handler identity that maps to exactly one route template.
    ///
    /// Closures declared in one function share a type name; the second and
    /// later ones registered on a different path get a `#n` suffix.
    fn assign_identity(&mut self, type_name: &str, path: &str) -> String {
        let paths = self.identities.entry(type_name.to_string()).or_default();
        if let Some(identity) = paths.get(path) {
            return identity.clone();
        }

        let identity = match paths.len() {
            0 => type_name.to_string(),
            n => format!("{}#{}", type_name, n + 1),
        };
        paths.insert(path.to_string(), identity.clone());
        identity
    }
}

impl RouteTable for Engine {
    fn routes(&self) -> Vec<RouteInfo> {
        self.inner
            .read()
            .registrations
            .iter()
            .map(|r| r.info.clone())
            .collect()
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
