// Routeprom: Prometheus request instrumentation for axum
//
// Requests are labelled with the route template that served them
// (`/user/:id`), never with the concrete request path.

pub mod auth;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod exporter;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod resolver;

pub use engine::{Engine, HandlerName, RouteInfo, RouteTable};
pub use error::{PromError, Result};
pub use exporter::{Prometheus, PrometheusBuilder};
pub use middleware::Instrument;
