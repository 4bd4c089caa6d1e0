// Exporter module - one middleware instance
//
// Configuration, series and path resolution bound to one collection
// registry. A `Prometheus` is built once at startup and shared between the
// engine, which runs its `Instrument` around every route, and application
// handlers, which update custom series through it.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::HeaderMap;
use prometheus::Registry;

use crate::auth::{self, ScrapeState};
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::metrics::{BuiltinMetrics, CustomMetrics, SeriesOptions};
use crate::middleware::Instrument;
use crate::resolver::PathResolver;

/// Overrides the `handler` label value
pub type HandlerNameFn = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// Replaces route-table resolution; the result is the `path` label
pub type RequestPathFn = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// Values for the custom request-counter labels, keyed by label name
pub type CounterLabelsFn = Arc<dyn Fn(&Request) -> HashMap<String, String> + Send + Sync>;

pub(crate) struct Shared {
    pub(crate) config: Config,
    pub(crate) registry: Registry,
    pub(crate) resolver: PathResolver,
    pub(crate) builtins: BuiltinMetrics,
    pub(crate) custom: CustomMetrics,
    pub(crate) handler_name_fn: Option<HandlerNameFn>,
    pub(crate) request_path_fn: Option<RequestPathFn>,
    pub(crate) counter_labels: Vec<String>,
    pub(crate) counter_labels_fn: Option<CounterLabelsFn>,
}

/// Builder for [`Prometheus`]
///
/// Serializable settings come from [`Config`]; the remaining options carry
/// handles or functions.
#[derive(Default)]
pub struct PrometheusBuilder {
    config: Config,
    registry: Option<Registry>,
    engine: Option<Engine>,
    ignored: Vec<String>,
    handler_name_fn: Option<HandlerNameFn>,
    request_path_fn: Option<RequestPathFn>,
    counter_labels: Vec<String>,
    counter_labels_fn: Option<CounterLabelsFn>,
}

impl PrometheusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Collection registry to register every series with
    ///
    /// Defaults to the process-wide `prometheus::default_registry()`.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Engine to serve the scrape endpoint on and to read routes from
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.config.metrics_path = path.into();
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.config.subsystem = subsystem.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    pub fn buckets(mut self, buckets: Vec<f64>) -> Self {
        self.config.buckets = Some(buckets);
        self
    }

    pub fn native_histogram(mut self, enabled: bool) -> Self {
        self.config.native_histogram = enabled;
        self
    }

    /// Route templates that are never instrumented; may be called repeatedly
    pub fn ignore<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn handler_name_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        self.handler_name_fn = Some(Arc::new(f));
        self
    }

    pub fn request_path_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        self.request_path_fn = Some(Arc::new(f));
        self
    }

    /// Extend the request counter with extra labels
    ///
    /// `f` runs once per instrumented request; labels it leaves out are
    /// recorded as empty strings.
    pub fn custom_counter_labels<I, S, F>(mut self, labels: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Request) -> HashMap<String, String> + Send + Sync + 'static,
    {
        self.counter_labels = labels.into_iter().map(Into::into).collect();
        self.counter_labels_fn = Some(Arc::new(f));
        self
    }

    /// Validate the configuration and register the built-in series
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration or when a built-in series name is
    /// already registered in the target registry.
    pub fn build(self) -> Result<Prometheus> {
        let mut config = self.config;
        config.ignored.extend(self.ignored);
        config.validate()?;

        let registry = self
            .registry
            .unwrap_or_else(|| prometheus::default_registry().clone());

        let options = SeriesOptions {
            namespace: config.namespace.clone(),
            subsystem: config.subsystem.clone(),
            buckets: config.buckets.clone(),
            native_histogram: config.native_histogram,
        };

        let builtins = BuiltinMetrics::register(&registry, &config, &options, &self.counter_labels)?;
        let custom = CustomMetrics::new(registry.clone(), options);
        let resolver = PathResolver::new(config.ignored.iter().cloned());

        tracing::info!(
            namespace = %config.namespace,
            subsystem = %config.subsystem,
            metrics_path = %config.metrics_path,
            ignored = config.ignored.len(),
            "Prometheus middleware initialized"
        );

        let prometheus = Prometheus {
            shared: Arc::new(Shared {
                config,
                registry,
                resolver,
                builtins,
                custom,
                handler_name_fn: self.handler_name_fn,
                request_path_fn: self.request_path_fn,
                counter_labels: self.counter_labels,
                counter_labels_fn: self.counter_labels_fn,
            }),
        };

        if let Some(engine) = &self.engine {
            prometheus.use_engine(engine);
        }
        Ok(prometheus)
    }
}

/// Request instrumentation bound to one collection registry
#[derive(Clone)]
pub struct Prometheus {
    shared: Arc<Shared>,
}

impl Prometheus {
    pub fn builder() -> PrometheusBuilder {
        PrometheusBuilder::new()
    }

    /// Serve the scrape endpoint on `engine` and resolve paths from its routes
    pub fn use_engine(&self, engine: &Engine) {
        let state = ScrapeState::new(self.shared.registry.clone(), self.shared.config.token.clone());
        engine.get(&self.shared.config.metrics_path, move |headers: HeaderMap| {
            let state = state.clone();
            async move { auth::serve_metrics(&state, &headers) }
        });

        self.shared.resolver.bind(Arc::new(engine.clone()));
        tracing::info!(
            metrics_path = %self.shared.config.metrics_path,
            routes = self.shared.resolver.len(),
            "Engine bound"
        );
    }

    /// Interception handle for `Engine::use_instrument`
    pub fn instrument(&self) -> Instrument {
        Instrument::new(Arc::clone(&self.shared))
    }

    /// Stop instrumenting requests whose path is one of `paths`
    pub fn ignore<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared.resolver.ignore(paths);
    }

    /// Remove every series of this instance from its registry
    pub fn unregister(&self) {
        self.shared.builtins.unregister(&self.shared.registry);
        self.shared.custom.unregister_all();
    }

    pub fn registry(&self) -> &Registry {
        &self.shared.registry
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.shared.resolver
    }

    pub fn add_custom_counter(&self, name: &str, help: &str, labels: &[&str]) -> Result<()> {
        self.shared.custom.add_counter(name, help, labels)
    }

    pub fn add_custom_gauge(&self, name: &str, help: &str, labels: &[&str]) -> Result<()> {
        self.shared.custom.add_gauge(name, help, labels)
    }

    pub fn add_custom_histogram(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        buckets: Option<Vec<f64>>,
    ) -> Result<()> {
        self.shared.custom.add_histogram(name, help, labels, buckets)
    }

    pub fn increment_counter_value(&self, name: &str, labels: &[&str]) -> Result<()> {
        self.shared.custom.increment_counter(name, labels)
    }

    pub fn add_counter_value(&self, name: &str, labels: &[&str], value: f64) -> Result<()> {
        self.shared.custom.add_counter_value(name, labels, value)
    }

    pub fn increment_gauge_value(&self, name: &str, labels: &[&str]) -> Result<()> {
        self.shared.custom.increment_gauge(name, labels)
    }

    pub fn decrement_gauge_value(&self, name: &str, labels: &[&str]) -> Result<()> {
        self.shared.custom.decrement_gauge(name, labels)
    }

    pub fn set_gauge_value(&self, name: &str, labels: &[&str], value: f64) -> Result<()> {
        self.shared.custom.set_gauge(name, labels, value)
    }

    pub fn add_gauge_value(&self, name: &str, labels: &[&str], value: f64) -> Result<()> {
        self.shared.custom.add_gauge_value(name, labels, value)
    }

    pub fn sub_gauge_value(&self, name: &str, labels: &[&str], value: f64) -> Result<()> {
        self.shared.custom.sub_gauge_value(name, labels, value)
    }

    pub fn add_custom_histogram_value(&self, name: &str, labels: &[&str], value: f64) -> Result<()> {
        self.shared.custom.observe_histogram(name, labels, value)
    }
}
