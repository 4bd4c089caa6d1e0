// Built-in request series
//
// Four fixed series updated once per instrumented request:
// - request counter (code, method, handler, host, path + custom labels)
// - request duration histogram (method, path, host)
// - request size histogram
// - response size histogram

use prometheus::{CounterVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry};

use super::SeriesOptions;
use crate::config::Config;
use crate::constants::{
    REQUEST_COUNTER_LABELS, REQUEST_DURATION_LABELS, SIZE_BUCKET_COUNT, SIZE_BUCKET_FACTOR,
    SIZE_BUCKET_START,
};
use crate::error::Result;

/// Measurements taken for one request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestObservation {
    pub status: String,
    pub method: String,
    pub handler: String,
    pub host: String,
    pub path: String,
    /// Values for the custom request-counter labels, in declaration order
    pub extra_labels: Vec<String>,
    pub elapsed_seconds: f64,
    pub request_size: f64,
}

/// The four request series of one middleware instance
#[derive(Clone)]
pub struct BuiltinMetrics {
    requests: CounterVec,
    duration: HistogramVec,
    request_size: Histogram,
    response_size: Histogram,
}

impl BuiltinMetrics {
    /// Create the series and register them with `registry`
    ///
    /// Fails if any name is already taken in that registry.
    pub fn register(
        registry: &Registry,
        config: &Config,
        options: &SeriesOptions,
        extra_labels: &[String],
    ) -> Result<Self> {
        let mut counter_labels: Vec<&str> = REQUEST_COUNTER_LABELS.to_vec();
        counter_labels.extend(extra_labels.iter().map(String::as_str));

        let requests = CounterVec::new(
            Opts::new(
                config.request_counter_metric_name.as_str(),
                "How many HTTP requests processed, partitioned by status code and HTTP method.",
            )
            .namespace(options.namespace.as_str())
            .subsystem(options.subsystem.as_str()),
            &counter_labels,
        )?;

        let duration = HistogramVec::new(
            HistogramOpts::new(
                config.request_duration_metric_name.as_str(),
                "The HTTP request latencies in seconds.",
            )
            .namespace(options.namespace.as_str())
            .subsystem(options.subsystem.as_str())
            .buckets(options.histogram_buckets(None)?),
            &REQUEST_DURATION_LABELS,
        )?;

        let size_buckets = prometheus::exponential_buckets(
            SIZE_BUCKET_START,
            SIZE_BUCKET_FACTOR,
            SIZE_BUCKET_COUNT,
        )?;

        let request_size = Histogram::with_opts(
            HistogramOpts::new(
                config.request_size_metric_name.as_str(),
                "The HTTP request sizes in bytes.",
            )
            .namespace(options.namespace.as_str())
            .subsystem(options.subsystem.as_str())
            .buckets(size_buckets.clone()),
        )?;

        let response_size = Histogram::with_opts(
            HistogramOpts::new(
                config.response_size_metric_name.as_str(),
                "The HTTP response sizes in bytes.",
            )
            .namespace(options.namespace.as_str())
            .subsystem(options.subsystem.as_str())
            .buckets(size_buckets),
        )?;

        let metrics = Self {
            requests,
            duration,
            request_size,
            response_size,
        };
        metrics.register_all(registry)?;
        Ok(metrics)
    }

    fn register_all(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.requests.clone()))?;
        registry.register(Box::new(self.duration.clone()))?;
        registry.register(Box::new(self.request_size.clone()))?;
        registry.register(Box::new(self.response_size.clone()))?;
        Ok(())
    }

    /// Remove the series from `registry`; missing series are ignored
    pub fn unregister(&self, registry: &Registry) {
        let _ = registry.unregister(Box::new(self.requests.clone()));
        let _ = registry.unregister(Box::new(self.duration.clone()));
        let _ = registry.unregister(Box::new(self.request_size.clone()));
        let _ = registry.unregister(Box::new(self.response_size.clone()));
    }

    /// Response size is observed separately, once the body has been written
    pub fn response_size(&self) -> Histogram {
        self.response_size.clone()
    }

    /// Apply one request's measurements to the counter, duration and
    /// request size series
    pub fn observe(&self, obs: &RequestObservation) -> Result<()> {
        let mut labels: Vec<&str> = vec![
            obs.status.as_str(),
            obs.method.as_str(),
            obs.handler.as_str(),
            obs.host.as_str(),
            obs.path.as_str(),
        ];
        labels.extend(obs.extra_labels.iter().map(String::as_str));

        self.requests.get_metric_with_label_values(&labels)?.inc();
        self.duration
            .get_metric_with_label_values(&[
                obs.method.as_str(),
                obs.path.as_str(),
                obs.host.as_str(),
            ])?
            .observe(obs.elapsed_seconds);
        self.request_size.observe(obs.request_size);
        Ok(())
    }
}
