// Metrics module - series owned by one middleware instance
//
// Built-in request series and the name-keyed registry of custom series.
// Every descriptor is registered with exactly one `prometheus::Registry`.

mod builtin;
mod custom;

use std::fmt;

pub use builtin::{BuiltinMetrics, RequestObservation};
pub use custom::{CustomMetric, CustomMetrics};

use crate::config::validate_buckets;
use crate::constants::{
    NATIVE_HISTOGRAM_BUCKET_COUNT, NATIVE_HISTOGRAM_BUCKET_FACTOR, NATIVE_HISTOGRAM_START,
};
use crate::error::Result;

/// Kind of a custom series; each kind has its own name namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Naming and bucketing shared by every series of one instance
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesOptions {
    pub namespace: String,
    pub subsystem: String,
    pub buckets: Option<Vec<f64>>,
    pub native_histogram: bool,
}

impl SeriesOptions {
    /// Bucket layout for a histogram
    ///
    /// Explicit buckets win, then the exponential layout in native mode,
    /// then the configured buckets, then `prometheus::DEFAULT_BUCKETS`.
    pub fn histogram_buckets(&self, explicit: Option<Vec<f64>>) -> Result<Vec<f64>> {
        if let Some(buckets) = explicit {
            validate_buckets(&buckets)?;
            return Ok(buckets);
        }
        if self.native_histogram {
            return Ok(prometheus::exponential_buckets(
                NATIVE_HISTOGRAM_START,
                NATIVE_HISTOGRAM_BUCKET_FACTOR,
                NATIVE_HISTOGRAM_BUCKET_COUNT,
            )?);
        }
        Ok(self
            .buckets
            .clone()
            .unwrap_or_else(|| prometheus::DEFAULT_BUCKETS.to_vec()))
    }
}

/// The collection registry rejects empty help strings
pub(crate) fn help_or_name<'a>(help: &'a str, name: &'a str) -> &'a str {
    if help.trim().is_empty() {
        name
    } else {
        help
    }
}
