// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Using constants instead of magic numbers keeps the metric names and
// endpoint defaults in one place.

// =============================================================================
// Endpoint defaults
// =============================================================================

/// Default path of the scrape endpoint
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Default metric namespace (first segment of every series name)
pub const DEFAULT_NAMESPACE: &str = "axum";

/// Default metric subsystem (second segment of every series name)
pub const DEFAULT_SUBSYSTEM: &str = "engine";

// =============================================================================
// Built-in series names
// =============================================================================

/// Default name of the request counter
pub const DEFAULT_REQUEST_COUNTER_METRIC_NAME: &str = "requests_total";

/// Default name of the request duration histogram
pub const DEFAULT_REQUEST_DURATION_METRIC_NAME: &str = "request_duration";

/// Default name of the request size series
pub const DEFAULT_REQUEST_SIZE_METRIC_NAME: &str = "request_size_bytes";

/// Default name of the response size series
pub const DEFAULT_RESPONSE_SIZE_METRIC_NAME: &str = "response_size_bytes";

// =============================================================================
// Label names
// =============================================================================

/// Labels of the request counter, in declaration order
pub const REQUEST_COUNTER_LABELS: [&str; 5] = ["code", "method", "handler", "host", "path"];

/// Labels of the request duration histogram, in declaration order
pub const REQUEST_DURATION_LABELS: [&str; 3] = ["method", "path", "host"];

// =============================================================================
// Histogram layouts
// =============================================================================

/// First upper bound of the byte-size histograms (100 B)
pub const SIZE_BUCKET_START: f64 = 100.0;

/// Growth factor of the byte-size histograms
pub const SIZE_BUCKET_FACTOR: f64 = 10.0;

/// Number of byte-size buckets (100 B .. 1 GB)
pub const SIZE_BUCKET_COUNT: usize = 8;

/// First upper bound of the exponential "native" layout (1 ms)
pub const NATIVE_HISTOGRAM_START: f64 = 0.001;

/// Growth factor between adjacent exponential buckets
pub const NATIVE_HISTOGRAM_BUCKET_FACTOR: f64 = 1.1;

/// Number of buckets in the exponential layout (1 ms .. ~12.5 s)
pub const NATIVE_HISTOGRAM_BUCKET_COUNT: usize = 100;
