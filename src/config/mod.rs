// Configuration module
//
// Serializable part of the middleware configuration. Options that carry
// functions or shared handles (collection registry, engine, label
// extractors) are supplied through `PrometheusBuilder` instead.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{
    DEFAULT_METRICS_PATH, DEFAULT_NAMESPACE, DEFAULT_REQUEST_COUNTER_METRIC_NAME,
    DEFAULT_REQUEST_DURATION_METRIC_NAME, DEFAULT_REQUEST_SIZE_METRIC_NAME,
    DEFAULT_RESPONSE_SIZE_METRIC_NAME, DEFAULT_SUBSYSTEM,
};
use crate::error::{PromError, Result};

fn default_metrics_path() -> String {
    DEFAULT_METRICS_PATH.to_string()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_subsystem() -> String {
    DEFAULT_SUBSYSTEM.to_string()
}

fn default_request_counter_metric_name() -> String {
    DEFAULT_REQUEST_COUNTER_METRIC_NAME.to_string()
}

fn default_request_duration_metric_name() -> String {
    DEFAULT_REQUEST_DURATION_METRIC_NAME.to_string()
}

fn default_request_size_metric_name() -> String {
    DEFAULT_REQUEST_SIZE_METRIC_NAME.to_string()
}

fn default_response_size_metric_name() -> String {
    DEFAULT_RESPONSE_SIZE_METRIC_NAME.to_string()
}

/// Middleware configuration
///
/// Every field has a documented default, so an empty YAML document is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path of the scrape endpoint (default: `/metrics`)
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// First segment of every series name (default: `axum`)
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Second segment of every series name (default: `engine`)
    #[serde(default = "default_subsystem")]
    pub subsystem: String,

    /// Bearer token guarding the scrape endpoint; empty disables the check
    #[serde(default)]
    pub token: String,

    /// Route templates that are never instrumented
    #[serde(default)]
    pub ignored: Vec<String>,

    #[serde(default = "default_request_counter_metric_name")]
    pub request_counter_metric_name: String,

    #[serde(default = "default_request_duration_metric_name")]
    pub request_duration_metric_name: String,

    #[serde(default = "default_request_size_metric_name")]
    pub request_size_metric_name: String,

    #[serde(default = "default_response_size_metric_name")]
    pub response_size_metric_name: String,

    /// Upper bounds for the duration histogram and custom histograms
    /// (default: `prometheus::DEFAULT_BUCKETS`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buckets: Option<Vec<f64>>,

    /// Use the exponential bucket layout instead of `buckets`
    #[serde(default)]
    pub native_histogram: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics_path: default_metrics_path(),
            namespace: default_namespace(),
            subsystem: default_subsystem(),
            token: String::new(),
            ignored: Vec::new(),
            request_counter_metric_name: default_request_counter_metric_name(),
            request_duration_metric_name: default_request_duration_metric_name(),
            request_size_metric_name: default_request_size_metric_name(),
            response_size_metric_name: default_response_size_metric_name(),
            buckets: None,
            native_histogram: false,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| PromError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| PromError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.metrics_path.starts_with('/') {
            return Err(PromError::Config(format!(
                "metrics_path '{}' must start with /",
                self.metrics_path
            )));
        }

        for path in &self.ignored {
            if !path.starts_with('/') {
                return Err(PromError::Config(format!(
                    "ignored path '{}' must start with /",
                    path
                )));
            }
        }

        let names = [
            ("request_counter_metric_name", &self.request_counter_metric_name),
            ("request_duration_metric_name", &self.request_duration_metric_name),
            ("request_size_metric_name", &self.request_size_metric_name),
            ("response_size_metric_name", &self.response_size_metric_name),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(PromError::Config(format!("{} cannot be empty", field)));
            }
        }

        if let Some(buckets) = &self.buckets {
            validate_buckets(buckets)?;
        }

        Ok(())
    }
}

/// Check that a bucket layout is non-empty, finite and strictly ascending
pub fn validate_buckets(buckets: &[f64]) -> Result<()> {
    if buckets.is_empty() {
        return Err(PromError::Config("buckets cannot be empty".to_string()));
    }
    if buckets.iter().any(|b| !b.is_finite()) {
        return Err(PromError::Config("buckets must be finite".to_string()));
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(PromError::Config(
            "buckets must be in strictly ascending order".to_string(),
        ));
    }
    Ok(())
}
