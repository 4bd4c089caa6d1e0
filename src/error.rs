// Error types module

use thiserror::Error;

use crate::metrics::MetricKind;

/// Centralized error type for the middleware
///
/// Lookup failures are returned to application code and never abort the
/// request being handled. Registration and configuration errors surface at
/// startup, where the caller is expected to treat them as fatal.
#[derive(Error, Debug)]
pub enum PromError {
    /// No custom counter registered under the requested name
    #[error("error finding custom counter")]
    CounterNotFound,

    /// No custom gauge registered under the requested name
    #[error("error finding custom gauge")]
    GaugeNotFound,

    /// No custom histogram registered under the requested name
    #[error("error finding custom histogram")]
    HistogramNotFound,

    /// A metric of the same kind already uses this name
    #[error("custom {kind} '{name}' is already registered")]
    AlreadyRegistered { kind: MetricKind, name: String },

    /// The collection registry rejected a descriptor or a label-value set
    #[error("registry error: {0}")]
    Registration(#[from] prometheus::Error),

    /// Counters are monotonic
    #[error("counter cannot be decreased (value: {0})")]
    NegativeCounterIncrement(f64),

    /// Scrape endpoint authorization failure
    #[error("Invalid or missing token")]
    InvalidToken,

    /// Configuration errors (invalid YAML, bad bucket layout, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience result alias used across the crate
pub type Result<T> = std::result::Result<T, PromError>;
