// Logging module for structured logging using the tracing crate

use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event, for log aggregation systems
    #[default]
    Json,
    /// Human readable, for local development
    Pretty,
}

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - the requested output format
/// - filtering from `RUST_LOG`, falling back to `info`
/// - output to stdout for container/cloud-native deployments
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
///
/// # Examples
///
/// ```
/// use routeprom::logging::{init_subscriber, LogFormat};
///
/// init_subscriber(LogFormat::Pretty).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(format: LogFormat) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
}
