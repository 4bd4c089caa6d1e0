use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::Extension;
use clap::Parser;
use routeprom::config::Config;
use routeprom::logging::{init_subscriber, LogFormat};
use routeprom::{Engine, Prometheus};

/// Demo server instrumented with route-template Prometheus metrics
#[derive(Parser, Debug)]
#[command(name = "routeprom")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Human readable logs instead of JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let format = if args.pretty {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    };
    init_subscriber(format).map_err(|e| anyhow::anyhow!(e))?;

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    tracing::info!(
        config_file = ?args.config,
        metrics_path = %config.metrics_path,
        namespace = %config.namespace,
        token_enabled = !config.token.is_empty(),
        "Configuration loaded successfully"
    );

    let engine = Engine::new();
    let prom = Prometheus::builder()
        .config(config)
        .engine(engine.clone())
        .build()
        .context("Failed to initialize metrics")?;
    prom.add_custom_counter("user_lookups", "Lookups per user route outcome.", &["outcome"])?;

    engine.use_instrument(prom.instrument());
    engine
        .get("/", index)
        .get("/user/:id", get_user)
        .get("/health", health);

    let app = engine.router().layer(Extension(prom));

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;

    tracing::info!(address = %args.listen, "Starting demo server");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> &'static str {
    "routeprom demo"
}

async fn get_user(Path(id): Path<String>, Extension(prom): Extension<Prometheus>) -> String {
    let outcome = if id.chars().all(|c| c.is_ascii_digit()) {
        "ok"
    } else {
        "invalid"
    };
    if let Err(e) = prom.increment_counter_value("user_lookups", &[outcome]) {
        tracing::warn!(error = %e, "Failed to update user_lookups");
    }
    format!("user {}", id)
}

async fn health() -> StatusCode {
    StatusCode::OK
}
