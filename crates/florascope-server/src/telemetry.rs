//! Logging and metrics setup

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("florascope=debug,florascope_server=debug,florascope_model=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("florascope=info,florascope_server=info,florascope_model=info,tower_http=warn")
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "florascope_requests_total",
        "Total number of /analyze requests by outcome"
    );
    metrics::describe_histogram!(
        "florascope_inference_latency_us",
        metrics::Unit::Microseconds,
        "Model inference latency in microseconds"
    );

    tracing::info!("Metrics exporter initialized");
    Ok(handle)
}
