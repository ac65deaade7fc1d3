use std::net::SocketAddr;

use metrics::{counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and register all application metrics.
///
/// With `listen` set, a scrape endpoint is served on that address from the
/// current Tokio runtime. The returned handle's `render()` produces the
/// text/plain Prometheus payload either way.
pub fn init_metrics(listen: Option<SocketAddr>) -> anyhow::Result<PrometheusHandle> {
    let handle = match listen {
        Some(addr) => {
            let (recorder, exporter) = PrometheusBuilder::new().with_http_listener(addr).build()?;
            let handle = recorder.handle();
            metrics::set_global_recorder(recorder)
                .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;
            tokio::spawn(async move {
                if let Err(e) = exporter.await {
                    tracing::error!(error = ?e, "Prometheus exporter stopped");
                }
            });
            tracing::info!(%addr, "Prometheus scrape endpoint listening");
            handle
        }
        None => PrometheusBuilder::new().install_recorder()?,
    };

    register_metrics();
    Ok(handle)
}

/// Describe every application metric and zero the counters so they appear
/// before the first increment. Runs against whichever recorder is current.
fn register_metrics() {
    counter!("trade_calculations_total").absolute(0);
    for stage in ["trades", "payments", "calculation"] {
        counter!("aggregation_failures_total", "source" => stage).absolute(0);
    }

    // A histogram only shows up once it has a real sample.
    describe_histogram!(
        "aggregation_latency_seconds",
        Unit::Seconds,
        "Wall time of one trade calculation run"
    );
}
