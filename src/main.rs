use std::time::Duration;

use trade_dashboard::config::AppConfig;
use trade_dashboard::execution::WorkerPoolRegistry;
use trade_dashboard::metrics::init_metrics;
use trade_dashboard::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let metrics_handle = init_metrics(config.metrics_addr)?;

    let state = AppState::build(config, WorkerPoolRegistry::global().clone())?;
    tracing::info!(pools = state.registry.len(), "Worker pools registered");

    // Sample the pools halfway through the slower fetch so the snapshot
    // shows workers in flight.
    let probe_delay = state
        .config
        .trade_source_latency
        .max(state.config.payment_source_latency)
        / 2;
    let monitor = state.monitor.clone();
    let probe = tokio::spawn(async move {
        tokio::time::sleep(probe_delay).await;
        monitor.log_snapshot()
    });

    let result = state.engine.compute_trade_calculations().await;
    let in_flight = probe.await?;

    let calculations = match result {
        Ok(c) => c,
        Err(e) => {
            state.shutdown();
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&calculations)?);
    println!("{}", serde_json::to_string_pretty(&in_flight)?);

    // Give the pool counters a moment to settle before the final report.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let settled = state.monitor.log_snapshot();
    println!("{}", serde_json::to_string_pretty(&settled)?);

    tracing::debug!(metrics = %metrics_handle.render(), "Final metrics");
    state.shutdown();

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
