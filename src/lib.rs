pub mod calculator;
pub mod config;
pub mod errors;
pub mod execution;
pub mod metrics;
pub mod models;
pub mod services;
pub mod sources;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::PoolError;
use crate::execution::{enumerator_for, WorkerPool, WorkerPoolRegistry};
use crate::services::{AggregationEngine, PoolMonitor};
use crate::sources::{HardcodedPaymentSource, HardcodedTradeSource};

/// Everything the composition root wires together.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub registry: WorkerPoolRegistry,
    pub trade_pool: Arc<WorkerPool>,
    pub payment_pool: Arc<WorkerPool>,
    pub engine: Arc<AggregationEngine>,
    pub monitor: PoolMonitor,
}

impl AppState {
    /// Create both pools in `registry`, then the sources, engine and monitor on top of them.
    pub fn build(config: AppConfig, registry: WorkerPoolRegistry) -> Result<Self, PoolError> {
        let trade_pool = WorkerPool::new(config.trade_pool.clone(), &registry)?;
        let payment_pool = WorkerPool::new(config.payment_pool.clone(), &registry)?;

        let trades = Arc::new(HardcodedTradeSource::new(
            trade_pool.clone(),
            config.trade_source_latency,
            config.hardcoded_trade_count,
        ));
        let payments = Arc::new(HardcodedPaymentSource::new(
            payment_pool.clone(),
            config.payment_source_latency,
        ));
        let engine = Arc::new(AggregationEngine::new(trades, payments));

        let monitor = PoolMonitor::new(registry.clone(), enumerator_for(config.thread_introspection));

        Ok(Self {
            config,
            registry,
            trade_pool,
            payment_pool,
            engine,
            monitor,
        })
    }

    /// Stop both pools from accepting work; queued fetches still complete.
    pub fn shutdown(&self) {
        self.trade_pool.shutdown();
        self.payment_pool.shutdown();
    }
}
