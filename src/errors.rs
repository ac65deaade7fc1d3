use std::fmt;

/// Failures raised by a bounded worker pool or its registry.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Pool '{pool}' rejected task: workers saturated and queue full (capacity {queue_capacity})")]
    Rejected { pool: String, queue_capacity: usize },

    #[error("Pool '{pool}' is shut down")]
    ShutDown { pool: String },

    #[error("Task panicked on pool '{pool}'")]
    TaskPanicked { pool: String },

    #[error("Pool '{pool}' dropped the task before completing it")]
    Disconnected { pool: String },

    #[error("A pool named '{0}' is already registered")]
    DuplicateName(String),

    #[error("Invalid pool settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A data source could not produce its records.
#[derive(Debug, thiserror::Error)]
pub enum SourceFetchError {
    #[error("Fetch was not accepted: {0}")]
    Rejected(#[source] PoolError),

    #[error("Fetch did not complete: {0}")]
    Pool(#[source] PoolError),

    #[error("Upstream failure: {0}")]
    Upstream(String),
}

impl From<PoolError> for SourceFetchError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::Rejected { .. } | PoolError::ShutDown { .. } => SourceFetchError::Rejected(e),
            other => SourceFetchError::Pool(other),
        }
    }
}

/// Which collaborator an aggregation failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Trades,
    Payments,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Trades => "trades",
            SourceKind::Payments => "payments",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-trade metric does not fit in a `Decimal`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculationError {
    #[error("{metric} overflowed for trade {trade_id}")]
    Overflow { trade_id: i64, metric: &'static str },
}

/// The aggregation failed. Carries the first failure observed; there is
/// never a partial result alongside it.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("Failed to fetch {source_kind}: {error}")]
    Source {
        source_kind: SourceKind,
        #[source]
        error: SourceFetchError,
    },

    #[error("Trade calculation failed: {0}")]
    Calculation(#[from] CalculationError),
}

impl AggregationError {
    /// The source that failed, if the failure happened while fetching.
    pub fn source_kind(&self) -> Option<SourceKind> {
        match self {
            AggregationError::Source { source_kind, .. } => Some(*source_kind),
            AggregationError::Calculation(_) => None,
        }
    }

    /// Stage label used on the failure counter.
    pub fn stage(&self) -> &'static str {
        match self {
            AggregationError::Source { source_kind, .. } => source_kind.as_str(),
            AggregationError::Calculation(_) => "calculation",
        }
    }
}

/// Reading one pool's state failed. Scoped to that pool only.
#[derive(Debug, thiserror::Error)]
pub enum PoolReadError {
    #[error("Thread introspection failed for pool '{pool}': {source}")]
    Introspection {
        pool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Pool '{pool}' is unavailable: {reason}")]
    Unavailable { pool: String, reason: String },
}
