//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `restraint_ledger_invocations_total{operation,outcome}` - Invocations by result
//! - `restraint_ledger_invocation_duration_seconds{operation}` - Invocation latency
//! - `restraint_ledger_keys_written_total` - Keys committed to the store

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Invocations by operation and outcome (`ok` or an error kind)
    pub invocations_total: IntCounterVec,

    /// Invocation duration histogram
    pub invocation_duration: HistogramVec,

    /// Keys committed
    pub keys_written: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let invocations_total = IntCounterVec::new(
            Opts::new(
                "restraint_ledger_invocations_total",
                "Total number of ledger invocations",
            ),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(invocations_total.clone()))?;

        let invocation_duration = HistogramVec::new(
            HistogramOpts::new(
                "restraint_ledger_invocation_duration_seconds",
                "Histogram of invocation latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]),
            &["operation"],
        )?;
        registry.register(Box::new(invocation_duration.clone()))?;

        let keys_written = IntCounter::new(
            "restraint_ledger_keys_written_total",
            "Total number of keys committed to the store",
        )?;
        registry.register(Box::new(keys_written.clone()))?;

        Ok(Self {
            invocations_total,
            invocation_duration,
            keys_written,
            registry,
        })
    }

    /// Record a finished invocation
    pub fn record_invocation(&self, operation: &str, outcome: &str, duration_seconds: f64) {
        self.invocations_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.invocation_duration
            .with_label_values(&[operation])
            .observe(duration_seconds);
    }

    /// Record a commit
    pub fn record_commit(&self, keys: usize) {
        self.keys_written.inc_by(keys as u64);
    }

    /// Invocations recorded for `operation` with `outcome`
    pub fn invocation_count(&self, operation: &str, outcome: &str) -> u64 {
        self.invocations_total
            .with_label_values(&[operation, outcome])
            .get()
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode every metric in the Prometheus text exposition format
    pub fn encode(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("keys_written", &self.keys_written.get())
            .finish_non_exhaustive()
    }
}
