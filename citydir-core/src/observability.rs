/*!
Observability for the directory service.

- Structured logging through `tracing`, JSON or human-readable
- Prometheus metrics (feature `metrics`): operation counters, snapshot latency,
  current record count
*/

#[cfg(feature = "metrics")]
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
#[cfg(feature = "metrics")]
use std::sync::OnceLock;
use tracing::subscriber::set_global_default;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry as TracingRegistry};

use crate::{DirectoryError, Result};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "citydir=info,citydir_core=info,tower_http=info";

/// Filter used when `RUST_LOG` is not set and verbose output is requested
pub const VERBOSE_LOG_FILTER: &str = "citydir=debug,citydir_core=debug,tower_http=debug";

/// Global metrics instance
#[cfg(feature = "metrics")]
static METRICS: OnceLock<DirectoryMetrics> = OnceLock::new();

/// Metrics collected by the directory core
#[cfg(feature = "metrics")]
#[derive(Debug)]
pub struct DirectoryMetrics {
    /// Directory operations, labelled by operation name
    pub requests_total: IntCounterVec,
    /// Directory operations that returned an error, labelled by operation name
    pub errors_total: IntCounterVec,
    /// Snapshot load/save duration, labelled by `load` or `save`
    pub snapshot_seconds: HistogramVec,
    /// Records currently held by the store
    pub records: IntGauge,

    registry: Registry,
}

#[cfg(feature = "metrics")]
impl DirectoryMetrics {
    fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("citydir_requests_total", "Directory operations served"),
            &["operation"],
        )
        .map_err(|e| metric_err("citydir_requests_total", e))?;

        let errors_total = IntCounterVec::new(
            Opts::new("citydir_errors_total", "Directory operations that failed"),
            &["operation"],
        )
        .map_err(|e| metric_err("citydir_errors_total", e))?;

        let snapshot_seconds = HistogramVec::new(
            HistogramOpts::new(
                "citydir_snapshot_seconds",
                "Duration of snapshot load and save in seconds",
            ),
            &["phase"],
        )
        .map_err(|e| metric_err("citydir_snapshot_seconds", e))?;

        let records = IntGauge::new("citydir_records", "Records held by the store")
            .map_err(|e| metric_err("citydir_records", e))?;

        registry
            .register(Box::new(requests_total.clone()))
            .map_err(|e| metric_err("citydir_requests_total", e))?;
        registry
            .register(Box::new(errors_total.clone()))
            .map_err(|e| metric_err("citydir_errors_total", e))?;
        registry
            .register(Box::new(snapshot_seconds.clone()))
            .map_err(|e| metric_err("citydir_snapshot_seconds", e))?;
        registry
            .register(Box::new(records.clone()))
            .map_err(|e| metric_err("citydir_records", e))?;

        Ok(Self {
            requests_total,
            errors_total,
            snapshot_seconds,
            records,
            registry,
        })
    }

    /// Get or initialize global metrics instance
    pub fn global() -> &'static DirectoryMetrics {
        METRICS.get_or_init(|| Self::new().expect("Failed to initialize directory metrics"))
    }

    pub fn record_request(&self, operation: &str) {
        self.requests_total.with_label_values(&[operation]).inc();
    }

    pub fn record_error(&self, operation: &str) {
        self.errors_total.with_label_values(&[operation]).inc();
    }

    pub fn record_snapshot(&self, phase: &str, duration: std::time::Duration) {
        self.snapshot_seconds
            .with_label_values(&[phase])
            .observe(duration.as_secs_f64());
    }

    pub fn set_record_count(&self, count: usize) {
        self.records.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Gather metrics in Prometheus text format
    pub fn gather_metrics(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| DirectoryError::storage(format!("Failed to encode metrics: {e}")))?;

        String::from_utf8(buffer).map_err(|e| {
            DirectoryError::storage(format!("Failed to convert metrics to string: {e}"))
        })
    }
}

#[cfg(feature = "metrics")]
fn metric_err(name: &str, e: prometheus::Error) -> DirectoryError {
    DirectoryError::storage(format!("Failed to set up metric {name}: {e}"))
}

/// Initialize global logging
///
/// Installs a `tracing` subscriber filtered by `RUST_LOG` (falling back to
/// `DEFAULT_LOG_FILTER`, or `VERBOSE_LOG_FILTER` when `verbose` is set) that
/// writes JSON lines when `json` is set and human-readable lines otherwise.
/// With the `metrics` feature the metric registry is created eagerly as well.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_observability(json: bool, verbose: bool) -> Result<()> {
    #[cfg(feature = "metrics")]
    DirectoryMetrics::global();

    let fallback = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let result = if json {
        let subscriber = TracingRegistry::default().with(filter).with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(false)
                .with_current_span(false),
        );
        set_global_default(subscriber)
    } else {
        let subscriber = TracingRegistry::default()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false));
        set_global_default(subscriber)
    };

    result.map_err(|e| {
        DirectoryError::validation(format!("Failed to set global tracing subscriber: {e}"))
    })?;

    tracing::debug!(json, "observability initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        let _ = init_observability(false, false);
        assert!(init_observability(true, true).is_err());
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_metrics_gathering() {
        let metrics = DirectoryMetrics::global();
        metrics.record_request("get");
        metrics.record_error("get");
        metrics.record_snapshot("save", std::time::Duration::from_millis(3));
        metrics.set_record_count(12);

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("citydir_requests_total"));
        assert!(text.contains("citydir_snapshot_seconds"));
        assert!(text.contains("citydir_records"));
    }
}
