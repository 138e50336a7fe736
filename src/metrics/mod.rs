// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

use crate::domain::order::OrderStatus;

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers:
// - Order creation and status changes made through the API
// - Reconciliation runs (outcome, orders delayed, duration)
//
// Scraped from /metrics on the metrics server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Order API Metrics
    pub orders_created: IntCounter,
    pub order_status_changes: IntCounterVec,

    // Reconciliation Metrics
    pub reconciliation_runs: IntCounterVec,
    pub reconciliation_orders_delayed: IntCounter,
    pub reconciliation_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_status_changes = IntCounterVec::new(
            Opts::new("order_status_changes_total", "Order status changes by transition"),
            &["from", "to"],
        )?;
        registry.register(Box::new(order_status_changes.clone()))?;

        let reconciliation_runs = IntCounterVec::new(
            Opts::new("reconciliation_runs_total", "Delivery reconciliation runs by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(reconciliation_runs.clone()))?;

        let reconciliation_orders_delayed = IntCounter::new(
            "reconciliation_orders_delayed_total",
            "Orders moved from processing to delayed by reconciliation",
        )?;
        registry.register(Box::new(reconciliation_orders_delayed.clone()))?;

        let reconciliation_duration = HistogramVec::new(
            HistogramOpts::new("reconciliation_duration_seconds", "Delivery reconciliation run duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(reconciliation_duration.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            order_status_changes,
            reconciliation_runs,
            reconciliation_orders_delayed,
            reconciliation_duration,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self) {
        self.orders_created.inc();
    }

    pub fn record_status_change(&self, from: OrderStatus, to: OrderStatus) {
        self.order_status_changes
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
    }

    /// `delayed` is `None` for failed runs
    pub fn record_reconciliation(&self, delayed: Option<usize>, duration_secs: f64) {
        let outcome = match delayed {
            Some(0) => "no_matches",
            Some(count) => {
                self.reconciliation_orders_delayed.inc_by(count as u64);
                self.order_status_changes
                    .with_label_values(&[OrderStatus::Processing.as_str(), OrderStatus::Delayed.as_str()])
                    .inc_by(count as u64);
                "updated"
            }
            None => "failed",
        };

        self.reconciliation_runs.with_label_values(&[outcome]).inc();
        self.reconciliation_duration
            .with_label_values(&[outcome])
            .observe(duration_secs);
    }
}
