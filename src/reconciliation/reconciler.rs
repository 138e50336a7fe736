use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::report::ReconciliationReport;
use super::ReconciliationError;
use crate::domain::order::OrderStatus;
use crate::metrics::Metrics;
use crate::store::OrderStore;
use crate::utils::parse_calendar_date;

// ============================================================================
// Delivery Reconciler
// ============================================================================
//
// Finds orders still `processing` whose estimated delivery date is strictly
// before the cutoff and moves them all to `delayed` in one batch.
//
// Flow: validate cutoff → query store → transition each match → save the
//       ones still `processing` → report
//
// A second run with the same cutoff finds nothing, since every earlier
// match has left `processing`.
//
// ============================================================================

pub struct DeliveryReconciler {
    store: Arc<dyn OrderStore>,
    metrics: Option<Arc<Metrics>>,
}

impl DeliveryReconciler {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store, metrics: None }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Reconcile against a `YYYY-MM-DD` cutoff. The date is validated before
    /// the store is queried.
    pub async fn reconcile_delayed_deliveries(
        &self,
        cutoff: &str,
    ) -> Result<ReconciliationReport, ReconciliationError> {
        let cutoff = parse_calendar_date(cutoff)
            .map_err(|_| ReconciliationError::InvalidDateFormat(cutoff.to_string()))?;

        self.reconcile_before(cutoff).await
    }

    /// Reconcile against an already-parsed cutoff
    pub async fn reconcile_before(
        &self,
        cutoff: NaiveDate,
    ) -> Result<ReconciliationReport, ReconciliationError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("reconciliation", run_id = %run_id, cutoff = %cutoff);

        let started = Instant::now();
        let result = self.run(run_id, cutoff).instrument(span).await;

        if let Some(metrics) = &self.metrics {
            let delayed = result.as_ref().ok().map(|report| report.updated_count);
            metrics.record_reconciliation(delayed, started.elapsed().as_secs_f64());
        }

        result
    }

    async fn run(
        &self,
        run_id: Uuid,
        cutoff: NaiveDate,
    ) -> Result<ReconciliationReport, ReconciliationError> {
        let mut overdue = self
            .store
            .find_by_status_and_delivery_date_before(OrderStatus::Processing, cutoff)
            .await?;

        tracing::debug!(matches = overdue.len(), "Found overdue processing orders");

        if overdue.is_empty() {
            let report = ReconciliationReport::new(run_id, cutoff, 0);
            tracing::info!("{}", report.message);
            return Ok(report);
        }

        let now = Utc::now();
        for order in &mut overdue {
            let change = order.transition_to(OrderStatus::Delayed, now);
            tracing::debug!(
                identifier = %order.identifier(),
                from = %change.previous,
                due = %order.estimated_delivery_date,
                "Marking order delayed"
            );
        }

        // Only rows still `processing` are written, so a status change made
        // since the query wins over this run
        let written = self
            .store
            .save_batch_where_status(&overdue, OrderStatus::Processing)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, attempted = overdue.len(), "Failed to persist delayed orders");
                e
            })?;

        let skipped = overdue.len() - written.len();
        if skipped > 0 {
            tracing::warn!(skipped = skipped, "Orders changed status during the run, left as they are");
        }

        let report = ReconciliationReport::new(run_id, cutoff, written.len());
        tracing::info!(updated = written.len(), "✅ {}", report.message);

        Ok(report)
    }
}
