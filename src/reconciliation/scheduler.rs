use actix::prelude::*;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::{DeliveryReconciler, ReconciliationError, ReconciliationReport};

// ============================================================================
// Reconciliation Scheduler Actor
// ============================================================================
//
// Runs the delivery reconciliation on demand (RunReconciliation) and,
// when an interval is configured, on a timer using today's UTC date as
// the cutoff.
//
// Runs are atomic: the actor does not pick up the next message until the
// current run has finished, so two runs never overlap.
//
// ============================================================================

pub struct ReconciliationScheduler {
    reconciler: Arc<DeliveryReconciler>,
    interval: Option<Duration>,
}

impl ReconciliationScheduler {
    pub fn new(reconciler: Arc<DeliveryReconciler>, interval: Option<Duration>) -> Self {
        Self { reconciler, interval }
    }
}

impl Actor for ReconciliationScheduler {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        match self.interval {
            Some(interval) => {
                tracing::info!(
                    interval_secs = interval.as_secs(),
                    "⏰ Reconciliation scheduler started"
                );
                ctx.run_interval(interval, |_act, ctx| {
                    ctx.notify(RunReconciliation::today());
                });
            }
            None => tracing::info!("Reconciliation scheduler started (on demand only)"),
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Reconciliation scheduler stopped");
    }
}

/// Reconcile every `processing` order due strictly before `cutoff`
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<ReconciliationReport, ReconciliationError>")]
pub struct RunReconciliation {
    pub cutoff: NaiveDate,
}

impl RunReconciliation {
    pub fn today() -> Self {
        Self {
            cutoff: Utc::now().date_naive(),
        }
    }
}

impl Handler<RunReconciliation> for ReconciliationScheduler {
    type Result = AtomicResponse<Self, Result<ReconciliationReport, ReconciliationError>>;

    fn handle(&mut self, msg: RunReconciliation, _ctx: &mut Self::Context) -> Self::Result {
        let reconciler = self.reconciler.clone();

        AtomicResponse::new(Box::pin(
            async move { reconciler.reconcile_before(msg.cutoff).await }
                .into_actor(self)
                .map(|result, _act, _ctx| {
                    if let Err(e) = &result {
                        tracing::error!(error = %e, "❌ Scheduled reconciliation failed");
                    }
                    result
                }),
        ))
    }
}
