mod reconciler;
mod report;
mod scheduler;

use thiserror::Error;

use crate::store::StoreError;

pub use reconciler::DeliveryReconciler;
pub use report::ReconciliationReport;
pub use scheduler::{ReconciliationScheduler, RunReconciliation};

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("Date provided must match the defined format of YYYY-mm-dd, got {0:?}")]
    InvalidDateFormat(String),

    #[error("Reconciliation failed: {0}")]
    Store(#[from] StoreError),
}
