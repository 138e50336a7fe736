use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Outcome of one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub run_id: Uuid,
    pub cutoff: NaiveDate,
    pub updated_count: usize,
    pub message: String,
}

impl ReconciliationReport {
    pub fn new(run_id: Uuid, cutoff: NaiveDate, updated_count: usize) -> Self {
        let message = if updated_count > 0 {
            format!(
                "{updated_count} order deliveries have been updated successfully with a status of 'delayed'."
            )
        } else {
            "No matching records. No orders were updated.".to_string()
        };

        Self {
            run_id,
            cutoff,
            updated_count,
            message,
        }
    }
}

impl fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
