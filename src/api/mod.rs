mod errors;
mod handlers;
mod response;

use actix_web::web;
use std::sync::Arc;

use crate::domain::order::{DeliveryEstimator, IdentifierGenerator};
use crate::metrics::Metrics;
use crate::store::OrderStore;

// ============================================================================
// Order HTTP API
// ============================================================================
//
// POST  /api/orders   create an order (starts out `processing`)
// GET   /api/orders   list all, or filter by ?identifier= / ?order_status=
// PATCH /api/orders   change one order's status
//
// ============================================================================

/// Shared handler state
pub struct AppState {
    store: Arc<dyn OrderStore>,
    identifiers: Arc<dyn IdentifierGenerator>,
    estimator: Arc<dyn DeliveryEstimator>,
    metrics: Option<Arc<Metrics>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn OrderStore>,
        identifiers: Arc<dyn IdentifierGenerator>,
        estimator: Arc<dyn DeliveryEstimator>,
    ) -> Self {
        Self {
            store,
            identifiers,
            estimator,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/orders")
            .route(web::post().to(handlers::create_order))
            .route(web::get().to(handlers::fetch_orders))
            .route(web::patch().to(handlers::update_order_status)),
    );
}
