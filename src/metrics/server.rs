use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;

use crate::store::OrderStore;

/// Serve `/metrics` and `/health` on `port` until the server is stopped
pub async fn start_metrics_server(
    registry: Registry,
    store: Arc<dyn OrderStore>,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!("📊 Starting metrics server on http://0.0.0.0:{}/metrics", port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::from(store.clone()))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler))
    })
    .workers(1)
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

async fn metrics_handler(registry: web::Data<Registry>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(store: web::Data<dyn OrderStore>) -> impl Responder {
    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "service": "order-tracking"
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "order-tracking",
                "reason": e.to_string()
            }))
        }
    }
}
