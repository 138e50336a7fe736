use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::errors::ApiError;
use super::response::ApiResponse;
use super::AppState;
use crate::domain::order::{CreateOrder, Order, OrderItem, OrderStatus, StatusChange, UpdateOrderStatus};
use crate::utils::dates::timestamp;

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub identifier: Option<String>,
    pub order_status: Option<String>,
}

/// POST /api/orders
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<ApiResponse<Order>, ApiError> {
    let command: CreateOrder = decode_payload(&body)?;
    let new_order = command.into_new_order(
        state.identifiers.as_ref(),
        state.estimator.as_ref(),
        Utc::now(),
    )?;

    let order = state.store.create(new_order).await?;

    if let Some(metrics) = &state.metrics {
        metrics.record_order_created();
    }
    tracing::info!(
        identifier = %order.identifier(),
        due = %order.estimated_delivery_date,
        "📦 Order created"
    );

    Ok(ApiResponse::created("Order created successfully", order))
}

/// GET /api/orders[?identifier=..|?order_status=..]
pub async fn fetch_orders(
    state: web::Data<AppState>,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse, ApiError> {
    let OrderQuery { identifier, order_status } = query.into_inner();

    match (identifier, order_status) {
        (None, None) => {
            let orders = state.store.find_all().await?;
            Ok(ApiResponse::success("All Orders listed successfully", orders).into_response())
        }
        (Some(identifier), _) if !identifier.is_empty() => {
            let order = state
                .store
                .find_one_by_identifier(&identifier)
                .await?
                .ok_or(ApiError::UnknownIdentifier)?;
            Ok(ApiResponse::success("Order retrieved successfully", order).into_response())
        }
        (_, Some(status)) => {
            let status: OrderStatus = status.parse()?;
            let orders = state.store.find_by_status(status).await?;
            tracing::debug!(%status, count = orders.len(), "Orders fetched by status");
            Ok(ApiResponse::success("Orders retrieved successfully", orders).into_response())
        }
        (Some(_), None) => Err(ApiError::UnknownIdentifier),
    }
}

/// Body of a successful status update
#[derive(Debug, Serialize)]
pub struct StatusUpdate {
    pub identifier: String,
    pub name: String,
    pub delivery_address: String,
    pub order_items: Vec<OrderItem>,
    pub delivery_option: String,
    pub estimated_delivery_date: NaiveDate,
    pub order_status: StatusPair,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StatusPair {
    pub previous_order_status: OrderStatus,
    pub new_order_status: OrderStatus,
}

impl StatusUpdate {
    fn new(order: Order, change: StatusChange) -> Self {
        Self {
            identifier: order.identifier().to_string(),
            updated_at: order.updated_at(),
            name: order.name,
            delivery_address: order.delivery_address,
            order_items: order.order_items,
            delivery_option: order.delivery_option,
            estimated_delivery_date: order.estimated_delivery_date,
            order_status: StatusPair {
                previous_order_status: change.previous,
                new_order_status: change.current,
            },
        }
    }
}

/// PATCH /api/orders
pub async fn update_order_status(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<ApiResponse<StatusUpdate>, ApiError> {
    let command: UpdateOrderStatus = decode_payload(&body)?;
    let status = command.status()?;

    let mut order = state
        .store
        .find_one_by_identifier(&command.order_identifier)
        .await?
        .ok_or(ApiError::UnknownIdentifier)?;

    let change = order.transition_to(status, Utc::now());
    let order = state.store.update(&order).await?;

    if let Some(metrics) = &state.metrics {
        metrics.record_status_change(change.previous, change.current);
    }
    tracing::info!(
        identifier = %order.identifier(),
        from = %change.previous,
        to = %change.current,
        "Order status updated"
    );

    Ok(ApiResponse::success(
        "Order status updated successfully",
        StatusUpdate::new(order, change),
    ))
}

fn decode_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(
            error = %e,
            payload = %String::from_utf8_lossy(body),
            "Rejected request payload"
        );
        ApiError::InvalidPayload
    })
}
