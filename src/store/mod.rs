// ============================================================================
// Order Store - Persistence Boundary
// ============================================================================
//
// The store exclusively owns persisted orders. Callers receive owned copies
// and hand mutations back through `update` or `save_batch`.
//
// Implementations:
// - PostgresOrderStore  (sqlx, production)
// - InMemoryOrderStore  (tests and `STORAGE=memory`)
//
// ============================================================================

mod in_memory;
mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::order::{NewOrder, Order, OrderError, OrderStatus};

pub use in_memory::InMemoryOrderStore;
pub use postgres::{connect_with_retry, PostgresOrderStore, MIGRATOR};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Order identifier already exists: {0}")]
    DuplicateIdentifier(String),

    #[error("Stored order {id} is invalid: {source}")]
    CorruptRecord {
        id: i64,
        #[source]
        source: OrderError,
    },
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order and return it with its surrogate key assigned
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Write back every mutable field of an existing order, matched by identifier
    async fn update(&self, order: &Order) -> Result<Order, StoreError>;

    async fn find_one_by_identifier(&self, identifier: &str) -> Result<Option<Order>, StoreError>;

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError>;

    async fn find_all(&self) -> Result<Vec<Order>, StoreError>;

    /// Orders in exactly `status` whose estimated delivery date is strictly
    /// earlier than `cutoff`. An empty result is not an error.
    async fn find_by_status_and_delivery_date_before(
        &self,
        status: OrderStatus,
        cutoff: NaiveDate,
    ) -> Result<Vec<Order>, StoreError>;

    /// Upsert the current field values of `orders` by identifier.
    /// All or nothing: on error no order in the batch is visibly changed.
    async fn save_batch(&self, orders: &[Order]) -> Result<usize, StoreError>;

    /// Write back the current field values of `orders`, but only for stored
    /// rows still in `expected`. Rows that moved on in the meantime, or no
    /// longer exist, are skipped. Returns the orders actually written.
    /// All or nothing, like `save_batch`.
    async fn save_batch_where_status(
        &self,
        orders: &[Order],
        expected: OrderStatus,
    ) -> Result<Vec<Order>, StoreError>;

    /// Cheap liveness check
    async fn ping(&self) -> Result<(), StoreError>;
}
