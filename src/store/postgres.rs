use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;

use super::{OrderStore, StoreError};
use crate::domain::order::{NewOrder, Order, OrderItem, OrderStatus};
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// PostgreSQL Order Store
// ============================================================================
//
// Table schema lives in `migrations/`. `order_status` is stored as text with a
// CHECK constraint and parsed back into `OrderStatus` on every read, so a
// row edited out-of-band with a bogus status surfaces as `CorruptRecord`
// instead of leaking into the domain.
//
// ============================================================================

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const ORDER_COLUMNS: &str = "id, identifier, name, delivery_address, order_items, delivery_option, \
     estimated_delivery_date, order_status, created_at, updated_at";

const QUALIFIED_ORDER_COLUMNS: &str = "o.id, o.identifier, o.name, o.delivery_address, o.order_items, \
     o.delivery_option, o.estimated_delivery_date, o.order_status, o.created_at, o.updated_at";

/// Open a pool, retrying while the database is unreachable
pub async fn connect_with_retry(
    database_url: &str,
    max_connections: u32,
    retry: RetryConfig,
) -> Result<PgPool, sqlx::Error> {
    retry_on_transient(retry, |attempt| {
        tracing::info!(attempt = attempt, "Connecting to PostgreSQL");
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
    })
    .await
    .into_result()
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    identifier: String,
    name: String,
    delivery_address: String,
    order_items: Json<Vec<OrderItem>>,
    delivery_option: String,
    estimated_delivery_date: NaiveDate,
    order_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .order_status
            .parse()
            .map_err(|source| StoreError::CorruptRecord { id: row.id, source })?;

        Ok(Order::restore(
            row.id,
            row.identifier,
            row.name,
            row.delivery_address,
            row.order_items.0,
            row.delivery_option,
            row.estimated_delivery_date,
            status,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// Column-wise view of a batch, bound as arrays for `UNNEST`
struct BatchColumns<'a> {
    identifiers: Vec<&'a str>,
    names: Vec<&'a str>,
    addresses: Vec<&'a str>,
    items: Vec<Json<&'a [OrderItem]>>,
    options: Vec<&'a str>,
    due_dates: Vec<NaiveDate>,
    statuses: Vec<&'static str>,
    created: Vec<DateTime<Utc>>,
    updated: Vec<DateTime<Utc>>,
}

impl<'a> BatchColumns<'a> {
    fn from_orders(orders: &'a [Order]) -> Self {
        Self {
            identifiers: orders.iter().map(Order::identifier).collect(),
            names: orders.iter().map(|o| o.name.as_str()).collect(),
            addresses: orders.iter().map(|o| o.delivery_address.as_str()).collect(),
            items: orders.iter().map(|o| Json(o.order_items.as_slice())).collect(),
            options: orders.iter().map(|o| o.delivery_option.as_str()).collect(),
            due_dates: orders.iter().map(|o| o.estimated_delivery_date).collect(),
            statuses: orders.iter().map(|o| o.order_status().as_str()).collect(),
            created: orders.iter().map(Order::created_at).collect(),
            updated: orders.iter().map(Order::updated_at).collect(),
        }
    }
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
    rows.into_iter().map(Order::try_from).collect()
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        StoreError::Unavailable(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError> {
        let sql = format!(
            "INSERT INTO orders (identifier, name, delivery_address, order_items, delivery_option,
                                 estimated_delivery_date, order_status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING {ORDER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(&order.identifier)
            .bind(&order.name)
            .bind(&order.delivery_address)
            .bind(Json(&order.order_items))
            .bind(&order.delivery_option)
            .bind(order.estimated_delivery_date)
            .bind(order.order_status.as_str())
            .bind(order.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::DuplicateIdentifier(order.identifier.clone())
                }
                other => other.into(),
            })?;

        Order::try_from(row)
    }

    async fn update(&self, order: &Order) -> Result<Order, StoreError> {
        let sql = format!(
            "UPDATE orders
                SET name = $2, delivery_address = $3, order_items = $4, delivery_option = $5,
                    estimated_delivery_date = $6, order_status = $7, updated_at = $8
              WHERE identifier = $1
             RETURNING {ORDER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order.identifier())
            .bind(&order.name)
            .bind(&order.delivery_address)
            .bind(Json(&order.order_items))
            .bind(&order.delivery_option)
            .bind(order.estimated_delivery_date)
            .bind(order.order_status().as_str())
            .bind(order.updated_at())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(order.identifier().to_string()))?;

        Order::try_from(row)
    }

    async fn find_one_by_identifier(&self, identifier: &str) -> Result<Option<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE identifier = $1");

        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?
            .map(Order::try_from)
            .transpose()
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_status = $1 ORDER BY id");

        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;

        into_orders(rows)
    }

    async fn find_all(&self) -> Result<Vec<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id");
        let rows = sqlx::query_as::<_, OrderRow>(&sql).fetch_all(&self.pool).await?;
        into_orders(rows)
    }

    async fn find_by_status_and_delivery_date_before(
        &self,
        status: OrderStatus,
        cutoff: NaiveDate,
    ) -> Result<Vec<Order>, StoreError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders
              WHERE order_status = $1 AND estimated_delivery_date < $2
              ORDER BY id"
        );

        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(status.as_str())
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            status = %status,
            cutoff = %cutoff,
            matches = rows.len(),
            "Queried orders by status and delivery date"
        );

        into_orders(rows)
    }

    async fn save_batch(&self, orders: &[Order]) -> Result<usize, StoreError> {
        if orders.is_empty() {
            return Ok(0);
        }

        // A single statement commits or fails as a whole
        let columns = BatchColumns::from_orders(orders);
        let saved = sqlx::query(
            "INSERT INTO orders (identifier, name, delivery_address, order_items, delivery_option,
                                 estimated_delivery_date, order_status, created_at, updated_at)
             SELECT * FROM UNNEST($1::varchar[], $2::varchar[], $3::varchar[], $4::jsonb[],
                                  $5::varchar[], $6::date[], $7::varchar[],
                                  $8::timestamptz[], $9::timestamptz[])
             ON CONFLICT (identifier) DO UPDATE
                SET name = EXCLUDED.name,
                    delivery_address = EXCLUDED.delivery_address,
                    order_items = EXCLUDED.order_items,
                    delivery_option = EXCLUDED.delivery_option,
                    estimated_delivery_date = EXCLUDED.estimated_delivery_date,
                    order_status = EXCLUDED.order_status,
                    updated_at = EXCLUDED.updated_at",
        )
        .bind(columns.identifiers)
        .bind(columns.names)
        .bind(columns.addresses)
        .bind(columns.items)
        .bind(columns.options)
        .bind(columns.due_dates)
        .bind(columns.statuses)
        .bind(columns.created)
        .bind(columns.updated)
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::info!(count = saved, "Saved order batch");
        Ok(orders.len())
    }

    async fn save_batch_where_status(
        &self,
        orders: &[Order],
        expected: OrderStatus,
    ) -> Result<Vec<Order>, StoreError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        // The status guard is evaluated against the row being updated, so a
        // concurrent change either commits first and is skipped here or waits
        // for this statement
        let columns = BatchColumns::from_orders(orders);
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders AS o
                SET name = v.name,
                    delivery_address = v.delivery_address,
                    order_items = v.order_items,
                    delivery_option = v.delivery_option,
                    estimated_delivery_date = v.estimated_delivery_date,
                    order_status = v.order_status,
                    updated_at = v.updated_at
               FROM UNNEST($1::varchar[], $2::varchar[], $3::varchar[], $4::jsonb[],
                           $5::varchar[], $6::date[], $7::varchar[], $8::timestamptz[])
                    AS v(identifier, name, delivery_address, order_items, delivery_option,
                         estimated_delivery_date, order_status, updated_at)
              WHERE o.identifier = v.identifier AND o.order_status = $9
             RETURNING {QUALIFIED_ORDER_COLUMNS}"
        ))
        .bind(columns.identifiers)
        .bind(columns.names)
        .bind(columns.addresses)
        .bind(columns.items)
        .bind(columns.options)
        .bind(columns.due_dates)
        .bind(columns.statuses)
        .bind(columns.updated)
        .bind(expected.as_str())
        .fetch_all(&self.pool)
        .await?;

        tracing::info!(
            attempted = orders.len(),
            written = rows.len(),
            expected = %expected,
            "Saved order batch where status matched"
        );
        into_orders(rows)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
//
// Row conversion is tested directly. The queries themselves need a live
// database: set DATABASE_URL and run with `--ignored`.
//
// ============================================================================
