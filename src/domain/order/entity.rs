use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::value_objects::{OrderItem, OrderStatus, StatusChange};
use crate::utils::dates::timestamp;

// ============================================================================
// Order Entity
// ============================================================================
//
// Invariants upheld here:
// - `identifier` is set once at creation and never reassigned
// - `updated_at` never precedes `created_at`
// - status changes go through `transition_to`, which refreshes `updated_at`
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    // Store-assigned surrogate key
    #[serde(skip)]
    pub id: i64,
    identifier: String,

    pub name: String,
    pub delivery_address: String,
    pub order_items: Vec<OrderItem>,
    pub delivery_option: String,
    pub estimated_delivery_date: NaiveDate,
    order_status: OrderStatus,

    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Rebuild an order from persisted fields
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: i64,
        identifier: String,
        name: String,
        delivery_address: String,
        order_items: Vec<OrderItem>,
        delivery_option: String,
        estimated_delivery_date: NaiveDate,
        order_status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            identifier,
            name,
            delivery_address,
            order_items,
            delivery_option,
            estimated_delivery_date,
            order_status,
            created_at,
            updated_at: updated_at.max(created_at),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn order_status(&self) -> OrderStatus {
        self.order_status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Move to `status`, stamping `updated_at` with `at`.
    ///
    /// Any status may follow any other; the only fixed transition in the
    /// system is the reconciliation job's `processing -> delayed`.
    pub fn transition_to(&mut self, status: OrderStatus, at: DateTime<Utc>) -> StatusChange {
        let previous = self.order_status;
        self.order_status = status;
        self.touch(at);

        StatusChange {
            previous,
            current: status,
            changed_at: self.updated_at,
        }
    }

    /// Whether the order is in `status` and due strictly before `cutoff`
    pub fn is_due_before(&self, status: OrderStatus, cutoff: NaiveDate) -> bool {
        self.order_status == status && self.estimated_delivery_date < cutoff
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at.max(self.created_at);
    }
}

/// A validated order that has not been assigned a surrogate key yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub identifier: String,
    pub name: String,
    pub delivery_address: String,
    pub order_items: Vec<OrderItem>,
    pub delivery_option: String,
    pub estimated_delivery_date: NaiveDate,
    pub order_status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn into_order(self, id: i64) -> Order {
        Order::restore(
            id,
            self.identifier,
            self.name,
            self.delivery_address,
            self.order_items,
            self.delivery_option,
            self.estimated_delivery_date,
            self.order_status,
            self.created_at,
            self.created_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::test_support::{date, new_order};
    use chrono::Duration;

    #[test]
    fn test_new_order_starts_with_equal_timestamps() {
        let order = new_order("abc", OrderStatus::Processing, "2024-07-01").into_order(1);

        assert_eq!(order.id, 1);
        assert_eq!(order.identifier(), "abc");
        assert_eq!(order.created_at(), order.updated_at());
    }

    #[test]
    fn test_transition_records_previous_status() {
        let mut order = new_order("abc", OrderStatus::Processing, "2024-07-01").into_order(1);
        let at = order.created_at() + Duration::seconds(5);

        let change = order.transition_to(OrderStatus::Shipped, at);

        assert_eq!(change.previous, OrderStatus::Processing);
        assert_eq!(change.current, OrderStatus::Shipped);
        assert_eq!(change.changed_at, at);
        assert_eq!(order.order_status(), OrderStatus::Shipped);
        assert_eq!(order.updated_at(), at);
    }

    #[test]
    fn test_transition_never_moves_updated_at_before_created_at() {
        let mut order = new_order("abc", OrderStatus::Processing, "2024-07-01").into_order(1);
        let earlier = order.created_at() - Duration::hours(1);

        order.transition_to(OrderStatus::Delayed, earlier);

        assert!(order.updated_at() >= order.created_at());
    }

    #[test]
    fn test_restore_clamps_updated_at() {
        let created = Utc::now();
        let order = Order::restore(
            7,
            "id".into(),
            "n".into(),
            "a".into(),
            vec![],
            "Express Delivery".into(),
            date("2024-01-01"),
            OrderStatus::Delivered,
            created,
            created - Duration::days(1),
        );

        assert_eq!(order.updated_at(), created);
    }

    #[test]
    fn test_is_due_before_is_strict() {
        let order = new_order("abc", OrderStatus::Processing, "2024-08-01").into_order(1);

        assert!(order.is_due_before(OrderStatus::Processing, date("2024-08-02")));
        assert!(!order.is_due_before(OrderStatus::Processing, date("2024-08-01")));
        assert!(!order.is_due_before(OrderStatus::Shipped, date("2024-08-02")));
    }

    #[test]
    fn test_order_serialization_shape() {
        let order = new_order("abc", OrderStatus::Delayed, "2024-07-01").into_order(42);
        let json = serde_json::to_value(&order).unwrap();

        assert!(json.get("id").is_none());
        assert_eq!(json["identifier"], "abc");
        assert_eq!(json["estimated_delivery_date"], "2024-07-01");
        assert_eq!(json["order_status"], "delayed");
        assert_eq!(json["order_items"][0]["quantity"], 3);
    }
}
