use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{OrderStore, StoreError};
use crate::domain::order::{NewOrder, Order, OrderStatus};

// ============================================================================
// In-Memory Order Store
// ============================================================================

#[derive(Default)]
struct State {
    // Keyed by surrogate id so listings come back in insertion order
    orders: BTreeMap<i64, Order>,
    next_id: i64,
}

impl State {
    fn id_of(&self, identifier: &str) -> Option<i64> {
        self.orders
            .values()
            .find(|order| order.identifier() == identifier)
            .map(|order| order.id)
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    state: RwLock<State>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut state = self.state.write().await;

        if state.id_of(&order.identifier).is_some() {
            return Err(StoreError::DuplicateIdentifier(order.identifier));
        }

        let id = state.allocate_id();
        let order = order.into_order(id);
        state.orders.insert(id, order.clone());

        Ok(order)
    }

    async fn update(&self, order: &Order) -> Result<Order, StoreError> {
        let mut state = self.state.write().await;

        let id = state
            .id_of(order.identifier())
            .ok_or_else(|| StoreError::NotFound(order.identifier().to_string()))?;

        let mut stored = order.clone();
        stored.id = id;
        state.orders.insert(id, stored.clone());

        Ok(stored)
    }

    async fn find_one_by_identifier(&self, identifier: &str) -> Result<Option<Order>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .find(|order| order.identifier() == identifier)
            .cloned())
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|order| order.order_status() == status)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.state.read().await.orders.values().cloned().collect())
    }

    async fn find_by_status_and_delivery_date_before(
        &self,
        status: OrderStatus,
        cutoff: NaiveDate,
    ) -> Result<Vec<Order>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|order| order.is_due_before(status, cutoff))
            .cloned()
            .collect())
    }

    async fn save_batch(&self, orders: &[Order]) -> Result<usize, StoreError> {
        // A single write guard makes the whole batch visible at once
        let mut state = self.state.write().await;

        for order in orders {
            let id = match state.id_of(order.identifier()) {
                Some(id) => id,
                None => state.allocate_id(),
            };
            let mut stored = order.clone();
            stored.id = id;
            state.orders.insert(id, stored);
        }

        Ok(orders.len())
    }

    async fn save_batch_where_status(
        &self,
        orders: &[Order],
        expected: OrderStatus,
    ) -> Result<Vec<Order>, StoreError> {
        // Check and write under the same guard
        let mut state = self.state.write().await;
        let mut written = Vec::with_capacity(orders.len());

        for order in orders {
            let Some(id) = state.id_of(order.identifier()) else {
                continue;
            };
            if state.orders.get(&id).map(Order::order_status) != Some(expected) {
                continue;
            }

            let mut stored = order.clone();
            stored.id = id;
            state.orders.insert(id, stored.clone());
            written.push(stored);
        }

        Ok(written)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::test_support::{date, new_order};
    use chrono::Utc;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryOrderStore::new();

        let a = store.create(new_order("a", OrderStatus::Processing, "2024-07-01")).await.unwrap();
        let b = store.create(new_order("b", OrderStatus::Shipped, "2024-07-01")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_identifier() {
        let store = InMemoryOrderStore::new();
        store.create(new_order("a", OrderStatus::Processing, "2024-07-01")).await.unwrap();

        let err = store
            .create(new_order("a", OrderStatus::Shipped, "2024-08-01"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateIdentifier(ref id) if id == "a"));
    }

    #[tokio::test]
    async fn test_find_by_status_and_date_is_strict() {
        let store = InMemoryOrderStore::new();
        store.create(new_order("early", OrderStatus::Processing, "2024-07-31")).await.unwrap();
        store.create(new_order("on-cutoff", OrderStatus::Processing, "2024-08-01")).await.unwrap();
        store.create(new_order("shipped", OrderStatus::Shipped, "2024-07-01")).await.unwrap();

        let found = store
            .find_by_status_and_delivery_date_before(OrderStatus::Processing, date("2024-08-01"))
            .await
            .unwrap();

        let ids: Vec<&str> = found.iter().map(Order::identifier).collect();
        assert_eq!(ids, vec!["early"]);
    }

    #[tokio::test]
    async fn test_update_unknown_identifier_is_not_found() {
        let store = InMemoryOrderStore::new();
        let orphan = new_order("ghost", OrderStatus::Processing, "2024-07-01").into_order(99);

        let err = store.update(&orphan).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_save_batch_upserts_by_identifier() {
        let store = InMemoryOrderStore::new();
        let mut existing = store
            .create(new_order("a", OrderStatus::Processing, "2024-07-01"))
            .await
            .unwrap();
        existing.transition_to(OrderStatus::Delayed, Utc::now());
        let fresh = new_order("b", OrderStatus::Shipped, "2024-07-01").into_order(0);

        let saved = store.save_batch(&[existing, fresh]).await.unwrap();
        assert_eq!(saved, 2);

        let a = store.find_one_by_identifier("a").await.unwrap().unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(a.order_status(), OrderStatus::Delayed);

        let b = store.find_one_by_identifier("b").await.unwrap().unwrap();
        assert_eq!(b.id, 2);
        assert_eq!(store.find_by_status(OrderStatus::Shipped).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_batch_where_status_skips_rows_that_moved_on() {
        let store = InMemoryOrderStore::new();
        let mut a = store.create(new_order("a", OrderStatus::Processing, "2024-07-01")).await.unwrap();
        let mut b = store.create(new_order("b", OrderStatus::Processing, "2024-07-01")).await.unwrap();
        let mut ghost = new_order("ghost", OrderStatus::Processing, "2024-07-01").into_order(0);

        // b is shipped by someone else after it was read
        let mut shipped = b.clone();
        shipped.transition_to(OrderStatus::Shipped, Utc::now());
        store.update(&shipped).await.unwrap();

        for order in [&mut a, &mut b, &mut ghost] {
            order.transition_to(OrderStatus::Delayed, Utc::now());
        }

        let written = store
            .save_batch_where_status(&[a, b, ghost], OrderStatus::Processing)
            .await
            .unwrap();

        let ids: Vec<&str> = written.iter().map(Order::identifier).collect();
        assert_eq!(ids, vec!["a"]);
        assert_eq!(
            store.find_one_by_identifier("b").await.unwrap().unwrap().order_status(),
            OrderStatus::Shipped
        );
        assert!(store.find_one_by_identifier("ghost").await.unwrap().is_none());
    }
}
