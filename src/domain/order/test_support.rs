use chrono::{NaiveDate, Utc};

use super::{NewOrder, OrderItem, OrderStatus};

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub(crate) fn new_order(identifier: &str, status: OrderStatus, due: &str) -> NewOrder {
    NewOrder {
        identifier: identifier.to_string(),
        name: "John Doe".to_string(),
        delivery_address: "1234 Elm Street".to_string(),
        order_items: vec![OrderItem {
            id: "item123".to_string(),
            quantity: 3,
        }],
        delivery_option: "Standard Delivery".to_string(),
        estimated_delivery_date: date(due),
        order_status: status,
        created_at: Utc::now(),
    }
}
