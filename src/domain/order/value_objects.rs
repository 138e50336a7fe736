use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// A single line of an order. Item ids are opaque and may repeat.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OrderItem {
    pub id: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Delayed,
    Returned,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Delayed,
        OrderStatus::Returned,
        OrderStatus::Cancelled,
    ];

    /// Storage and wire representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Delayed => "delayed",
            OrderStatus::Returned => "returned",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// Result of moving an order from one status to another
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChange {
    pub previous: OrderStatus,
    pub current: OrderStatus,
    pub changed_at: chrono::DateTime<chrono::Utc>,
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_order_status_rejects_free_text() {
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, OrderError::UnknownStatus(ref s) if s == "lost"));

        // Matching is exact, not case-insensitive
        assert!("Processing".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_serializes_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Delayed).unwrap();
        assert_eq!(json, "\"delayed\"");

        let status: OrderStatus = serde_json::from_str("\"returned\"").unwrap();
        assert_eq!(status, OrderStatus::Returned);
    }

    #[test]
    fn test_order_item_rejects_unknown_fields() {
        let ok: OrderItem = serde_json::from_str(r#"{"id":"item123","quantity":3}"#).unwrap();
        assert_eq!(ok.id, "item123");
        assert_eq!(ok.quantity, 3);

        let bad = serde_json::from_str::<OrderItem>(r#"{"id":"x","quantity":1,"price":9}"#);
        assert!(bad.is_err());
    }
}
