use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::entity::NewOrder;
use super::errors::OrderError;
use super::generators::{DeliveryEstimator, IdentifierGenerator};
use super::value_objects::{OrderItem, OrderStatus};
use crate::utils::dates::parse_calendar_date;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================
//
// Both payloads reject unknown fields during decoding.
//
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrder {
    pub name: String,
    pub delivery_address: String,
    pub order_items: Vec<OrderItem>,
    pub delivery_option: String,
    /// Optional `YYYY-MM-DD`; estimated from the delivery option when absent
    #[serde(default)]
    pub estimated_delivery_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderStatus {
    pub order_identifier: String,
    pub new_order_status: String,
}

impl CreateOrder {
    /// Validate the payload and build an order ready for the store.
    /// New orders always start out `processing`.
    pub fn into_new_order(
        self,
        identifiers: &dyn IdentifierGenerator,
        estimator: &dyn DeliveryEstimator,
        now: DateTime<Utc>,
    ) -> Result<NewOrder, OrderError> {
        require_present("name", &self.name)?;
        require_present("delivery_address", &self.delivery_address)?;
        require_present("delivery_option", &self.delivery_option)?;

        if self.order_items.is_empty() {
            return Err(OrderError::EmptyItems);
        }
        if let Some(item) = self.order_items.iter().find(|item| item.quantity <= 0) {
            return Err(OrderError::InvalidQuantity(item.quantity));
        }

        let estimated_delivery_date = match self.estimated_delivery_date.as_deref() {
            Some(raw) => parse_calendar_date(raw)?,
            None => estimator.estimate(&self.delivery_option, now.date_naive())?,
        };

        Ok(NewOrder {
            identifier: identifiers.generate(),
            name: self.name,
            delivery_address: self.delivery_address,
            order_items: self.order_items,
            delivery_option: self.delivery_option,
            estimated_delivery_date,
            order_status: OrderStatus::Processing,
            created_at: now,
        })
    }
}

impl UpdateOrderStatus {
    pub fn status(&self) -> Result<OrderStatus, OrderError> {
        self.new_order_status.parse()
    }
}

fn require_present(field: &'static str, value: &str) -> Result<(), OrderError> {
    if value.trim().is_empty() {
        return Err(OrderError::BlankField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct FixedIdentifier;

    impl IdentifierGenerator for FixedIdentifier {
        fn generate(&self) -> String {
            "fixed-identifier-0000000000000000".to_string()
        }
    }

    struct TwoDays;

    impl DeliveryEstimator for TwoDays {
        fn estimate(&self, _: &str, today: NaiveDate) -> Result<NaiveDate, OrderError> {
            crate::utils::dates::generate_date_in_future(today, 2)
        }
    }

    fn payload(json: &str) -> CreateOrder {
        serde_json::from_str(json).unwrap()
    }

    fn now() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 8, 19)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_create_order_defaults_to_processing_with_estimate() {
        let cmd = payload(
            r#"{"name":"John Doe","delivery_address":"1234 Elm Street",
                "order_items":[{"id":"item123","quantity":3}],
                "delivery_option":"standard"}"#,
        );

        let order = cmd.into_new_order(&FixedIdentifier, &TwoDays, now()).unwrap();

        assert_eq!(order.order_status, OrderStatus::Processing);
        assert_eq!(order.identifier, "fixed-identifier-0000000000000000");
        assert_eq!(order.estimated_delivery_date, NaiveDate::from_ymd_opt(2024, 8, 21).unwrap());
        assert_eq!(order.created_at, now());
    }

    #[test]
    fn test_create_order_uses_supplied_date() {
        let cmd = payload(
            r#"{"name":"a","delivery_address":"b","order_items":[{"id":"x","quantity":1}],
                "delivery_option":"express","estimated_delivery_date":"2024-09-01"}"#,
        );

        let order = cmd.into_new_order(&FixedIdentifier, &TwoDays, now()).unwrap();
        assert_eq!(order.estimated_delivery_date, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
    }

    #[test]
    fn test_create_order_rejects_bad_date() {
        let cmd = payload(
            r#"{"name":"a","delivery_address":"b","order_items":[{"id":"x","quantity":1}],
                "delivery_option":"express","estimated_delivery_date":"2024-13-19"}"#,
        );

        let err = cmd.into_new_order(&FixedIdentifier, &TwoDays, now()).unwrap_err();
        assert_eq!(err, OrderError::InvalidDateFormat("2024-13-19".into()));
    }

    #[test]
    fn test_create_order_requires_presence() {
        let cmd = payload(
            r#"{"name":"  ","delivery_address":"b","order_items":[{"id":"x","quantity":1}],
                "delivery_option":"express"}"#,
        );
        assert_eq!(
            cmd.into_new_order(&FixedIdentifier, &TwoDays, now()).unwrap_err(),
            OrderError::BlankField("name")
        );

        let cmd = payload(
            r#"{"name":"a","delivery_address":"b","order_items":[],"delivery_option":"express"}"#,
        );
        assert_eq!(
            cmd.into_new_order(&FixedIdentifier, &TwoDays, now()).unwrap_err(),
            OrderError::EmptyItems
        );

        let cmd = payload(
            r#"{"name":"a","delivery_address":"b","order_items":[{"id":"x","quantity":0}],
                "delivery_option":"express"}"#,
        );
        assert_eq!(
            cmd.into_new_order(&FixedIdentifier, &TwoDays, now()).unwrap_err(),
            OrderError::InvalidQuantity(0)
        );
    }

    #[test]
    fn test_unknown_fields_rejected_structurally() {
        let result = serde_json::from_str::<UpdateOrderStatus>(
            r#"{"order_identifier":"abc","new_order_status":"shipped","extra":1}"#,
        );
        assert!(result.is_err());

        let result = serde_json::from_str::<CreateOrder>(
            r#"{"name":"a","delivery_address":"b","order_items":[],"delivery_option":"c","order_status":"delivered"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_update_status_parses_enum() {
        let cmd: UpdateOrderStatus =
            serde_json::from_str(r#"{"order_identifier":"abc","new_order_status":"returned"}"#).unwrap();
        assert_eq!(cmd.status().unwrap(), OrderStatus::Returned);

        let cmd: UpdateOrderStatus =
            serde_json::from_str(r#"{"order_identifier":"abc","new_order_status":"teleported"}"#).unwrap();
        assert!(cmd.status().is_err());
    }
}
