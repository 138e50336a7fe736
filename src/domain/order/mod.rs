// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (OrderItem, OrderStatus, StatusChange)
// - Entity (Order, NewOrder)
// - Commands (CreateOrder, UpdateOrderStatus)
// - Errors (OrderError)
// - Creation strategies (IdentifierGenerator, DeliveryEstimator)
//
// Persistence lives in `crate::store`; this module has no I/O.
//
// ============================================================================

pub mod value_objects;
pub mod entity;
pub mod commands;
pub mod errors;
pub mod generators;

#[cfg(test)]
pub(crate) mod test_support;

pub use value_objects::*;
pub use entity::*;
pub use commands::*;
pub use errors::*;
pub use generators::*;
