// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Date provided must match the defined format of YYYY-mm-dd: {0:?}")]
    InvalidDateFormat(String),

    #[error("Unknown order status: {0:?}")]
    UnknownStatus(String),

    #[error("{0} cannot be blank")]
    BlankField(&'static str),

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Generated identifier length should have a minimum of {min} characters, got {requested}")]
    IdentifierTooShort { requested: usize, min: usize },

    #[error("Number of days in the future must be greater than 0")]
    NonPositiveDayCount,

    #[error("Date out of range: {0} days after {1}")]
    DateOutOfRange(u32, chrono::NaiveDate),
}
