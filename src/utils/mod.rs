pub mod dates;
pub mod retry;

pub use dates::{is_valid_calendar_date, parse_calendar_date};
pub use retry::{retry_on_transient, RetryConfig};
