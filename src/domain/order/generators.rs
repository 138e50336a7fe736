use chrono::NaiveDate;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

use super::errors::OrderError;
use crate::utils::dates::generate_date_in_future;

// ============================================================================
// Order Creation Strategies
// ============================================================================
//
// Identifier generation and delivery estimation are injected into the API
// state and passed to `CreateOrder::into_new_order`, so tests can pin their
// output.
//
// ============================================================================

pub trait IdentifierGenerator: Send + Sync {
    fn generate(&self) -> String;
}

pub trait DeliveryEstimator: Send + Sync {
    /// Estimated delivery date for an order placed on `today`
    fn estimate(&self, delivery_option: &str, today: NaiveDate) -> Result<NaiveDate, OrderError>;
}

// URL-safe base64 alphabet; 64 symbols so `byte & 63` is unbiased
const URL_SAFE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// OS-random, URL-safe identifiers
#[derive(Debug, Clone)]
pub struct SecureIdentifierGenerator {
    length: usize,
}

impl SecureIdentifierGenerator {
    pub const MIN_LENGTH: usize = 22;
    pub const DEFAULT_LENGTH: usize = 32;

    pub fn new(length: usize) -> Result<Self, OrderError> {
        if length < Self::MIN_LENGTH {
            return Err(OrderError::IdentifierTooShort {
                requested: length,
                min: Self::MIN_LENGTH,
            });
        }
        Ok(Self { length })
    }
}

impl Default for SecureIdentifierGenerator {
    fn default() -> Self {
        Self {
            length: Self::DEFAULT_LENGTH,
        }
    }
}

impl IdentifierGenerator for SecureIdentifierGenerator {
    fn generate(&self) -> String {
        let mut bytes = vec![0u8; self.length];
        OsRng.fill_bytes(&mut bytes);

        bytes
            .into_iter()
            .map(|b| URL_SAFE_ALPHABET[usize::from(b & 63)] as char)
            .collect()
    }
}

/// Picks a lead time uniformly from `1..=max_days`
#[derive(Debug, Clone)]
pub struct RandomDeliveryEstimator {
    max_days: u32,
}

impl RandomDeliveryEstimator {
    pub fn new(max_days: u32) -> Self {
        Self {
            max_days: max_days.max(1),
        }
    }
}

impl Default for RandomDeliveryEstimator {
    fn default() -> Self {
        Self::new(7)
    }
}

impl DeliveryEstimator for RandomDeliveryEstimator {
    fn estimate(&self, _delivery_option: &str, today: NaiveDate) -> Result<NaiveDate, OrderError> {
        let days = rand::thread_rng().gen_range(1..=self.max_days);
        generate_date_in_future(today, days)
    }
}
