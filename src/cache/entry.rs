//! Cache Entry Module
//!
//! Defines the structure for individual stored entries with an optional expiry.

use chrono::{DateTime, Utc};

use super::Expiration;

// == Cache Entry ==
/// A stored value with its write time and expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
    /// When the entry stops being visible, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry written now under the given expiration policy.
    pub fn new(value: V, expiration: &Expiration) -> Self {
        let now = Utc::now();
        Self {
            value,
            created_at: now,
            expires_at: expiration.deadline_from(now),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal
    /// to its expiry.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }
}
