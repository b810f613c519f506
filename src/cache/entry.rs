use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Rating;

/// A cached rating plus its expiry metadata.
///
/// Serialized as `{ "data": Rating, "timestamp": ms, "ttl": ms }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(rename = "data")]
    pub rating: Rating,
    /// Epoch milliseconds; set by the cache on insertion.
    #[serde(rename = "timestamp")]
    pub stored_at: i64,
    #[serde(rename = "ttl")]
    pub ttl_ms: u64,
}

/// Freshness report for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheInfo {
    pub cached: bool,
    pub age: Duration,
    pub ttl: Duration,
    pub expires_in: Duration,
}

impl CacheEntry {
    pub fn new(rating: Rating, stored_at: i64, ttl: Duration) -> Self {
        Self {
            rating,
            stored_at,
            ttl_ms: ttl.as_millis() as u64,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Milliseconds since insertion; a timestamp in the future counts as age zero.
    pub fn age_ms(&self, now: i64) -> u64 {
        now.saturating_sub(self.stored_at).max(0) as u64
    }

    pub fn is_live(&self, now: i64) -> bool {
        self.age_ms(now) < self.ttl_ms
    }

    pub fn info(&self, now: i64) -> CacheInfo {
        let age = self.age_ms(now);
        CacheInfo {
            cached: self.is_live(now),
            age: Duration::from_millis(age),
            ttl: self.ttl(),
            expires_in: Duration::from_millis(self.ttl_ms.saturating_sub(age)),
        }
    }
}
