use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::app::{Result, TrustError};
use crate::domain::normalize::normalize_domain;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// A reputation rating for one domain, as produced by a successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub domain: String,
    pub rating: f64,
    /// `0` means the source listed no reviews, not that the lookup failed.
    pub review_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<String>,
    pub url: String,
    /// Epoch milliseconds at which the rating was retrieved.
    pub fetched_at: i64,
}

impl Rating {
    /// Build a rating stamped with the current time.
    ///
    /// Fails when the domain does not normalize or the score lies outside
    /// `[1.0, 5.0]`.
    pub fn new(
        domain: &str,
        rating: f64,
        review_count: u64,
        trust_score: Option<String>,
        url: String,
    ) -> Result<Self> {
        let domain = normalize_domain(domain)
            .ok_or_else(|| TrustError::InvalidRating(format!("bad domain {:?}", domain)))?;

        if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(TrustError::InvalidRating(format!(
                "score {} for {} outside [{}, {}]",
                rating, domain, MIN_RATING, MAX_RATING
            )));
        }

        let trust_score = trust_score
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            domain,
            rating,
            review_count,
            trust_score,
            url,
            fetched_at: Utc::now().timestamp_millis(),
        })
    }

    pub fn display_trust_score(&self) -> &str {
        self.trust_score.as_deref().unwrap_or("-")
    }
}
