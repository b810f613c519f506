use crate::app::{Result, TrustError};
use crate::domain::{build_profile_url, Rating};
use crate::extractor::RatingExtractor;
use crate::fetcher::HttpFetcher;

/// Rating lookup by fetching the public profile page and extracting from its HTML.
#[derive(Debug, Clone)]
pub struct ScraperStrategy {
    profile_base: String,
    extractor: RatingExtractor,
}

impl ScraperStrategy {
    pub fn new(profile_base: impl Into<String>) -> Self {
        Self {
            profile_base: profile_base.into(),
            extractor: RatingExtractor::new(),
        }
    }

    pub fn profile_url(&self, domain: &str) -> String {
        build_profile_url(&self.profile_base, domain)
    }

    /// Returns `None` on transport failure or when the page carries no rating.
    pub async fn fetch_rating(&self, http: &HttpFetcher, domain: &str) -> Option<Rating> {
        match self.try_fetch(http, domain).await {
            Ok(Some(rating)) => Some(rating),
            Ok(None) => {
                tracing::debug!("No rating present on profile page for {}", domain);
                None
            }
            Err(e) => {
                tracing::debug!("Scrape for {} failed: {}", domain, e);
                None
            }
        }
    }

    async fn try_fetch(&self, http: &HttpFetcher, domain: &str) -> Result<Option<Rating>> {
        let url = self.profile_url(domain);
        let html = http.get_page(&url).await?;

        let extracted = self.extractor.extract(&html);
        let Some(score) = extracted.rating else {
            return Ok(None);
        };

        match Rating::new(domain, score, extracted.review_count, extracted.trust_score, url) {
            Ok(rating) => Ok(Some(rating)),
            Err(TrustError::InvalidRating(reason)) => {
                tracing::debug!("Discarding extracted rating: {}", reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
