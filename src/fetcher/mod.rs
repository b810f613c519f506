//! Retrieval strategies.
//!
//! Both strategies are total: at most one request, no retries, and every
//! failure collapses into `None`.

pub mod api;
mod config;
pub mod http_fetcher;
pub mod scrape;

pub use api::ApiStrategy;
pub use config::{HttpConfig, BROWSER_USER_AGENT};
pub use http_fetcher::HttpFetcher;
pub use scrape::ScraperStrategy;

use crate::domain::Rating;

/// One way of producing a rating for a domain.
#[derive(Debug, Clone)]
pub enum Strategy {
    Api(ApiStrategy),
    Scraper(ScraperStrategy),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Api(_) => "api",
            Strategy::Scraper(_) => "scraper",
        }
    }

    pub async fn fetch_rating(&self, http: &HttpFetcher, domain: &str) -> Option<Rating> {
        match self {
            Strategy::Api(api) => api.fetch_rating(http, domain).await,
            Strategy::Scraper(scraper) => scraper.fetch_rating(http, domain).await,
        }
    }
}
