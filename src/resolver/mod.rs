//! Strategy selection with fallback.
//!
//! ```text
//! api + base_url ──▶ ApiStrategy ──(none)──▶ ScraperStrategy
//! api, no base_url ─────────────────────────▶ ScraperStrategy
//! scraper ──────────────────────────────────▶ ScraperStrategy
//! ```
//!
//! Strategies run strictly one after another, never concurrently.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{normalize_domain, Rating};
use crate::fetcher::{ApiStrategy, HttpFetcher, ScraperStrategy, Strategy};

/// How ratings are retrieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum RetrievalConfig {
    #[default]
    Scraper,
    Api {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
}

impl RetrievalConfig {
    pub fn api(base_url: impl Into<String>) -> Self {
        RetrievalConfig::Api {
            base_url: Some(base_url.into()),
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        match self {
            RetrievalConfig::Scraper => "scraper",
            RetrievalConfig::Api { .. } => "api",
        }
    }

    /// The API base URL, if the API strategy is selected and one is set.
    pub fn api_base_url(&self) -> Option<&str> {
        match self {
            RetrievalConfig::Api { base_url } => base_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty()),
            RetrievalConfig::Scraper => None,
        }
    }
}

/// Anything that can turn a domain into a rating.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, domain: &str) -> Option<Rating>;
}

pub struct RatingResolver {
    http: HttpFetcher,
    profile_base: String,
    config: RwLock<RetrievalConfig>,
}

impl RatingResolver {
    pub fn new(http: HttpFetcher, profile_base: impl Into<String>, config: RetrievalConfig) -> Self {
        Self {
            http,
            profile_base: profile_base.into(),
            config: RwLock::new(config),
        }
    }

    pub fn config(&self) -> RetrievalConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Takes effect on the next `resolve`; lookups already running keep
    /// the plan they started with.
    pub fn set_config(&self, config: RetrievalConfig) {
        tracing::info!("Retrieval strategy set to {}", config.strategy_name());
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Ordered strategies for the current configuration.
    pub fn plan(&self) -> Vec<Strategy> {
        let config = self.config();
        let scraper = Strategy::Scraper(ScraperStrategy::new(self.profile_base.clone()));

        match config.api_base_url() {
            Some(base_url) => vec![
                Strategy::Api(ApiStrategy::new(base_url, self.profile_base.clone())),
                scraper,
            ],
            None => vec![scraper],
        }
    }

    pub async fn resolve(&self, domain: &str) -> Option<Rating> {
        let Some(domain) = normalize_domain(domain) else {
            tracing::debug!("Refusing to resolve invalid domain {:?}", domain);
            return None;
        };

        for strategy in self.plan() {
            tracing::debug!("Trying {} strategy for {}", strategy.name(), domain);
            if let Some(rating) = strategy.fetch_rating(&self.http, &domain).await {
                return Some(rating);
            }
        }

        tracing::debug!("No rating found for {}", domain);
        None
    }
}

#[async_trait]
impl Resolve for RatingResolver {
    async fn resolve(&self, domain: &str) -> Option<Rating> {
        RatingResolver::resolve(self, domain).await
    }
}
