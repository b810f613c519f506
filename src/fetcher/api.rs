use serde::Deserialize;
use url::Url;

use crate::app::Result;
use crate::domain::{build_profile_url, normalize_domain, Rating};
use crate::fetcher::HttpFetcher;

/// Body of `GET {base}/rating?domain=...`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRatingResponse {
    rating: f64,
    review_count: u64,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    trust_score: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Rating lookup through a structured proxy API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStrategy {
    base_url: String,
    profile_base: String,
}

impl ApiStrategy {
    pub fn new(base_url: impl Into<String>, profile_base: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            profile_base: profile_base.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/rating?domain={domain}` with the domain query-escaped.
    pub fn endpoint(&self, domain: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/rating", self.base_url.trim_end_matches('/')))?;
        url.query_pairs_mut().append_pair("domain", domain);
        Ok(url)
    }

    /// Returns `None` on any transport, status or payload failure.
    pub async fn fetch_rating(&self, http: &HttpFetcher, domain: &str) -> Option<Rating> {
        match self.try_fetch(http, domain).await {
            Ok(rating) => Some(rating),
            Err(e) => {
                tracing::debug!("API lookup for {} failed: {}", domain, e);
                None
            }
        }
    }

    async fn try_fetch(&self, http: &HttpFetcher, domain: &str) -> Result<Rating> {
        let url = self.endpoint(domain)?;
        let body = http.get_json(url.as_str()).await?;
        let data: ApiRatingResponse = serde_json::from_str(&body)?;

        let rating_domain = data
            .domain
            .as_deref()
            .and_then(normalize_domain)
            .unwrap_or_else(|| domain.to_string());
        let profile_url = data
            .url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| build_profile_url(&self.profile_base, domain));

        Rating::new(
            &rating_domain,
            data.rating,
            data.review_count,
            data.trust_score,
            profile_url,
        )
    }
}
