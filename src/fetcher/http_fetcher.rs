use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;

use crate::app::{Result, TrustError};
use crate::fetcher::HttpConfig;

/// Thin reqwest wrapper: one GET per call, no retries, non-2xx is an error.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    browser_user_agent: String,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("trustcheck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            browser_user_agent: config.user_agent.clone(),
        })
    }

    /// GET a JSON document.
    pub async fn get_json(&self, url: &str) -> Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        self.get(url, headers).await
    }

    /// GET an HTML page while identifying as a browser.
    pub async fn get_page(&self, url: &str) -> Result<String> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.browser_user_agent) {
            headers.insert(USER_AGENT, value);
        }
        self.get(url, headers).await
    }

    async fn get(&self, url: &str, headers: HeaderMap) -> Result<String> {
        let response = self.client.get(url).headers(headers).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrustError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
