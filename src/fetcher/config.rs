use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_PROFILE_BASE;

/// Browser identification sent with profile page requests. Some origins
/// refuse requests without one.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.0";

/// HTTP settings shared by both retrieval strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent for profile page requests
    pub user_agent: String,

    /// Base of the review-profile URL; the domain is appended as a path segment
    pub profile_base: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            profile_base: DEFAULT_PROFILE_BASE.to_string(),
        }
    }
}
