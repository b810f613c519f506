//! Configuration management for trustcheck.
//!
//! Configuration is read from `~/.config/trustcheck/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use crate::fetcher::HttpConfig;
use crate::lookup::LookupConfig;
use crate::resolver::RetrievalConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keys accepted by [`Config::set`].
pub const SETTABLE_KEYS: &[&str] = &[
    "strategy",
    "base_url",
    "use_root_domain",
    "cache_ttl_secs",
    "timeout_secs",
];

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retrieval: RetrievalConfig,
    pub lookup: LookupConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_or_create(&Self::default_config_path()?)
    }

    /// Like [`Config::load`], for an explicit path.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        Self::load_from(path)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write the configuration to `path`, replacing any comments.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        Self::write_file(path, &content)
    }

    /// Get the default config file path: `~/.config/trustcheck/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("trustcheck").join("config.toml"))
    }

    /// Update a single setting from its string form.
    ///
    /// `base_url` selects the API strategy; setting `strategy` to `scraper`
    /// drops any configured base URL.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();

        match key {
            "strategy" => {
                self.retrieval = match value {
                    "scraper" => RetrievalConfig::Scraper,
                    "api" => RetrievalConfig::Api {
                        base_url: self.retrieval.api_base_url().map(str::to_string),
                    },
                    _ => return Err(invalid(key, value, "expected \"api\" or \"scraper\"")),
                };
            }
            "base_url" => {
                if value.is_empty() {
                    self.retrieval = RetrievalConfig::Api { base_url: None };
                } else {
                    url::Url::parse(value).map_err(|e| invalid(key, value, &e.to_string()))?;
                    self.retrieval = RetrievalConfig::api(value);
                }
            }
            "use_root_domain" => {
                self.lookup.use_root_domain = value
                    .parse()
                    .map_err(|_| invalid(key, value, "expected true or false"))?;
            }
            "cache_ttl_secs" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| invalid(key, value, "expected a number of seconds"))?;
                if secs == 0 {
                    return Err(invalid(key, value, "must be greater than zero"));
                }
                self.lookup.cache_ttl_secs = secs;
            }
            "timeout_secs" => {
                self.lookup.timeout_secs = value
                    .parse()
                    .map_err(|_| invalid(key, value, "expected a number of seconds"))?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }

        Ok(())
    }

    /// Restore every setting to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Create a default config file with comments.
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        Self::write_file(path, Self::default_config_content())
    }

    fn write_file(path: &Path, content: &str) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(content.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// The default config file content with comments.
    fn default_config_content() -> &'static str {
        r##"# trustcheck configuration

[retrieval]
# "scraper" reads the public review profile page.
# "api" queries base_url first and falls back to the scraper.
strategy = "scraper"
# base_url = "https://api.example.com"

[lookup]
# Collapse subdomains (shop.example.co.uk -> example.co.uk)
use_root_domain = true

# How long a rating stays cached, in seconds
cache_ttl_secs = 1800

# Give up on a lookup after this many seconds (0 waits forever)
timeout_secs = 15

[http]
# User agent sent with profile page requests
user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.0"

# Review profiles live at {profile_base}/{domain}
profile_base = "https://www.trustpilot.com/review"
"##
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Unknown config key {0:?} (expected one of: {keys})", keys = SETTABLE_KEYS.join(", "))]
    UnknownKey(String),

    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}
