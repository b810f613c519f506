use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, TrustError};
use crate::cache::RatingCache;
use crate::config::Config;
use crate::fetcher::HttpFetcher;
use crate::lookup::LookupService;
use crate::resolver::RatingResolver;
use crate::store::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub cache: Arc<RatingCache>,
    pub resolver: Arc<RatingResolver>,
    pub lookup: LookupService,
}

impl AppContext {
    /// Open the rating database at `db_path` (or the default location).
    ///
    /// If the database cannot be opened the context still comes up, with a
    /// cache that lives in memory for the rest of the process.
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let opened = match db_path {
            Some(p) => SqliteStore::new(&p),
            None => Self::default_db_path().and_then(|p| SqliteStore::new(&p)),
        };

        match opened {
            Ok(store) => Self::with_store(config, Arc::new(store), true),
            Err(e) => {
                tracing::warn!("Rating database unavailable, caching in memory only: {}", e);
                Self::with_store(config, Arc::new(SqliteStore::in_memory()?), false)
            }
        }
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store, true)
    }

    fn with_store(config: Config, store: Arc<SqliteStore>, durable: bool) -> Result<Self> {
        let mut cache =
            RatingCache::new(store.clone()).with_default_ttl(config.lookup.cache_ttl());
        if !durable {
            cache = cache.memory_only();
        }
        let cache = Arc::new(cache);
        let http = HttpFetcher::new(&config.http)?;
        let resolver = Arc::new(RatingResolver::new(
            http,
            config.http.profile_base.clone(),
            config.retrieval.clone(),
        ));
        let lookup = LookupService::new(resolver.clone(), cache.clone(), &config.lookup);

        Ok(Self {
            config,
            store,
            cache,
            resolver,
            lookup,
        })
    }

    pub fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| TrustError::Other("Could not find data directory".into()))?;
        let app_dir = data_dir.join("trustcheck");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("trustcheck.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Rating;
    use crate::lookup::LookupOutcome;
    use std::time::Duration;

    fn rating(domain: &str) -> Rating {
        Rating::new(domain, 4.5, 10, None, crate::domain::build_canonical_url(domain)).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_reads_shared_cache() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        ctx.cache.set("example.com", rating("example.com"), None).unwrap();

        let outcome = ctx.lookup.lookup("example.com", false).await.unwrap();
        assert!(outcome.is_cached());
    }

    #[test]
    fn test_cache_ttl_from_config() {
        let mut config = Config::default();
        config.set("cache_ttl_secs", "90").unwrap();

        let ctx = AppContext::in_memory(config).unwrap();
        assert_eq!(ctx.cache.default_ttl(), Duration::from_secs(90));
    }

    #[tokio::test]
    async fn test_unopenable_database_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("sub").join("trustcheck.db");

        let ctx = AppContext::new(Config::default(), Some(path.clone())).unwrap();
        assert!(!path.exists());

        let result = ctx.cache.set("example.com", rating("example.com"), None);
        assert!(matches!(result, Err(TrustError::Persist(_))));

        let outcome = ctx.lookup.lookup("example.com", false).await.unwrap();
        assert_eq!(outcome.rating().unwrap().rating, 4.5);
        assert!(outcome.is_cached());
    }

    #[test]
    fn test_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trustcheck.db");

        {
            let ctx = AppContext::new(Config::default(), Some(path.clone())).unwrap();
            ctx.cache.set("example.com", rating("example.com"), None).unwrap();
        }

        let ctx = AppContext::new(Config::default(), Some(path)).unwrap();
        assert_eq!(ctx.cache.get("example.com").unwrap().rating, 4.5);
    }
}
