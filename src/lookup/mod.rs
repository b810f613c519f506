//! Cache-aware lookups with per-domain deduplication.
//!
//! ```text
//! lookup(domain) → cache hit? → Cached
//!                → claim domain (or InFlight) → resolve (bounded by deadline) → cache.set → Fetched
//! ```

mod inflight;

pub use inflight::{InFlight, InFlightTicket};

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::{Result, TrustError};
use crate::cache::RatingCache;
use crate::domain::{normalize_domain, Rating};
use crate::resolver::Resolve;

/// Lookup preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Collapse subdomains to the registrable root before looking up (default: true)
    pub use_root_domain: bool,

    /// Lifetime of cached ratings in seconds (default: 1800)
    pub cache_ttl_secs: u64,

    /// Deadline for one resolve in seconds, 0 disables it (default: 15)
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            use_root_domain: true,
            cache_ttl_secs: 30 * 60,
            timeout_secs: 15,
        }
    }
}

impl LookupConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Served from a live cache entry, no network call
    Cached(Rating),
    /// Freshly resolved and stored in the cache
    Fetched(Rating),
    /// Every strategy came back empty
    NotFound,
    /// Another lookup for the same domain is running
    InFlight,
    /// The deadline passed before the resolver finished
    TimedOut,
}

impl LookupOutcome {
    pub fn rating(&self) -> Option<&Rating> {
        match self {
            LookupOutcome::Cached(rating) | LookupOutcome::Fetched(rating) => Some(rating),
            _ => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, LookupOutcome::Cached(_))
    }
}

pub struct LookupService {
    resolver: Arc<dyn Resolve>,
    cache: Arc<RatingCache>,
    in_flight: InFlight,
    ttl: Duration,
    deadline: Option<Duration>,
}

impl LookupService {
    pub fn new(resolver: Arc<dyn Resolve>, cache: Arc<RatingCache>, config: &LookupConfig) -> Self {
        Self {
            resolver,
            cache,
            in_flight: InFlight::new(),
            ttl: config.cache_ttl(),
            deadline: config.timeout(),
        }
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Look up `domain`, serving from cache unless `refresh` is set.
    pub async fn lookup(&self, domain: &str, refresh: bool) -> Result<LookupOutcome> {
        let domain =
            normalize_domain(domain).ok_or_else(|| TrustError::InvalidDomain(domain.to_string()))?;

        if !refresh {
            if let Some(rating) = self.cache.get(&domain) {
                tracing::debug!("Cache hit for {}", domain);
                return Ok(LookupOutcome::Cached(rating));
            }
        }

        let Some(_ticket) = self.in_flight.try_acquire(&domain) else {
            tracing::debug!("Lookup for {} already in flight", domain);
            return Ok(LookupOutcome::InFlight);
        };

        let resolved = match self.deadline {
            Some(deadline) => {
                match tokio::time::timeout(deadline, self.resolver.resolve(&domain)).await {
                    Ok(resolved) => resolved,
                    Err(_) => {
                        tracing::warn!("Lookup for {} timed out after {:?}", domain, deadline);
                        return Ok(LookupOutcome::TimedOut);
                    }
                }
            }
            None => self.resolver.resolve(&domain).await,
        };

        let Some(rating) = resolved else {
            return Ok(LookupOutcome::NotFound);
        };

        if let Err(e) = self.cache.set(&domain, rating.clone(), Some(self.ttl)) {
            tracing::warn!("Rating for {} not persisted: {}", domain, e);
        }

        tracing::info!(
            "Fetched rating {:.1} ({} reviews) for {}",
            rating.rating,
            rating.review_count,
            domain
        );
        Ok(LookupOutcome::Fetched(rating))
    }

    /// Bypass the cache and fetch a fresh rating.
    pub async fn refresh(&self, domain: &str) -> Result<LookupOutcome> {
        self.lookup(domain, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::store::SqliteStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Resolver that counts calls and optionally waits for a signal.
    struct FakeResolver {
        calls: AtomicUsize,
        score: Option<f64>,
        gate: Option<Arc<Notify>>,
        delay: Option<Duration>,
    }

    impl FakeResolver {
        fn returning(score: Option<f64>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                score,
                gate: None,
                delay: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Resolve for FakeResolver {
        async fn resolve(&self, domain: &str) -> Option<Rating> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let score = self.score?;
            Some(Rating {
                domain: domain.to_string(),
                rating: score,
                review_count: 3,
                trust_score: None,
                url: crate::domain::build_canonical_url(domain),
                fetched_at: 1,
            })
        }
    }

    fn cache() -> Arc<RatingCache> {
        Arc::new(RatingCache::with_clock(
            Arc::new(SqliteStore::in_memory().unwrap()),
            Arc::new(ManualClock::new(1_000_000)),
        ))
    }

    fn service(resolver: Arc<FakeResolver>, cache: Arc<RatingCache>) -> LookupService {
        LookupService::new(resolver, cache, &LookupConfig::default())
    }

    #[tokio::test]
    async fn test_fetches_then_serves_from_cache() {
        let resolver = Arc::new(FakeResolver::returning(Some(4.2)));
        let cache = cache();
        let service = service(resolver.clone(), cache.clone());

        let first = service.lookup("Example.com", false).await.unwrap();
        assert!(matches!(first, LookupOutcome::Fetched(ref r) if r.rating == 4.2));

        let second = service.lookup("example.com", false).await.unwrap();
        assert!(second.is_cached());
        assert_eq!(second.rating().unwrap().rating, 4.2);

        assert_eq!(resolver.calls(), 1);
        assert_eq!(
            cache.cache_info("example.com").unwrap().ttl,
            Duration::from_secs(1800)
        );
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let resolver = Arc::new(FakeResolver::returning(Some(4.2)));
        let service = service(resolver.clone(), cache());

        service.lookup("example.com", false).await.unwrap();
        let refreshed = service.refresh("example.com").await.unwrap();

        assert!(matches!(refreshed, LookupOutcome::Fetched(_)));
        assert_eq!(resolver.calls(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let resolver = Arc::new(FakeResolver::returning(None));
        let cache = cache();
        let service = service(resolver.clone(), cache.clone());

        assert_eq!(
            service.lookup("example.com", false).await.unwrap(),
            LookupOutcome::NotFound
        );
        assert!(cache.is_empty());
        assert!(service.in_flight().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_domain() {
        let resolver = Arc::new(FakeResolver::returning(Some(4.0)));
        let service = service(resolver.clone(), cache());

        let result = service.lookup("not a domain", false).await;
        assert!(matches!(result, Err(TrustError::InvalidDomain(_))));
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_same_domain_is_deduplicated() {
        let gate = Arc::new(Notify::new());
        let resolver = Arc::new(FakeResolver {
            gate: Some(gate.clone()),
            ..FakeResolver::returning(Some(3.3))
        });
        let service = Arc::new(service(resolver.clone(), cache()));

        let first = tokio::spawn({
            let service = service.clone();
            async move { service.lookup("example.com", false).await }
        });

        // Wait until the first lookup holds the claim.
        while !service.in_flight().contains("example.com") {
            tokio::task::yield_now().await;
        }

        let second = service.lookup("example.com", false).await.unwrap();
        assert_eq!(second, LookupOutcome::InFlight);

        gate.notify_one();
        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, LookupOutcome::Fetched(_)));

        assert_eq!(resolver.calls(), 1);
        assert!(service.in_flight().is_empty());
    }

    #[tokio::test]
    async fn test_different_domains_run_independently() {
        let resolver = Arc::new(FakeResolver::returning(Some(4.0)));
        let service = service(resolver.clone(), cache());

        let (a, b) = tokio::join!(
            service.lookup("a.com", false),
            service.lookup("b.com", false)
        );

        assert!(matches!(a.unwrap(), LookupOutcome::Fetched(_)));
        assert!(matches!(b.unwrap(), LookupOutcome::Fetched(_)));
        assert_eq!(resolver.calls(), 2);
    }

    #[tokio::test]
    async fn test_deadline() {
        let resolver = Arc::new(FakeResolver {
            delay: Some(Duration::from_secs(5)),
            ..FakeResolver::returning(Some(4.0))
        });
        let config = LookupConfig {
            timeout_secs: 1,
            ..LookupConfig::default()
        };
        let service = LookupService::new(resolver, cache(), &config);

        let outcome = service.lookup("example.com", false).await.unwrap();

        assert_eq!(outcome, LookupOutcome::TimedOut);
        assert!(service.in_flight().is_empty());
    }

    #[test]
    fn test_config_timeout() {
        let mut config = LookupConfig::default();
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        config.timeout_secs = 0;
        assert_eq!(config.timeout(), None);
    }
}
