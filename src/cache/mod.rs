//! TTL cache of ratings, mirrored in memory and persisted through a [`Store`].
//!
//! The whole map lives under one record ([`CACHE_KEY`]) and is rewritten on
//! every mutation before the mutating call returns. The durable copy is read
//! once, on first use, dropping entries that already expired.
//!
//! If that first read fails the cache keeps working from memory for the rest
//! of the process, and every mutation reports [`TrustError::Persist`] so the
//! caller knows the change is not durable.

mod clock;
mod entry;

pub use clock::{Clock, SystemClock};
pub use entry::{CacheEntry, CacheInfo};

#[cfg(test)]
pub(crate) use clock::ManualClock;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::app::{Result, TrustError};
use crate::domain::Rating;
use crate::store::Store;

/// Record key holding the serialized cache map.
pub const CACHE_KEY: &str = "trustchecker_rating_cache";

pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    initialized: bool,
    memory_only: bool,
}

pub struct RatingCache {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    state: Mutex<CacheState>,
}

impl RatingCache {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            default_ttl: DEFAULT_TTL,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// TTL used when `set`/`reset_ttl` are called without one.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Never read or write the store. Mutations stay in memory and report
    /// [`TrustError::Persist`].
    pub fn memory_only(mut self) -> Self {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.initialized = true;
        state.memory_only = true;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Live rating for `domain`. An expired entry is evicted as a side effect.
    pub fn get(&self, domain: &str) -> Option<Rating> {
        let key = cache_key(domain);
        let now = self.clock.now_millis();
        let mut state = self.lock();

        let entry = state.entries.get(&key)?;
        if entry.is_live(now) {
            return Some(entry.rating.clone());
        }

        tracing::debug!("Cache entry for {} expired", key);
        state.entries.remove(&key);
        if let Err(e) = self.persist(&state) {
            tracing::warn!("Could not persist eviction of {}: {}", key, e);
        }
        None
    }

    /// Insert or overwrite the entry for `domain`.
    pub fn set(&self, domain: &str, rating: Rating, ttl: Option<Duration>) -> Result<()> {
        let key = cache_key(domain);
        let entry = CacheEntry::new(
            rating,
            self.clock.now_millis(),
            ttl.unwrap_or(self.default_ttl),
        );

        let mut state = self.lock();
        state.entries.insert(key, entry);
        self.persist(&state)
    }

    /// Remove one entry, or every entry when `domain` is `None`.
    pub fn clear(&self, domain: Option<&str>) -> Result<()> {
        let mut state = self.lock();
        match domain {
            Some(domain) => {
                state.entries.remove(&cache_key(domain));
            }
            None => state.entries.clear(),
        }
        self.persist(&state)
    }

    /// Restart the clock on an existing entry. Missing entries are left alone.
    pub fn reset_ttl(&self, domain: &str, ttl: Option<Duration>) -> Result<()> {
        let key = cache_key(domain);
        let now = self.clock.now_millis();
        let ttl = ttl.unwrap_or(self.default_ttl);

        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(&key) else {
            return Ok(());
        };
        entry.stored_at = now;
        entry.ttl_ms = ttl.as_millis() as u64;
        self.persist(&state)
    }

    /// Freshness of the entry for `domain`, if one is held. Never evicts.
    pub fn cache_info(&self, domain: &str) -> Option<CacheInfo> {
        let now = self.clock.now_millis();
        let state = self.lock();
        state.entries.get(&cache_key(domain)).map(|e| e.info(now))
    }

    /// Every held entry with its rating, sorted by domain. Expired entries
    /// are listed too; nothing is evicted or written.
    pub fn entries(&self) -> Vec<(String, Rating, CacheInfo)> {
        let now = self.clock.now_millis();
        let state = self.lock();
        let mut entries: Vec<_> = state
            .entries
            .iter()
            .map(|(domain, entry)| (domain.clone(), entry.rating.clone(), entry.info(now)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now_millis();
        let mut state = self.lock();

        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.is_live(now));
        let removed = before - state.entries.len();

        if removed > 0 {
            self.persist(&state)?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock the state, loading the durable copy on first use.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.initialized {
            self.load_into(&mut state);
        }
        state
    }

    fn load_into(&self, state: &mut CacheState) {
        state.initialized = true;

        let stored = match self.store.load(CACHE_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Rating cache storage unavailable, running in memory: {}", e);
                state.memory_only = true;
                return;
            }
        };

        let map: HashMap<String, CacheEntry> = match serde_json::from_str(&stored) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("Discarding unreadable rating cache: {}", e);
                return;
            }
        };

        let now = self.clock.now_millis();
        let total = map.len();
        state.entries = map
            .into_iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(domain, entry)| (cache_key(&domain), entry))
            .collect();

        tracing::debug!(
            "Loaded {} cached ratings ({} expired)",
            state.entries.len(),
            total - state.entries.len()
        );
    }

    /// Rewrite the durable record from `state`. Called with the lock held so
    /// concurrent mutations cannot interleave their writes.
    fn persist(&self, state: &CacheState) -> Result<()> {
        if state.memory_only {
            return Err(TrustError::Persist(
                "durable storage unavailable; change kept in memory only".into(),
            ));
        }

        let ordered: BTreeMap<&String, &CacheEntry> = state.entries.iter().collect();
        let json = serde_json::to_string(&ordered)?;

        self.store
            .save(CACHE_KEY, &json)
            .map_err(|e| TrustError::Persist(e.to_string()))
    }
}

fn cache_key(domain: &str) -> String {
    domain.trim().to_ascii_lowercase()
}
