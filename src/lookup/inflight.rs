use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Set of domains with a lookup currently running.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    domains: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `domain`. Returns `None` if it is already claimed; otherwise the
    /// claim lasts until the returned ticket is dropped.
    pub fn try_acquire(&self, domain: &str) -> Option<InFlightTicket> {
        let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        if !domains.insert(domain.to_string()) {
            return None;
        }

        Some(InFlightTicket {
            domains: self.domains.clone(),
            domain: domain.to_string(),
        })
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.domains
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(domain)
    }

    pub fn len(&self) -> usize {
        self.domains
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its domain on drop, whichever way the lookup ended.
#[derive(Debug)]
pub struct InFlightTicket {
    domains: Arc<Mutex<HashSet<String>>>,
    domain: String,
}

impl InFlightTicket {
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.domains
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.domain);
    }
}
