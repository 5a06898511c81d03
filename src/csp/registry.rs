// src/csp/registry.rs
// =============================================================================
// The set of every domain this run has already printed.
//
// All workers share one registry. A domain is admitted at most once for
// the whole process, no matter how many sites mention it.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct DomainRegistry {
    seen: Mutex<HashSet<String>>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `domain` if it is new.
    ///
    /// Returns true only for the caller that inserted it. The check and the
    /// insert happen under one lock, so two workers racing on the same
    /// domain can't both get true.
    pub fn try_admit(&self, domain: &str) -> bool {
        let mut seen = self.lock();
        if seen.contains(domain) {
            return false;
        }
        seen.insert(domain.to_string())
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub fn contains(&self, domain: &str) -> bool {
        self.lock().contains(domain)
    }

    // A worker that panicked mid-insert leaves the set in a valid state,
    // so a poisoned lock is still safe to use
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
