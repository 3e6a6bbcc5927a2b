//! Time-bounded tenant configuration cache.
//!
//! DashMap-backed map of tenant identifier to configuration snapshot with
//! per-entry expiry. Failed lookups are cached too (with a shorter TTL) so
//! a persistently unresolvable identifier cannot hammer the authority on
//! every request. Eviction is time-based only; there is no size bound and
//! no single-flight coalescing of concurrent misses.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use gatehouse_core::{TenantConfig, TenantId};

/// What the cache remembers about an identifier.
#[derive(Debug, Clone)]
pub enum CachedOutcome {
    /// A configuration snapshot, shared with every request resolved within
    /// the TTL window.
    Found(Arc<TenantConfig>),
    /// The authority could not resolve this identifier recently.
    Unresolvable,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    outcome: CachedOutcome,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Shared, concurrency-safe configuration cache.
///
/// Readers and writers may race freely: entries are single-key writes, and
/// an expired entry is dropped lazily by the next reader that sees it.
pub struct ConfigCache {
    entries: DashMap<TenantId, CacheEntry, ahash::RandomState>,
    ttl: Duration,
    negative_ttl: Duration,
}

impl ConfigCache {
    #[must_use]
    pub fn new(ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            entries: DashMap::with_hasher(ahash::RandomState::new()),
            ttl,
            negative_ttl,
        }
    }

    /// Returns the live outcome for an identifier, or `None` on a miss.
    ///
    /// An entry past its expiry is never served; it is removed and the
    /// lookup reports a miss so the caller refreshes from the authority.
    #[must_use]
    pub fn lookup(&self, id: &TenantId) -> Option<CachedOutcome> {
        let now = Instant::now();
        {
            let entry = self.entries.get(id)?;
            if !entry.is_expired(now) {
                return Some(entry.outcome.clone());
            }
        }
        // The read guard must be dropped before removal or DashMap deadlocks.
        self.entries.remove_if(id, |_, entry| entry.is_expired(now));
        None
    }

    /// Stores a configuration snapshot, replacing any previous entry wholesale.
    pub fn store(&self, id: TenantId, config: Arc<TenantConfig>) {
        self.entries.insert(
            id,
            CacheEntry {
                outcome: CachedOutcome::Found(config),
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Remembers that an identifier could not be resolved.
    pub fn store_negative(&self, id: TenantId) {
        self.entries.insert(
            id,
            CacheEntry {
                outcome: CachedOutcome::Unresolvable,
                expires_at: Instant::now() + self.negative_ttl,
            },
        );
    }

    /// Drops the entry for an identifier, if any.
    pub fn invalidate(&self, id: &TenantId) {
        self.entries.remove(id);
    }

    /// Removes every expired entry and returns how many were dropped.
    ///
    /// Expiry is otherwise lazy; this exists for housekeeping tasks and
    /// keeps the map from accumulating entries for identifiers that are
    /// never looked up again.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Number of entries currently held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_core::TenantStatus;

    use super::*;

    fn make_config(id: &str) -> Arc<TenantConfig> {
        Arc::new(TenantConfig {
            tenant_id: TenantId::from(id),
            status: TenantStatus::Active,
            database_host: None,
            database_port: None,
            database_name: format!("tenant_{id}"),
            database_username: None,
            plan: "free".to_string(),
            features: std::collections::BTreeSet::new(),
            max_users: None,
            max_storage: None,
        })
    }

    #[test]
    fn miss_then_hit_round_trip() {
        let cache = ConfigCache::new(Duration::from_secs(60), Duration::from_secs(5));
        let id = TenantId::from("acme");

        assert!(cache.lookup(&id).is_none());

        cache.store(id.clone(), make_config("acme"));
        match cache.lookup(&id) {
            Some(CachedOutcome::Found(config)) => {
                assert_eq!(config.tenant_id, id);
            }
            other => panic!("expected positive hit, got {other:?}"),
        }
    }

    #[test]
    fn hits_share_the_same_snapshot() {
        let cache = ConfigCache::new(Duration::from_secs(60), Duration::from_secs(5));
        let id = TenantId::from("acme");
        let stored = make_config("acme");
        cache.store(id.clone(), Arc::clone(&stored));

        let Some(CachedOutcome::Found(first)) = cache.lookup(&id) else {
            panic!("expected hit");
        };
        let Some(CachedOutcome::Found(second)) = cache.lookup(&id) else {
            panic!("expected hit");
        };
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &stored));
    }

    #[test]
    fn expired_entry_is_never_served() {
        let cache = ConfigCache::new(Duration::ZERO, Duration::ZERO);
        let id = TenantId::from("acme");
        cache.store(id.clone(), make_config("acme"));

        assert!(cache.lookup(&id).is_none());
        // The expired entry was dropped by the lookup itself.
        assert!(cache.is_empty());
    }

    #[test]
    fn negative_entry_reports_unresolvable_until_expiry() {
        let cache = ConfigCache::new(Duration::from_secs(60), Duration::from_millis(40));
        let id = TenantId::from("ghost");
        cache.store_negative(id.clone());

        assert!(matches!(
            cache.lookup(&id),
            Some(CachedOutcome::Unresolvable)
        ));

        std::thread::sleep(Duration::from_millis(60));
        assert!(cache.lookup(&id).is_none());
    }

    #[test]
    fn store_replaces_previous_entry_wholesale() {
        let cache = ConfigCache::new(Duration::from_secs(60), Duration::from_secs(5));
        let id = TenantId::from("acme");
        cache.store_negative(id.clone());
        cache.store(id.clone(), make_config("acme"));

        assert!(matches!(cache.lookup(&id), Some(CachedOutcome::Found(_))));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_drops_the_entry() {
        let cache = ConfigCache::new(Duration::from_secs(60), Duration::from_secs(5));
        let id = TenantId::from("acme");
        cache.store(id.clone(), make_config("acme"));

        cache.invalidate(&id);
        assert!(cache.lookup(&id).is_none());
    }

    #[test]
    fn purge_expired_drops_only_dead_entries() {
        let cache = ConfigCache::new(Duration::from_secs(60), Duration::ZERO);
        cache.store(TenantId::from("alive"), make_config("alive"));
        cache.store_negative(TenantId::from("dead"));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(matches!(
            cache.lookup(&TenantId::from("alive")),
            Some(CachedOutcome::Found(_))
        ));
    }

    #[test]
    fn concurrent_readers_and_writers_do_not_lose_entries() {
        let cache = Arc::new(ConfigCache::new(
            Duration::from_secs(60),
            Duration::from_secs(5),
        ));

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let id = format!("tenant-{i}");
                    for _ in 0..100 {
                        cache.store(TenantId::from(id.as_str()), make_config(&id));
                        assert!(cache.lookup(&TenantId::from(id.as_str())).is_some());
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }
        assert_eq!(cache.len(), 8);
    }
}
