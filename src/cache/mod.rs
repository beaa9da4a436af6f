//! In-memory TTL cache for upstream resource payloads.
//!
//! Entries live for a fixed TTL set at construction. `get` re-checks expiry on
//! every read, so the background sweeper only reclaims memory.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::server::metrics::{record_cache_hit, record_cache_miss};

pub const MISS_ABSENT: &str = "absent";
pub const MISS_EXPIRED: &str = "expired";

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let resource_type = resource_type(key);
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match entries.get(key) {
            None => {
                record_cache_miss(resource_type, MISS_ABSENT);
                None
            }
            Some(entry) if Instant::now() > entry.expires_at => {
                record_cache_miss(resource_type, MISS_EXPIRED);
                None
            }
            Some(entry) => {
                record_cache_hit(resource_type);
                Some(entry.value.clone())
            }
        }
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.write().insert(key.into(), entry);
    }

    pub fn delete(&self, key: &str) {
        self.write().remove(key);
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.expires_at);
        before - entries.len()
    }

    /// Run `sweep` once per TTL until `shutdown` fires.
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cache.ttl);

            // Skip the first immediate tick, wait for the first interval
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Cache sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = cache.sweep();
                        if removed > 0 {
                            debug!("Cache sweep removed {} expired entries", removed);
                        }
                    }
                }
            }
        })
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Coarse metric label for a cache key: the collection segment of a resource URI.
pub fn resource_type(key: &str) -> &str {
    let path = key.split_once("://").map(|(_, rest)| rest).unwrap_or(key);
    let end = path.find(|c: char| c == '/' || c == '?').unwrap_or(path.len());
    match &path[..end] {
        "" => "unknown",
        collection => collection,
    }
}
