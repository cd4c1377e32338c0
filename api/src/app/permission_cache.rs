//! Per-profile grant cache
//!
//! Resolved grants are kept for a fixed TTL. Writes to profiles or
//! permissions clear the whole map, so a revoked grant stops working on the
//! next request rather than when the entry expires.
//!
//! Every clear also bumps a generation counter. Entries carry the generation
//! that was current when their lookup started, and stale ones are ignored,
//! so a lookup racing with a write cannot put old grants back.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::entities::{Grant, ProfileId};

pub type GrantSet = Arc<HashSet<Grant>>;

struct CachedGrants {
    grants: GrantSet,
    expires_at: Instant,
    generation: u64,
}

pub struct PermissionCache {
    entries: DashMap<ProfileId, CachedGrants>,
    generation: AtomicU64,
    ttl: Duration,
}

impl PermissionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            ttl,
        }
    }

    /// Cached grants for a profile, if present and not expired
    pub fn get(&self, profile_id: &ProfileId) -> Option<GrantSet> {
        let current = self.generation();
        self.entries.get(profile_id).and_then(|entry| {
            if entry.generation == current && entry.expires_at > Instant::now() {
                Some(entry.grants.clone())
            } else {
                None
            }
        })
    }

    /// Read before loading grants and pass the value to [`Self::insert`]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Cache grants loaded while `generation` was current
    ///
    /// When the cache was invalidated in the meantime the grants are still
    /// returned to the caller but not kept.
    pub fn insert(
        &self,
        profile_id: ProfileId,
        generation: u64,
        grants: HashSet<Grant>,
    ) -> GrantSet {
        let grants = Arc::new(grants);
        if generation == self.generation() {
            self.entries.insert(
                profile_id,
                CachedGrants {
                    grants: grants.clone(),
                    expires_at: Instant::now() + self.ttl,
                    generation,
                },
            );
        }
        grants
    }

    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let dropped = self.entries.len();
        self.entries.clear();
        tracing::debug!(dropped, "Permission cache invalidated");
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
