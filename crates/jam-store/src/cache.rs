//! TTL + capacity cache for derived profile snapshots.
//!
//! Explicit component with its own lifecycle: constructed with a TTL and a
//! capacity, injected into the service, swappable for a zero-capacity
//! instance in tests. Eviction is oldest-insertion-first; expiry is checked
//! on read. Not part of the core's correctness — a miss is just a re-read.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use jam_core::entities::Profile;

struct CacheInner {
    map: HashMap<String, (Instant, Profile)>,
    order: VecDeque<String>,
}

/// Bounded, time-expiring read-through cache for [`Profile`] rows.
pub struct ProfileCache {
    ttl: Duration,
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl ProfileCache {
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// A cache that never stores anything (for tests exercising the
    /// read-through path on every call).
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    /// Look up a fresh entry, removing it if expired.
    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<Profile> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        match inner.map.get(user_id) {
            Some((inserted_at, profile)) if inserted_at.elapsed() < self.ttl => {
                Some(profile.clone())
            }
            Some(_) => {
                inner.map.remove(user_id);
                inner.order.retain(|k| k != user_id);
                None
            }
            None => None,
        }
    }

    /// Insert a snapshot, evicting the oldest insertion at capacity.
    pub fn insert(&self, profile: Profile) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let key = profile.user_id.clone();
        if inner.map.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        }
        while inner.map.len() >= self.capacity && !inner.map.contains_key(&key) {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            } else {
                break;
            }
        }
        inner.map.insert(key.clone(), (Instant::now(), profile));
        inner.order.push_back(key);
    }

    /// Drop a single entry.
    pub fn invalidate(&self, user_id: &str) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.map.remove(user_id);
        inner.order.retain(|k| k != user_id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
