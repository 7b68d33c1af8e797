//! Read-through cache in front of std-hash lookups.
//!
//! Best-effort only: entries expire after a TTL and the cache is never the
//! system of record. A miss always falls through to the database.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::record::UrlRecord;

struct CacheEntry {
    stored_at: Instant,
    record: UrlRecord,
}

/// TTL cache keyed by `std_path_hash`. Instance-scoped, shared behind the
/// manager that owns it.
pub struct UrlCache {
    ttl: Duration,
    entries: Mutex<FxHashMap<u32, CacheEntry>>,
}

impl UrlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn get(&self, std_hash: u32) -> Option<UrlRecord> {
        let mut entries = self.entries.lock();
        match entries.get(&std_hash) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.record.clone()),
            Some(_) => {
                entries.remove(&std_hash);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, record: &UrlRecord) {
        self.entries.lock().insert(
            record.std_path_hash,
            CacheEntry {
                stored_at: Instant::now(),
                record: record.clone(),
            },
        );
    }

    pub fn remove(&self, std_hash: u32) {
        self.entries.lock().remove(&std_hash);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
