// src/cache.rs

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A serialized list response and the total number of matching documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedList {
    pub total: u64,
    pub body: Vec<u8>,
}

impl CachedList {
    pub fn new(total: u64, body: Vec<u8>) -> Self {
        Self { total, body }
    }
}

/// Cache of serialized public responses.
///
/// Controllers only ever see this trait. Writes call `clear` with their
/// resource key so the next read goes back to the store.
///
/// Each resource key carries a generation that `clear` bumps. A reader takes
/// the generation before querying the store and hands it to `put`; a body
/// read across a concurrent `clear` is then discarded instead of cached.
pub trait CacheLayer: Send + Sync {
    fn get(&self, key: &str) -> Option<CachedList>;
    fn generation(&self, resource: &str) -> u64;
    /// Stores `value` under `key` unless `resource` was cleared since
    /// `generation` was read. Returns whether the entry was stored.
    fn put(&self, resource: &str, key: String, value: CachedList, generation: u64) -> bool;
    /// Drops `key` itself and every `key:<suffix>` entry.
    fn clear(&self, key: &str);
}

#[derive(Clone)]
struct HotEntry {
    value: CachedList,
    created_at: Instant,
}

#[derive(Default)]
struct HotState {
    entries: HashMap<String, HotEntry>,
    generations: HashMap<String, u64>,
}

/// In-memory TTL cache with a bounded entry count. Oldest entry is evicted first.
pub struct HotCache {
    ttl: Duration,
    max_entries: usize,
    state: Mutex<HotState>,
}

impl HotCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            state: Mutex::new(HotState::default()),
        }
    }

    // Entries are replaced whole, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches_key(entry: &str, key: &str) -> bool {
    entry == key
        || entry
            .strip_prefix(key)
            .is_some_and(|rest| rest.starts_with(':'))
}

impl CacheLayer for HotCache {
    fn get(&self, key: &str) -> Option<CachedList> {
        let mut state = self.lock();
        state.entries.retain(|_, v| v.created_at.elapsed() <= self.ttl);
        state.entries.get(key).map(|e| e.value.clone())
    }

    fn generation(&self, resource: &str) -> u64 {
        self.lock().generations.get(resource).copied().unwrap_or(0)
    }

    fn put(&self, resource: &str, key: String, value: CachedList, generation: u64) -> bool {
        let mut state = self.lock();
        let current = state.generations.get(resource).copied().unwrap_or(0);
        if current != generation {
            tracing::debug!("Dropping stale list for '{}' (generation {} != {})", key, generation, current);
            return false;
        }

        let ttl = self.ttl;
        let entries = &mut state.entries;
        entries.retain(|_, v| v.created_at.elapsed() <= ttl);
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            if let Some(victim) = entries
                .iter()
                .min_by_key(|(_, v)| v.created_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&victim);
            }
        }
        entries.insert(
            key,
            HotEntry {
                value,
                created_at: Instant::now(),
            },
        );
        true
    }

    fn clear(&self, key: &str) {
        let mut state = self.lock();
        *state.generations.entry(key.to_string()).or_insert(0) += 1;
        let before = state.entries.len();
        state.entries.retain(|k, _| !matches_key(k, key));
        tracing::debug!("Cache cleared for '{}' ({} entries)", key, before - state.entries.len());
    }
}

/// Stores nothing. Every read is a miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl CacheLayer for NoCache {
    fn get(&self, _key: &str) -> Option<CachedList> {
        None
    }

    fn generation(&self, _resource: &str) -> u64 {
        0
    }

    fn put(&self, _resource: &str, _key: String, _value: CachedList, _generation: u64) -> bool {
        false
    }

    fn clear(&self, _key: &str) {}
}
