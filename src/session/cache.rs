use crate::core::PartitionState;
use rand::seq::IteratorRandom;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Number of worlds a session keeps in memory.
pub const PARTITION_CACHE_CAPACITY: usize = 8;

/// Bounded map from world name to the last state seen for it.
///
/// Eviction picks its victim uniformly at random among the cached keys, not
/// by recency.
pub struct PartitionCache {
    capacity: usize,
    entries: RefCell<HashMap<String, Rc<PartitionState>>>,
}

impl PartitionCache {
    pub fn new() -> Self {
        Self::with_capacity(PARTITION_CACHE_CAPACITY)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "partition cache capacity must be non-zero");
        Self {
            capacity,
            entries: RefCell::new(HashMap::with_capacity(capacity)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Rc<PartitionState>> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Inserts or overwrites `key`, returning the evicted key if a new key
    /// pushed the cache over capacity.
    pub fn put(&self, key: &str, state: Rc<PartitionState>) -> Option<String> {
        let mut entries = self.entries.borrow_mut();
        if let Some(slot) = entries.get_mut(key) {
            *slot = state;
            return None;
        }

        let evicted = if entries.len() >= self.capacity {
            let victim = entries
                .keys()
                .choose(&mut rand::thread_rng())
                .cloned();
            if let Some(victim) = &victim {
                entries.remove(victim);
            }
            victim
        } else {
            None
        };

        entries.insert(key.to_string(), state);
        evicted
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

impl Default for PartitionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_xp(experience: i32) -> Rc<PartitionState> {
        Rc::new(PartitionState {
            experience,
            ..PartitionState::empty()
        })
    }

    #[test]
    fn test_get_missing_is_none() {
        let cache = PartitionCache::new();
        assert!(cache.get("world").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = PartitionCache::new();
        for i in 0..PARTITION_CACHE_CAPACITY {
            cache.put(&format!("w{}", i + 1), state_with_xp(i as i32));
        }
        let evicted = cache.put("w3", state_with_xp(300));
        assert_eq!(evicted, None);
        assert_eq!(cache.len(), PARTITION_CACHE_CAPACITY);
        assert_eq!(cache.get("w3").unwrap().experience, 300);
    }

    #[test]
    fn test_ninth_key_evicts_exactly_one() {
        let cache = PartitionCache::new();
        let originals: Vec<String> = (1..=8).map(|i| format!("w{}", i)).collect();
        for key in &originals {
            cache.put(key, state_with_xp(0));
        }

        let evicted = cache.put("w9", state_with_xp(9)).expect("a key must be evicted");
        assert!(originals.contains(&evicted));
        assert!(!cache.contains(&evicted));
        assert!(cache.contains("w9"));
        assert_eq!(cache.len(), 8);

        let survivors = originals.iter().filter(|key| cache.contains(key)).count();
        assert_eq!(survivors, 7);
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let cache = PartitionCache::with_capacity(3);
        for i in 0..50 {
            cache.put(&format!("w{}", i), state_with_xp(i));
            assert!(cache.len() <= 3);
        }
        assert!(cache.contains("w49"));
    }

    #[test]
    fn test_eviction_is_not_recency_based() {
        // With LRU the hot key would always survive; random eviction must
        // eventually drop it.
        let mut hot_evicted = false;
        for _ in 0..200 {
            let cache = PartitionCache::with_capacity(2);
            cache.put("hot", state_with_xp(0));
            cache.put("cold", state_with_xp(0));
            cache.get("hot");
            if cache.put("new", state_with_xp(0)).as_deref() == Some("hot") {
                hot_evicted = true;
                break;
            }
        }
        assert!(hot_evicted);
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = PartitionCache::new();
        cache.put("w1", state_with_xp(1));
        cache.clear();
        assert!(cache.is_empty());
    }
}
