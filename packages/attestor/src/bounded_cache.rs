//! Bounded cache of attested transfer ids with TTL and max-size eviction.
//!
//! Keeps memory flat over long runs while still preventing the attestor from
//! signing the same transfer twice under different nonces while its first
//! signature is in flight.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Transfer id -> (nonce it was attested with, insertion time).
///
/// On insert, expired entries are evicted first, then the oldest remaining
/// entries until there is room.
pub struct BoundedIdCache {
    map: HashMap<u64, (u64, Instant)>,
    max_size: usize,
    ttl: Duration,
}

impl BoundedIdCache {
    pub fn new(max_size: usize, ttl_secs: u64) -> Self {
        Self {
            map: HashMap::new(),
            max_size,
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Nonce the transfer was attested with, if present and not expired.
    pub fn get(&self, id: u64) -> Option<u64> {
        self.map
            .get(&id)
            .filter(|(_, t)| t.elapsed() < self.ttl)
            .map(|(nonce, _)| *nonce)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    pub fn insert(&mut self, id: u64, nonce: u64) {
        let now = Instant::now();

        self.map
            .retain(|_, (_, t)| now.duration_since(*t) < self.ttl);

        while self.map.len() >= self.max_size && !self.map.is_empty() {
            let oldest = self.map.iter().min_by_key(|(_, (_, t))| *t).map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    self.map.remove(&id);
                }
                None => break,
            }
        }

        self.map.insert(id, (nonce, now));
    }

    /// Drop an entry; returns the nonce it held.
    pub fn remove(&mut self, id: u64) -> Option<u64> {
        self.map.remove(&id).map(|(nonce, _)| nonce)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns (current len, max_size).
    pub fn capacity_info(&self) -> (usize, usize) {
        (self.map.len(), self.max_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_insert_and_get() {
        let mut cache = BoundedIdCache::new(10, 3600);
        assert!(!cache.contains(1));
        cache.insert(1, 7);
        assert_eq!(cache.get(1), Some(7));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut cache = BoundedIdCache::new(10, 3600);
        cache.insert(5, 9);
        assert_eq!(cache.remove(5), Some(9));
        assert!(!cache.contains(5));
        assert_eq!(cache.remove(5), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut cache = BoundedIdCache::new(3, 3600);
        for id in 1..=3 {
            cache.insert(id, id);
            sleep(Duration::from_millis(2));
        }
        cache.insert(4, 4);
        assert!(!cache.contains(1), "oldest should be evicted");
        assert!(cache.contains(2));
        assert!(cache.contains(4));
        assert_eq!(cache.capacity_info(), (3, 3));
    }

    #[test]
    fn test_ttl_eviction() {
        let mut cache = BoundedIdCache::new(100, 1);
        cache.insert(42, 1);
        assert!(cache.contains(42));
        sleep(Duration::from_secs(2));
        assert!(!cache.contains(42), "expired entry should not be found");
        cache.insert(99, 2);
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
    }
}
