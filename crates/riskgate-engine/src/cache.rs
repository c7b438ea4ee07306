//! Risk Cache
//!
//! Bounded destination → risk record store. Writes come from the
//! control plane only; engine invocations read concurrently and copy
//! records out. Capacity is fixed: once full, inserts of new keys are
//! rejected while overwrites of existing keys keep working. Expiry is
//! lazy: the read side decides whether a record is stale, and stale
//! records stay in place until overwritten.

use dashmap::DashMap;

use riskgate_common::{GateError, GateResult, RiskRecord};

/// Fixed cache capacity
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Destination → risk record store
pub struct RiskCache {
    map: DashMap<u32, RiskRecord>,
    capacity: usize,
}

impl RiskCache {
    /// Cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Cache with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: DashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Copy out the record for `dest`, expired or not.
    #[inline(always)]
    pub fn lookup(&self, dest: u32) -> Option<RiskRecord> {
        self.map.get(&dest).map(|r| *r)
    }

    /// Insert or overwrite a record.
    ///
    /// At capacity, a new key is rejected with [`GateError::CacheFull`];
    /// an existing key is overwritten in place.
    pub fn insert(&self, dest: u32, record: RiskRecord) -> GateResult<()> {
        if self.map.len() >= self.capacity && !self.map.contains_key(&dest) {
            return Err(GateError::CacheFull);
        }
        self.map.insert(dest, record);
        Ok(())
    }

    /// Number of records, stale ones included.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RiskCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: u32, expiry: u64) -> RiskRecord {
        RiskRecord {
            score,
            blocked: score >= 80,
            expiry,
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let cache = RiskCache::new();
        assert!(cache.is_empty());
        cache.insert(0x0a00_0001, record(55, 900)).unwrap();
        assert_eq!(cache.lookup(0x0a00_0001), Some(record(55, 900)));
        assert_eq!(cache.lookup(0x0a00_0002), None);
    }

    #[test]
    fn test_full_cache_rejects_new_keys() {
        let cache = RiskCache::with_capacity(2);
        cache.insert(1, record(10, 100)).unwrap();
        cache.insert(2, record(20, 100)).unwrap();

        assert!(matches!(
            cache.insert(3, record(30, 100)),
            Err(GateError::CacheFull)
        ));
        assert_eq!(cache.len(), 2);

        // Existing keys stay writable at capacity.
        cache.insert(2, record(99, 500)).unwrap();
        assert_eq!(cache.lookup(2), Some(record(99, 500)));
    }

    #[test]
    fn test_stale_records_are_not_removed() {
        let cache = RiskCache::new();
        cache.insert(7, record(95, 10)).unwrap();

        // Long past expiry, the record is still physically present.
        assert_eq!(cache.lookup(7), Some(record(95, 10)));
        assert_eq!(cache.len(), 1);
    }
}
