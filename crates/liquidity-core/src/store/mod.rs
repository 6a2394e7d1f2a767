//! # Key-Value Store
//!
//! Ordered byte-keyed storage the module persists into. `MemStore` is the
//! plain backing store; `CacheStore` buffers writes over a parent store so a
//! message or a whole batch settlement commits all at once, or not at all
//! when the cache is dropped.

pub mod keys;

use std::collections::BTreeMap;
use std::ops::Bound;

use liquidity_types::{LiquidityError, LiquidityResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Ordered key-value storage
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);

    /// All entries under `prefix`, in ascending key order
    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// Exclusive upper bound of the key range starting with `prefix`
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

fn prefix_range(prefix: &[u8]) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let upper = match prefix_end(prefix) {
        Some(end) => Bound::Excluded(end),
        None => Bound::Unbounded,
    };
    (Bound::Included(prefix.to_vec()), upper)
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-memory store backed by a `BTreeMap`
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .range(prefix_range(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

// ============================================================================
// Cache Store
// ============================================================================

/// Write buffer over a parent store
///
/// Reads see buffered writes first. Nothing reaches the parent until
/// `write` is called.
pub struct CacheStore<'a> {
    parent: &'a mut dyn KvStore,
    /// `None` marks a pending delete
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self { parent, pending: BTreeMap::new() }
    }

    /// Flush buffered writes into the parent store
    pub fn write(self) {
        let CacheStore { parent, pending } = self;
        for (key, value) in pending {
            match value {
                Some(value) => parent.set(key, value),
                None => parent.delete(&key),
            }
        }
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(value) => value.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.pending.insert(key, Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.pending.insert(key.to_vec(), None);
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self.parent.prefix_scan(prefix).into_iter().collect();
        for (key, value) in self.pending.range(prefix_range(prefix)) {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}

// ============================================================================
// JSON Codec
// ============================================================================

/// Read and decode a JSON value
pub fn get_json<T: DeserializeOwned>(store: &dyn KvStore, key: &[u8]) -> LiquidityResult<Option<T>> {
    match store.get(key) {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| LiquidityError::codec(&hex_key(key), &e.to_string())),
        None => Ok(None),
    }
}

/// Encode and write a JSON value
pub fn set_json<T: Serialize>(store: &mut dyn KvStore, key: Vec<u8>, value: &T) -> LiquidityResult<()> {
    let bytes = serde_json::to_vec(value).map_err(|e| LiquidityError::codec(&hex_key(&key), &e.to_string()))?;
    store.set(key, bytes);
    Ok(())
}

/// Decode every value under a prefix, in key order
pub fn scan_json<T: DeserializeOwned>(store: &dyn KvStore, prefix: &[u8]) -> LiquidityResult<Vec<(Vec<u8>, T)>> {
    store
        .prefix_scan(prefix)
        .into_iter()
        .map(|(key, bytes)| {
            let value = serde_json::from_slice(&bytes).map_err(|e| LiquidityError::codec(&hex_key(&key), &e.to_string()))?;
            Ok((key, value))
        })
        .collect()
}

fn hex_key(key: &[u8]) -> String {
    hex::encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_scan_is_ordered_and_bounded() {
        let mut store = MemStore::new();
        store.set(vec![1, 2], b"b".to_vec());
        store.set(vec![1, 1], b"a".to_vec());
        store.set(vec![2, 0], b"c".to_vec());
        store.set(vec![1, 0xff], b"z".to_vec());

        let scanned = store.prefix_scan(&[1]);
        let keys: Vec<Vec<u8>> = scanned.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![vec![1, 1], vec![1, 2], vec![1, 0xff]]);
    }

    #[test]
    fn test_prefix_end_carries() {
        assert_eq!(prefix_end(&[1, 0xff]), Some(vec![2]));
        assert_eq!(prefix_end(&[0xff, 0xff]), None);
    }

    #[test]
    fn test_cache_store_buffers_until_write() {
        let mut parent = MemStore::new();
        parent.set(vec![1, 1], b"old".to_vec());
        parent.set(vec![1, 2], b"gone".to_vec());

        {
            let mut cache = CacheStore::new(&mut parent);
            cache.set(vec![1, 1], b"new".to_vec());
            cache.delete(&[1, 2]);
            cache.set(vec![1, 3], b"added".to_vec());

            assert_eq!(cache.get(&[1, 1]), Some(b"new".to_vec()));
            assert_eq!(cache.get(&[1, 2]), None);
            assert_eq!(cache.prefix_scan(&[1]).len(), 2);
            // Dropped without write
        }
        assert_eq!(parent.get(&[1, 1]), Some(b"old".to_vec()));
        assert!(parent.has(&[1, 2]));

        let mut cache = CacheStore::new(&mut parent);
        cache.set(vec![1, 1], b"new".to_vec());
        cache.delete(&[1, 2]);
        cache.write();
        assert_eq!(parent.get(&[1, 1]), Some(b"new".to_vec()));
        assert!(!parent.has(&[1, 2]));
    }

    #[test]
    fn test_nested_cache() {
        let mut parent = MemStore::new();
        let mut outer = CacheStore::new(&mut parent);
        {
            let mut inner = CacheStore::new(&mut outer);
            inner.set(vec![7], b"x".to_vec());
            inner.write();
        }
        assert_eq!(outer.get(&[7]), Some(b"x".to_vec()));
        outer.write();
        assert_eq!(parent.get(&[7]), Some(b"x".to_vec()));
    }

    #[test]
    fn test_json_codec() {
        let mut store = MemStore::new();
        set_json(&mut store, vec![9], &vec![1u64, 2, 3]).unwrap();
        let value: Option<Vec<u64>> = get_json(&store, &[9]).unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));

        store.set(vec![8], b"not json".to_vec());
        assert!(get_json::<Vec<u64>>(&store, &[8]).is_err());
    }
}
