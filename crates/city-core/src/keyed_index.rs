//! String-keyed hash table with separate chaining and prime-sized growth.
//!
//! Every ID→entity index in the model goes through [`KeyedIndex`], including
//! the graph's own id→vertex-position map. New keys go to the tail of their
//! chain. A resize walks the old buckets in index order, so keys that shared
//! an old chain keep their relative order, while keys from different old
//! chains are ordered by old bucket index rather than by insertion.

use crate::error::{CoreError, Result};

/// Bucket count used by [`KeyedIndex::new`].
pub const DEFAULT_BUCKETS: usize = 53;

/// Entries per bucket above which the table grows.
pub const MAX_LOAD_FACTOR: f64 = 0.75;

const HASH_BASE: u64 = 31;

/// A key/value pair stored in a bucket chain.
#[derive(Debug, Clone, PartialEq)]
pub struct HashEntry<V> {
    pub key: String,
    pub value: V,
}

/// Chained hash table keyed by non-empty strings.
#[derive(Debug, Clone)]
pub struct KeyedIndex<V> {
    buckets: Vec<Vec<HashEntry<V>>>,
    len: usize,
}

/// Polynomial rolling hash (base 31) folded into `bucket_count` buckets.
///
/// The accumulator is reduced modulo the bucket count after every character,
/// so the result is always in `0..bucket_count`.
pub fn hash(key: &str, bucket_count: usize) -> usize {
    assert!(bucket_count > 0, "bucket count must be non-zero");
    let modulus = bucket_count as u64;
    let mut h: u64 = 0;
    for c in key.chars() {
        h = (h * HASH_BASE + u64::from(c)) % modulus;
    }
    h as usize
}

/// Smallest prime greater than or equal to `n`.
pub fn next_prime(n: usize) -> usize {
    if n <= 2 {
        return 2;
    }
    let mut candidate = n;
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut i = 3;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

impl<V> KeyedIndex<V> {
    /// Create an empty index with [`DEFAULT_BUCKETS`] buckets.
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    /// Create an empty index with at least `bucket_count` buckets, rounded up
    /// to the next prime (minimum 2).
    pub fn with_buckets(bucket_count: usize) -> Self {
        let count = next_prime(bucket_count);
        Self {
            buckets: empty_buckets(count),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Current ratio of stored entries to buckets.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    /// Number of entries chained under `bucket`, or `None` if out of range.
    pub fn chain_len(&self, bucket: usize) -> Option<usize> {
        self.buckets.get(bucket).map(Vec::len)
    }

    /// Insert or overwrite `key`.
    ///
    /// Returns the previous value when the key was already present; the entry
    /// count is unchanged in that case. Inserting a new key may grow the table.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Result<Option<V>> {
        let key = key.into();
        if key.is_empty() {
            return Err(CoreError::InvalidArgument(
                "index key must not be empty".to_string(),
            ));
        }

        let bucket = hash(&key, self.buckets.len());
        if let Some(entry) = self.buckets[bucket].iter_mut().find(|e| e.key == key) {
            return Ok(Some(std::mem::replace(&mut entry.value, value)));
        }

        self.buckets[bucket].push(HashEntry { key, value });
        self.len += 1;

        if self.load_factor() > MAX_LOAD_FACTOR {
            self.resize(next_prime(self.buckets.len() * 2));
        }
        Ok(None)
    }

    pub fn search(&self, key: &str) -> Option<&V> {
        if key.is_empty() {
            return None;
        }
        let bucket = hash(key, self.buckets.len());
        self.buckets[bucket]
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }

    pub fn search_mut(&mut self, key: &str) -> Option<&mut V> {
        if key.is_empty() {
            return None;
        }
        let bucket = hash(key, self.buckets.len());
        self.buckets[bucket]
            .iter_mut()
            .find(|e| e.key == key)
            .map(|e| &mut e.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.search(key).is_some()
    }

    /// Unlink `key` from its chain, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        if key.is_empty() {
            return None;
        }
        let bucket = hash(key, self.buckets.len());
        let chain = &mut self.buckets[bucket];
        let pos = chain.iter().position(|e| e.key == key)?;
        let entry = chain.remove(pos);
        self.len -= 1;
        Some(entry.value)
    }

    /// Drop every entry, keeping the current bucket count.
    pub fn clear(&mut self) {
        for chain in &mut self.buckets {
            chain.clear();
        }
        self.len = 0;
    }

    /// Iterate entries bucket by bucket, each chain in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.buckets
            .iter()
            .flatten()
            .map(|e| (e.key.as_str(), &e.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Rehash every entry into `new_bucket_count` buckets.
    ///
    /// Entries are moved bucket by bucket in chain order. Two keys from the
    /// same old chain keep their relative order if they land together.
    fn resize(&mut self, new_bucket_count: usize) {
        let old = std::mem::replace(&mut self.buckets, empty_buckets(new_bucket_count));
        let old_count = old.len();
        for entry in old.into_iter().flatten() {
            let bucket = hash(&entry.key, new_bucket_count);
            self.buckets[bucket].push(entry);
        }
        tracing::debug!(
            from = old_count,
            to = new_bucket_count,
            entries = self.len,
            "keyed index resized"
        );
    }
}

impl<V> Default for KeyedIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_buckets<V>(count: usize) -> Vec<Vec<HashEntry<V>>> {
    std::iter::repeat_with(Vec::new).take(count).collect()
}
