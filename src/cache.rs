//! Memoization for registry round trips
//!
//! A [`MemoCache`] maps a deterministic string key to the result of an
//! earlier successful call. Only `Ok` results are ever stored, so a failed
//! call leaves no entry behind and the next call with the same key retries
//! the real operation. There is no expiry and no size bound: the key space
//! (schema ids and subject names) is small and process-lifetime memoization
//! is the point.
//!
//! Concurrent misses on one key are not deduplicated; each performs its own
//! underlying call and the last success wins. The maps are lock-protected so
//! the cache is safe from multithreaded runtimes.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Builder for composite cache keys: `<op>__<segment>__...`.
///
/// Primitive segments (subjects, ids) go in verbatim; structured segments
/// should be added through [`KeyBuilder::push_hashed`] so equivalent values
/// produce equal keys regardless of formatting.
#[derive(Debug)]
pub struct KeyBuilder {
    key: String,
}

impl KeyBuilder {
    pub fn new(op: &str) -> Self {
        Self {
            key: op.to_string(),
        }
    }

    /// Append a primitive segment, stringified directly.
    pub fn push(mut self, segment: impl std::fmt::Display) -> Self {
        self.key.push_str("__");
        self.key.push_str(&segment.to_string());
        self
    }

    /// Append a structured segment as a content hash over its serialized form.
    pub fn push_hashed<T: Serialize>(self, value: &T) -> Self {
        let digest = fingerprint(value);
        self.push(digest)
    }

    pub fn build(self) -> String {
        self.key
    }
}

/// SHA-256 digest over a value's JSON serialization, hex-encoded.
pub fn fingerprint<T: Serialize>(value: &T) -> String {
    let serialized = serde_json::to_string(value).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize schema text by parsing and re-serializing, so whitespace
/// variants of one schema share a fingerprint. Non-JSON schema text (e.g.
/// protobuf definitions) is returned unchanged.
pub fn normalize_json(text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|_| text.to_string()),
        Err(_) => text.to_string(),
    }
}

/// String-keyed memoization of successful call results.
pub struct MemoCache<V> {
    entries: RwLock<HashMap<String, V>>,
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Remove one entry.
    pub fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<V: Clone> MemoCache<V> {
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    pub fn insert(&self, key: String, value: V) {
        self.entries.write().insert(key, value);
    }

    /// Return the memoized result for `key`, or run `call` and memoize its
    /// result on success. A failure is propagated without being stored.
    pub async fn get_or_try_insert<F, Fut>(&self, key: &str, call: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(hit) = self.get(key) {
            tracing::trace!(key, "cache hit");
            return Ok(hit);
        }
        let value = call().await?;
        self.insert(key.to_string(), value.clone());
        Ok(value)
    }
}
