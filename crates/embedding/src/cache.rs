//! In-process text → vector cache.
//!
//! Query terms repeat heavily ("red dress" comes up a lot); a small LRU in
//! front of the hosted API removes the most common calls entirely.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::types::Embedding;

pub(crate) struct EmbeddingCache {
    entries: Mutex<LruCache<String, Embedding>>,
}

impl fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingCache").finish_non_exhaustive()
    }
}

impl EmbeddingCache {
    /// Returns `None` when `size` is zero, which disables caching.
    pub(crate) fn new(size: usize) -> Option<Self> {
        NonZeroUsize::new(size).map(|size| Self {
            entries: Mutex::new(LruCache::new(size)),
        })
    }

    pub(crate) fn get(&self, text: &str) -> Option<Embedding> {
        self.entries
            .lock()
            .expect("embedding cache lock poisoned")
            .get(text)
            .cloned()
    }

    pub(crate) fn put(&self, text: &str, embedding: Embedding) {
        self.entries
            .lock()
            .expect("embedding cache lock poisoned")
            .put(text.to_string(), embedding);
    }
}
