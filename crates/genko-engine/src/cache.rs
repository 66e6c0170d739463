//! Version-keyed result cache.
//!
//! Derived results (heading metrics, line spans, pages) are cached per
//! `(DocumentId, version)`. A newer version lazily replaces the stale entry
//! on the next insert; there is no eager sweep. The host signals document
//! close through [`VersionedCache::evict`].

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::buffer::DocumentId;

#[derive(Debug)]
pub struct VersionedCache<V> {
    entries: HashMap<DocumentId, (u64, V)>,
}

impl<V> Default for VersionedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> VersionedCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up a cached value; hits only on an exact version match.
    pub fn get(&self, id: DocumentId, version: u64) -> Option<&V> {
        match self.entries.get(&id) {
            Some((v, value)) if *v == version => Some(value),
            _ => None,
        }
    }

    /// Insert a value for the given version, displacing any older entry.
    pub fn insert(&mut self, id: DocumentId, version: u64, value: V) {
        self.entries.insert(id, (version, value));
    }

    /// Fetch the value for `(id, version)`, computing it on a miss.
    ///
    /// A stale entry for an older version is replaced, never returned.
    pub fn get_or_insert_with(
        &mut self,
        id: DocumentId,
        version: u64,
        f: impl FnOnce() -> V,
    ) -> &V {
        let entry = match self.entries.entry(id) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().0 != version {
                    occupied.insert((version, f()));
                }
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert((version, f())),
        };
        &entry.1
    }

    /// Mutable variant of [`get_or_insert_with`](Self::get_or_insert_with),
    /// for caches whose value accumulates (e.g. per-line maps).
    pub fn get_or_insert_with_mut(
        &mut self,
        id: DocumentId,
        version: u64,
        f: impl FnOnce() -> V,
    ) -> &mut V {
        let entry = match self.entries.entry(id) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().0 != version {
                    occupied.insert((version, f()));
                }
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert((version, f())),
        };
        &mut entry.1
    }

    /// Host-driven eviction hook, called when a document closes.
    pub fn evict(&mut self, id: DocumentId) -> Option<V> {
        self.entries.remove(&id).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
