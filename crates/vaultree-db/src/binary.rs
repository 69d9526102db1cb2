//! Content-deduplicated attachment pool
//!
//! Entries reference attachment blobs by integer handle; the pool owns the
//! bytes. Putting identical content twice yields the same handle, so a
//! database with one certificate attached to fifty entries stores it once.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinaryPool {
    blobs: BTreeMap<u32, Vec<u8>>,
}

impl BinaryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob, deduplicating by content. Returns its handle.
    pub fn put(&mut self, data: Vec<u8>) -> u32 {
        if let Some(handle) = self.find(&data) {
            return handle;
        }
        let handle = self.blobs.keys().next_back().map_or(0, |k| k + 1);
        self.blobs.insert(handle, data);
        handle
    }

    pub fn get(&self, handle: u32) -> Option<&[u8]> {
        self.blobs.get(&handle).map(Vec::as_slice)
    }

    /// Handle of an existing blob with exactly this content.
    pub fn find(&self, data: &[u8]) -> Option<u32> {
        self.blobs
            .iter()
            .find(|(_, blob)| blob.as_slice() == data)
            .map(|(handle, _)| *handle)
    }

    /// Drop every blob whose handle is not in `live`. Returns how many were
    /// removed. Callers collect `live` from entry attachment maps (history
    /// included).
    pub fn remove_unused(&mut self, live: &HashSet<u32>) -> usize {
        let before = self.blobs.len();
        self.blobs.retain(|handle, _| live.contains(handle));
        before - self.blobs.len()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.blobs.iter().map(|(h, b)| (*h, b.as_slice()))
    }
}
