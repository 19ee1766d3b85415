// FILE: crates/media-engine/src/resource.rs
//! Session-scoped audio resources
//!
//! Fetched chapter bytes are wrapped in an [`AudioHandle`] before they are
//! bound to the output device. A handle is released exactly once, either
//! explicitly through [`ResourceRegistry::release`] or when it is dropped, so
//! teardown paths cannot leak it.

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of one handle; never reused within a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "blob:dreamfm/{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Counters {
    next_id: AtomicU64,
    created: AtomicU64,
    released: AtomicU64,
}

/// Creates audio handles and keeps create/release accounting
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    counters: Arc<Counters>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps fetched bytes in a new live handle
    pub fn create(&self, bytes: Bytes) -> AudioHandle {
        let id = HandleId(self.counters.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.counters.created.fetch_add(1, Ordering::Relaxed);
        log::debug!("Created {} ({} bytes)", id, bytes.len());

        AudioHandle {
            id,
            bytes,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Releases a handle now
    pub fn release(&self, handle: AudioHandle) {
        drop(handle);
    }

    /// Handles created and not yet released
    pub fn live_count(&self) -> u64 {
        self.created_count() - self.released_count()
    }

    pub fn created_count(&self) -> u64 {
        self.counters.created.load(Ordering::Relaxed)
    }

    pub fn released_count(&self) -> u64 {
        self.counters.released.load(Ordering::Relaxed)
    }
}

/// Exclusively owned chapter audio, live until dropped
#[derive(Debug)]
pub struct AudioHandle {
    id: HandleId,
    bytes: Bytes,
    counters: Arc<Counters>,
}

impl AudioHandle {
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The audio payload; cloning it is cheap and does not extend the handle
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for AudioHandle {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::Relaxed);
        log::debug!("Released {}", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_release() {
        let registry = ResourceRegistry::new();
        let handle = registry.create(Bytes::from_static(b"abc"));
        assert_eq!(registry.live_count(), 1);
        assert_eq!(handle.len(), 3);

        registry.release(handle);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.created_count(), 1);
        assert_eq!(registry.released_count(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let registry = ResourceRegistry::new();
        {
            let _handle = registry.create(Bytes::new());
            assert_eq!(registry.live_count(), 1);
        }
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = ResourceRegistry::new();
        let a = registry.create(Bytes::new());
        let b = registry.create(Bytes::new());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().to_string(), "blob:dreamfm/1");
    }

    #[test]
    fn test_clones_share_accounting() {
        let registry = ResourceRegistry::new();
        let observer = registry.clone();
        let handle = registry.create(Bytes::new());
        assert_eq!(observer.live_count(), 1);
        drop(handle);
        assert_eq!(observer.live_count(), 0);
    }
}
