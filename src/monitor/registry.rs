//! Request deduplication.
//!
//! At most one availability monitor runs per playback rating key. The
//! registry only tracks keys; the monitor task owns everything else.

use dashmap::DashSet;
use std::sync::Arc;

pub trait RequestRegistry: Send + Sync {
    /// Mark `key` active. Returns `false` if a monitor already holds it.
    fn try_acquire(&self, key: &str) -> bool;

    /// Mark `key` inactive. Releasing an inactive key is a no-op.
    fn release(&self, key: &str);

    fn is_active(&self, key: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local registry backed by a concurrent set.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    active: DashSet<String>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestRegistry for InMemoryRegistry {
    fn try_acquire(&self, key: &str) -> bool {
        self.active.insert(key.to_string())
    }

    fn release(&self, key: &str) {
        if self.active.remove(key).is_some() {
            tracing::debug!(key, "Released request key");
        }
    }

    fn is_active(&self, key: &str) -> bool {
        self.active.contains(key)
    }

    fn len(&self) -> usize {
        self.active.len()
    }
}

/// Holds a registry key for as long as it lives.
///
/// Dropping the guard releases the key, whichever way the owning task ends,
/// including a panic inside a poll.
pub struct RegistryGuard {
    registry: Arc<dyn RequestRegistry>,
    key: String,
}

impl RegistryGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for RegistryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryGuard").field("key", &self.key).finish()
    }
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        self.registry.release(&self.key);
    }
}

/// Acquire `key`, returning a guard that releases it on drop.
pub fn acquire(registry: &Arc<dyn RequestRegistry>, key: &str) -> Option<RegistryGuard> {
    registry.try_acquire(key).then(|| RegistryGuard {
        registry: Arc::clone(registry),
        key: key.to_string(),
    })
}
