//! LRU cache in front of an entity store.

use super::store::EntityStore;
use crate::error::Result;
use crate::types::{Entity, EntityKey};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Cache key: (scope, type, revision id).
type RevisionKey = (Option<String>, String, String);

/// Memoizes revision loads of an inner store.
///
/// Revisions are immutable, so a cached revision never goes stale. Misses and
/// failures are not cached. Current-revision loads always go to the inner store.
pub struct CachedEntityStore<S> {
    inner: S,
    revisions: Mutex<LruCache<RevisionKey, Entity>>,
}

impl<S: EntityStore> CachedEntityStore<S> {
    /// Wrap a store with a cache holding up to `capacity` revisions.
    pub fn new(inner: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            inner,
            revisions: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of cached revisions.
    pub fn cached(&self) -> usize {
        self.revisions.lock().len()
    }
}

impl<S: EntityStore> EntityStore for CachedEntityStore<S> {
    fn load_revision(
        &self,
        entity_type: &str,
        revision_id: &str,
        workspace: Option<&str>,
    ) -> Result<Option<Entity>> {
        let key = (
            workspace.map(str::to_string),
            entity_type.to_string(),
            revision_id.to_string(),
        );

        if let Some(entity) = self.revisions.lock().get(&key) {
            return Ok(Some(entity.clone()));
        }

        let loaded = self
            .inner
            .load_revision(entity_type, revision_id, workspace)?;
        if let Some(ref entity) = loaded {
            self.revisions.lock().put(key, entity.clone());
        }
        Ok(loaded)
    }

    fn load(&self, key: &EntityKey, workspace: Option<&str>) -> Result<Option<Entity>> {
        self.inner.load(key, workspace)
    }
}
