//! Entity store trait and in-memory implementation.

use crate::error::{FeedError, Result};
use crate::types::{rev_generation, rev_token, Entity, EntityKey};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Loads entity revisions.
///
/// `workspace == None` addresses the unscoped partition (entities shared by
/// all workspaces, such as taxonomy terms).
pub trait EntityStore: Send + Sync {
    /// Load a specific revision of an entity.
    fn load_revision(
        &self,
        entity_type: &str,
        revision_id: &str,
        workspace: Option<&str>,
    ) -> Result<Option<Entity>>;

    /// Load the current revision of an entity.
    fn load(&self, key: &EntityKey, workspace: Option<&str>) -> Result<Option<Entity>>;

    /// Load a revision scoped to `workspace`, falling back to the unscoped partition.
    fn load_revision_in(
        &self,
        entity_type: &str,
        revision_id: &str,
        workspace: &str,
    ) -> Result<Option<Entity>> {
        match self.load_revision(entity_type, revision_id, Some(workspace))? {
            Some(entity) => Ok(Some(entity)),
            None => self.load_revision(entity_type, revision_id, None),
        }
    }

    /// Load the current revision scoped to `workspace`, falling back to the unscoped partition.
    fn load_in(&self, key: &EntityKey, workspace: &str) -> Result<Option<Entity>> {
        match self.load(key, Some(workspace))? {
            Some(entity) => Ok(Some(entity)),
            None => self.load(key, None),
        }
    }
}

impl<S: EntityStore + ?Sized> EntityStore for Arc<S> {
    fn load_revision(
        &self,
        entity_type: &str,
        revision_id: &str,
        workspace: Option<&str>,
    ) -> Result<Option<Entity>> {
        (**self).load_revision(entity_type, revision_id, workspace)
    }

    fn load(&self, key: &EntityKey, workspace: Option<&str>) -> Result<Option<Entity>> {
        (**self).load(key, workspace)
    }
}

type Scope = Option<String>;

#[derive(Default)]
struct Inner {
    /// (scope, type, revision_id) -> revision.
    revisions: HashMap<(Scope, String, String), Entity>,
    /// (scope, entity) -> current revision id.
    current: HashMap<(Scope, EntityKey), String>,
    /// Revisions whose load always fails.
    failing: HashSet<(String, String)>,
    next_revision: u64,
}

/// In-memory entity store.
#[derive(Default)]
pub struct MemoryEntityStore {
    inner: RwLock<Inner>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a new revision of an entity.
    ///
    /// Assigns the revision id and the rev token; the generation continues
    /// from the entity's current revision in the same scope.
    pub fn save(&self, workspace: Option<&str>, mut entity: Entity) -> Result<Entity> {
        let content = serde_json::to_vec(&entity.fields)?;

        let mut inner = self.inner.write();
        let scope: Scope = workspace.map(str::to_string);

        inner.next_revision += 1;
        let revision_id = inner.next_revision.to_string();

        let previous = inner
            .current
            .get(&(scope.clone(), entity.key()))
            .and_then(|rid| {
                inner
                    .revisions
                    .get(&(scope.clone(), entity.entity_type.clone(), rid.clone()))
            })
            .map(|e| rev_generation(&e.rev))
            .unwrap_or(0);

        entity.revision_id = revision_id.clone();
        entity.rev = rev_token(previous + 1, &content);

        inner
            .current
            .insert((scope.clone(), entity.key()), revision_id.clone());
        inner.revisions.insert(
            (scope, entity.entity_type.clone(), revision_id),
            entity.clone(),
        );
        Ok(entity)
    }

    /// Make every load of a revision fail.
    pub fn fail_revision(&self, entity_type: &str, revision_id: &str) {
        self.inner
            .write()
            .failing
            .insert((entity_type.to_string(), revision_id.to_string()));
    }

    /// Number of stored revisions across all scopes.
    pub fn revision_count(&self) -> usize {
        self.inner.read().revisions.len()
    }
}

impl EntityStore for MemoryEntityStore {
    fn load_revision(
        &self,
        entity_type: &str,
        revision_id: &str,
        workspace: Option<&str>,
    ) -> Result<Option<Entity>> {
        let inner = self.inner.read();

        if inner
            .failing
            .contains(&(entity_type.to_string(), revision_id.to_string()))
        {
            return Err(FeedError::Load {
                entity_type: entity_type.to_string(),
                id: revision_id.to_string(),
                reason: "revision unavailable".to_string(),
            });
        }

        let key = (
            workspace.map(str::to_string),
            entity_type.to_string(),
            revision_id.to_string(),
        );
        Ok(inner.revisions.get(&key).cloned())
    }

    fn load(&self, key: &EntityKey, workspace: Option<&str>) -> Result<Option<Entity>> {
        let inner = self.inner.read();
        let scope: Scope = workspace.map(str::to_string);

        let Some(revision_id) = inner.current.get(&(scope.clone(), key.clone())) else {
            return Ok(None);
        };

        Ok(inner
            .revisions
            .get(&(scope, key.entity_type.clone(), revision_id.clone()))
            .cloned())
    }
}
