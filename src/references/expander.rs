//! Transitive discovery of referenced content entities.

use crate::entities::EntityStore;
use crate::types::{Entity, EntityKey};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{trace, warn};

/// Entities discovered by an expansion, in discovery order.
#[derive(Clone, Debug, Default)]
pub struct ReferenceSet {
    entities: Vec<Entity>,
}

impl ReferenceSet {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entities.iter().any(|e| &e.key() == key)
    }

    /// Discovered entities grouped by entity type.
    pub fn by_type(&self) -> BTreeMap<&str, Vec<&Entity>> {
        let mut grouped: BTreeMap<&str, Vec<&Entity>> = BTreeMap::new();
        for entity in &self.entities {
            grouped
                .entry(entity.entity_type.as_str())
                .or_default()
                .push(entity);
        }
        grouped
    }
}

impl IntoIterator for ReferenceSet {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

/// Walks reference fields of content entities.
pub struct ReferenceExpander {
    store: Arc<dyn EntityStore>,
    excluded_fields: HashSet<String>,
}

impl ReferenceExpander {
    pub fn new<I, S>(store: Arc<dyn EntityStore>, excluded_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            store,
            excluded_fields: excluded_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Discover every fieldable entity transitively referenced by `root`.
    ///
    /// Each (type, id) is visited at most once, the root included, so cyclic
    /// reference graphs terminate. Targets that fail to load, or are not
    /// fieldable, are skipped.
    pub fn expand(&self, root: &Entity, workspace: &str) -> ReferenceSet {
        let mut found = ReferenceSet::default();
        if !root.fieldable {
            return found;
        }

        let mut visited: HashSet<EntityKey> = HashSet::new();
        visited.insert(root.key());

        let mut stack: Vec<Entity> = vec![root.clone()];
        while let Some(entity) = stack.pop() {
            for (field, items) in &entity.fields {
                if self.excluded_fields.contains(field) {
                    continue;
                }

                for target in items.iter().filter_map(|item| item.target()) {
                    if !visited.insert(target.clone()) {
                        continue;
                    }

                    let referenced = match self.store.load_in(&target, workspace) {
                        Ok(Some(referenced)) => referenced,
                        Ok(None) => {
                            trace!(%target, "referenced entity not found");
                            continue;
                        }
                        Err(e) => {
                            warn!(%target, error = %e, "failed to load referenced entity");
                            continue;
                        }
                    };

                    if !referenced.fieldable {
                        continue;
                    }

                    found.entities.push(referenced.clone());
                    stack.push(referenced);
                }
            }
        }

        found
    }
}
