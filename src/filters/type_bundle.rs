//! Filter by entity type and bundle.

use super::{FilterContext, FilterParameters, ReplicationFilter};
use crate::error::Result;
use crate::types::Entity;
use tracing::trace;

/// Matches entities whose `"{type}.{bundle}"` is allow-listed.
///
/// Entries are prefixes on a separator boundary: `"node"` matches every node
/// bundle, `"node.article"` only articles. An empty allow-list matches nothing.
#[derive(Clone, Debug)]
pub struct TypeBundleFilter {
    /// Allow-list entries with a trailing separator.
    prefixes: Vec<String>,
}

impl TypeBundleFilter {
    pub const ID: &'static str = "entity_type";

    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: types
                .into_iter()
                .map(|t| format!("{}.", t.as_ref()))
                .collect(),
        }
    }

    /// Build from the `types` parameter.
    pub fn from_parameters(params: &FilterParameters, _ctx: &FilterContext<'_>) -> Result<Self> {
        Ok(Self::new(params.string_list("types")?))
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        let candidate = format!("{}.{}.", entity.entity_type, entity.bundle);
        self.prefixes.iter().any(|p| candidate.starts_with(p.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl ReplicationFilter for TypeBundleFilter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn filter(&self, entity: &Entity) -> bool {
        let matched = self.matches(entity);
        trace!(entity = %entity.key(), matched, "type filter");
        matched
    }
}
