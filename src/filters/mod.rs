//! Replication filters.
//!
//! A filter decides, per loaded revision, whether the entity is replicated.
//! Filters are built by id through the [`FilterRegistry`] from the request's
//! [`FilterParameters`]. Term sets are closed while the filter is built, so
//! configuration and validation errors surface before any entry is scanned
//! and [`ReplicationFilter::filter`] itself cannot fail.
//!
//! Built-in filters:
//!
//! - `entity_type`: allow-list of `"{type}.{bundle}"` ([`TypeBundleFilter`])
//! - `uuid`: allow-list of entity uuids ([`UuidFilter`])
//! - `contentpool_channels`: types plus channel/topic terms ([`ChannelTopicFilter`])
//! - `contentpool`: unconditional and term-filtered types ([`CombinedFilter`])

mod channel;
mod combined;
mod params;
mod registry;
mod type_bundle;
mod uuid;

pub use channel::ChannelTopicFilter;
pub use combined::CombinedFilter;
pub use params::{FieldTermMap, FilterParameters};
pub use registry::{FilterFactory, FilterRegistry};
pub use type_bundle::TypeBundleFilter;
pub use uuid::UuidFilter;

use crate::config::ResolverConfig;
use crate::error::{FeedError, Result};
use crate::taxonomy::{TermHierarchyIndex, TermSet};
use crate::types::Entity;
use std::sync::Arc;

/// Predicate deciding whether an entity is replicated.
pub trait ReplicationFilter: Send + Sync {
    /// Registry id of the filter.
    fn id(&self) -> &str;

    fn filter(&self, entity: &Entity) -> bool;
}

/// Request-scoped services available while building a filter.
pub struct FilterContext<'a> {
    pub terms: &'a TermHierarchyIndex,
    pub config: &'a ResolverConfig,
}

/// Close several uuid sets, reporting every unresolved uuid in one error.
pub(crate) fn close_term_sets<K>(
    terms: &TermHierarchyIndex,
    sets: Vec<(K, Vec<String>)>,
) -> Result<Vec<(K, Arc<TermSet>)>> {
    let mut closed = Vec::with_capacity(sets.len());
    let mut unresolved: Vec<String> = Vec::new();

    for (key, uuids) in sets {
        match terms.close(&uuids) {
            Ok(set) => closed.push((key, set)),
            Err(FeedError::UnresolvedTerms(missing)) => unresolved.extend(missing),
            Err(e) => return Err(e),
        }
    }

    if !unresolved.is_empty() {
        unresolved.sort();
        unresolved.dedup();
        return Err(FeedError::UnresolvedTerms(unresolved));
    }
    Ok(closed)
}

/// Whether any `term_type` entity referenced by `field` is in `set`.
pub(crate) fn references_term_in(
    entity: &Entity,
    field: &str,
    term_type: &str,
    set: &TermSet,
) -> bool {
    entity
        .references(field)
        .any(|target| target.entity_type == term_type && set.contains(&target.id))
}
