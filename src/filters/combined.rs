//! Combined filter: unconditional types plus term-filtered types.

use super::{
    close_term_sets, references_term_in, FilterContext, FilterParameters, ReplicationFilter,
    TypeBundleFilter,
};
use crate::error::Result;
use crate::taxonomy::TermSet;
use crate::types::Entity;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Two allow-lists over `"{type}.{bundle}"`.
///
/// Entities matching `types` always pass. Entities matching `filtered_types`
/// pass when at least one field configured under `filter["{type}:{bundle}"]`
/// references a configured term or a descendant of one. A type with no field
/// configuration passes unconditionally. Empty or absent fields never match
/// on their own but do not fail the entity either.
#[derive(Clone, Debug)]
pub struct CombinedFilter {
    unconditional: TypeBundleFilter,
    conditional: TypeBundleFilter,
    /// `"{type}:{bundle}"` -> (field, closed terms).
    field_terms: HashMap<String, Vec<(String, Arc<TermSet>)>>,
    term_type: String,
}

impl CombinedFilter {
    pub const ID: &'static str = "contentpool";

    /// Build from `types`, `filtered_types` and `filter`.
    pub fn from_parameters(params: &FilterParameters, ctx: &FilterContext<'_>) -> Result<Self> {
        let unconditional = TypeBundleFilter::new(params.string_list("types")?);
        let conditional = TypeBundleFilter::new(params.string_list("filtered_types")?);

        let mut sets = Vec::new();
        for (type_bundle, fields) in params.field_terms("filter")? {
            for (field, uuids) in fields {
                sets.push(((type_bundle.clone(), field), uuids));
            }
        }

        let mut field_terms: HashMap<String, Vec<(String, Arc<TermSet>)>> = HashMap::new();
        for ((type_bundle, field), terms) in close_term_sets(ctx.terms, sets)? {
            field_terms
                .entry(type_bundle)
                .or_default()
                .push((field, terms));
        }

        Ok(Self {
            unconditional,
            conditional,
            field_terms,
            term_type: ctx.config.term_entity_type.clone(),
        })
    }

    fn matches_fields(&self, entity: &Entity) -> bool {
        let key = format!("{}:{}", entity.entity_type, entity.bundle);
        match self.field_terms.get(&key) {
            None => true,
            Some(fields) if fields.is_empty() => true,
            Some(fields) => fields
                .iter()
                .any(|(field, terms)| references_term_in(entity, field, &self.term_type, terms)),
        }
    }
}

impl ReplicationFilter for CombinedFilter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn filter(&self, entity: &Entity) -> bool {
        if self.unconditional.matches(entity) {
            return true;
        }
        if !self.conditional.matches(entity) {
            return false;
        }

        let matched = self.matches_fields(entity);
        trace!(entity = %entity.key(), matched, "contentpool filter");
        matched
    }
}
