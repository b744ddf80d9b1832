//! Filter by type plus channel/topic terms.

use super::{
    close_term_sets, references_term_in, FilterContext, FilterParameters, ReplicationFilter,
    TypeBundleFilter,
};
use crate::error::Result;
use crate::taxonomy::TermSet;
use crate::types::Entity;
use std::sync::Arc;
use tracing::trace;

enum Slot {
    Channels,
    Topics,
}

/// A term reference field constrained to a closed term set.
#[derive(Clone, Debug)]
struct TermField {
    field: String,
    term_type: String,
    terms: Arc<TermSet>,
}

impl TermField {
    /// `None` when the entity has no reference in the field, otherwise whether one matches.
    fn check(&self, entity: &Entity) -> Option<bool> {
        if entity.references(&self.field).next().is_none() {
            return None;
        }
        Some(references_term_in(
            entity,
            &self.field,
            &self.term_type,
            &self.terms,
        ))
    }
}

/// Type/bundle allow-list, narrowed by the channel and topic of the entity.
///
/// An entity that passes the type match must, for each of the channel and
/// topic fields it carries, reference a configured term or one of its
/// descendants. An entity carrying neither field passes on its type alone.
/// An absent `channels` parameter is an empty channel set, so any entity
/// carrying a channel fails; an absent `topics` parameter leaves topics
/// unchecked.
#[derive(Clone, Debug)]
pub struct ChannelTopicFilter {
    base: TypeBundleFilter,
    channels: TermField,
    topics: Option<TermField>,
}

impl ChannelTopicFilter {
    pub const ID: &'static str = "contentpool_channels";

    /// Build from `types`, `channels` and `topics`.
    pub fn from_parameters(params: &FilterParameters, ctx: &FilterContext<'_>) -> Result<Self> {
        let base = TypeBundleFilter::from_parameters(params, ctx)?;

        let mut sets = Vec::new();
        if let Some(uuids) = params.optional_string_list("channels")? {
            sets.push((Slot::Channels, uuids));
        }
        if let Some(uuids) = params.optional_string_list("topics")? {
            sets.push((Slot::Topics, uuids));
        }

        let term_field = |field: &str, terms: Arc<TermSet>| TermField {
            field: field.to_string(),
            term_type: ctx.config.term_entity_type.clone(),
            terms,
        };

        let mut channels = term_field(ctx.config.channel_field.as_str(), Arc::default());
        let mut topics = None;
        for (slot, terms) in close_term_sets(ctx.terms, sets)? {
            match slot {
                Slot::Channels => channels = term_field(ctx.config.channel_field.as_str(), terms),
                Slot::Topics => topics = Some(term_field(ctx.config.topic_field.as_str(), terms)),
            }
        }

        Ok(Self {
            base,
            channels,
            topics,
        })
    }
}

impl ReplicationFilter for ChannelTopicFilter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn filter(&self, entity: &Entity) -> bool {
        if !self.base.matches(entity) {
            return false;
        }

        let matched = std::iter::once(&self.channels)
            .chain(self.topics.as_ref())
            .all(|field| field.check(entity).unwrap_or(true));

        trace!(entity = %entity.key(), matched, "channel filter");
        matched
    }
}
