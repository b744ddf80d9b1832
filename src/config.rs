//! Resolver configuration.

use serde::Deserialize;

/// Fields that hold structural pointers rather than content relations.
pub const DEFAULT_EXCLUDED_FIELDS: &[&str] = &[
    "type",
    "bundle",
    "uid",
    "revision_uid",
    "revision_id",
    "parent",
    "workspace",
    "_deleted",
];

/// Resolver configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Reference fields never followed during closure.
    pub excluded_fields: Vec<String>,

    /// Entity type of taxonomy terms; term filters ignore references to any other type.
    pub term_entity_type: String,

    /// Term reference field checked by the channel filter.
    pub channel_field: String,

    /// Term reference field checked by the topic part of the channel filter.
    pub topic_field: String,

    /// Revision cache size (number of revisions) for `CachedEntityStore`.
    pub revision_cache_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            excluded_fields: DEFAULT_EXCLUDED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            term_entity_type: "taxonomy_term".to_string(),
            channel_field: "field_channel".to_string(),
            topic_field: "field_topics".to_string(),
            revision_cache_size: 1000,
        }
    }
}
