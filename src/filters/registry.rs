//! Filter registry: builds filters by id.

use super::{
    ChannelTopicFilter, CombinedFilter, FilterContext, FilterParameters, ReplicationFilter,
    TypeBundleFilter, UuidFilter,
};
use crate::error::{FeedError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a filter from request parameters.
pub type FilterFactory = Arc<
    dyn Fn(&FilterParameters, &FilterContext<'_>) -> Result<Box<dyn ReplicationFilter>>
        + Send
        + Sync,
>;

/// Maps filter ids to factories.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    factories: HashMap<String, FilterFactory>,
}

impl FilterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in filters.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(TypeBundleFilter::ID, |params, ctx| {
            Ok(Box::new(TypeBundleFilter::from_parameters(params, ctx)?))
        });
        registry.register(UuidFilter::ID, |params, ctx| {
            Ok(Box::new(UuidFilter::from_parameters(params, ctx)?))
        });
        registry.register(ChannelTopicFilter::ID, |params, ctx| {
            Ok(Box::new(ChannelTopicFilter::from_parameters(params, ctx)?))
        });
        registry.register(CombinedFilter::ID, |params, ctx| {
            Ok(Box::new(CombinedFilter::from_parameters(params, ctx)?))
        });
        registry
    }

    /// Register a factory, replacing any factory with the same id.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&FilterParameters, &FilterContext<'_>) -> Result<Box<dyn ReplicationFilter>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(id.into(), Arc::new(factory));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Build the filter registered under `id`.
    pub fn create(
        &self,
        id: &str,
        params: &FilterParameters,
        ctx: &FilterContext<'_>,
    ) -> Result<Box<dyn ReplicationFilter>> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| FeedError::UnknownFilter(id.to_string()))?;
        factory(params, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::filters::testing;
    use crate::types::Entity;
    use serde_json::json;

    struct DenyAll;

    impl ReplicationFilter for DenyAll {
        fn id(&self) -> &str {
            "deny_all"
        }

        fn filter(&self, _entity: &Entity) -> bool {
            false
        }
    }

    #[test]
    fn test_builtin_ids() {
        let registry = FilterRegistry::with_builtin();
        assert_eq!(
            registry.ids(),
            vec!["contentpool", "contentpool_channels", "entity_type", "uuid"]
        );
    }

    #[test]
    fn test_create_builtin() {
        let registry = FilterRegistry::with_builtin();
        let index = testing::index();
        let config = ResolverConfig::default();
        let ctx = FilterContext {
            terms: &index,
            config: &config,
        };
        let params = FilterParameters::new().with("types", json!(["node.article"]));

        let filter = registry.create("entity_type", &params, &ctx).unwrap();
        assert_eq!(filter.id(), "entity_type");
        assert!(filter.filter(&testing::article("1")));
    }

    #[test]
    fn test_unknown_filter() {
        let registry = FilterRegistry::with_builtin();
        let index = testing::index();
        let config = ResolverConfig::default();
        let ctx = FilterContext {
            terms: &index,
            config: &config,
        };

        let err = registry
            .create("published", &FilterParameters::new(), &ctx)
            .err()
            .unwrap();
        assert!(matches!(err, FeedError::UnknownFilter(ref id) if id == "published"));
    }

    #[test]
    fn test_register_custom_filter() {
        let mut registry = FilterRegistry::new();
        registry.register("deny_all", |_params, _ctx| Ok(Box::new(DenyAll)));
        assert!(registry.contains("deny_all"));
        assert!(!registry.contains("uuid"));

        let index = testing::index();
        let config = ResolverConfig::default();
        let ctx = FilterContext {
            terms: &index,
            config: &config,
        };
        let filter = registry
            .create("deny_all", &FilterParameters::new(), &ctx)
            .unwrap();
        assert!(!filter.filter(&testing::article("1")));
    }
}
