//! # Changefeed
//!
//! A resolved, CouchDB-style `_changes` feed over an append-only sequence log.
//!
//! ## Core Concepts
//!
//! - **Sequence log**: ordered entity mutations per workspace
//! - **Filters**: pluggable predicates choosing what a peer replicates
//! - **Term hierarchy**: filters on a taxonomy term also accept its descendants
//! - **Reference closure**: accepted entities pull in everything they reference
//!
//! ## Example
//!
//! ```ignore
//! use changefeed::{ChangeResolver, ChangesRequest, FilterParameters};
//! use serde_json::json;
//!
//! let resolver = ChangeResolver::new(log, store, taxonomy);
//!
//! let feed = resolver.resolve_feed(
//!     &ChangesRequest::new()
//!         .since(120)
//!         .limit(50)
//!         .filter("contentpool_channels")
//!         .parameters(
//!             FilterParameters::new()
//!                 .with("types", json!(["node.article"]))
//!                 .with("channels", json!({"5f84eca9-b623-46a7-8579-ca5532585823": true})),
//!         ),
//! )?;
//!
//! for change in &feed.results {
//!     println!("{:?} {}", change.seq, change.id);
//! }
//! ```

pub mod changes;
pub mod config;
pub mod entities;
pub mod error;
pub mod filters;
pub mod references;
pub mod sequence;
pub mod taxonomy;
pub mod types;

// Re-exports
pub use changes::{CancellationFlag, ChangeResolver, ChangesFeed, ChangesRequest};
pub use config::{ResolverConfig, DEFAULT_EXCLUDED_FIELDS};
pub use entities::{CachedEntityStore, EntityStore, JsonNormalizer, MemoryEntityStore, Normalizer};
pub use error::{FeedError, Result};
pub use filters::{
    ChannelTopicFilter, CombinedFilter, FieldTermMap, FilterContext, FilterFactory,
    FilterParameters, FilterRegistry, ReplicationFilter, TypeBundleFilter, UuidFilter,
};
pub use references::{ReferenceExpander, ReferenceSet};
pub use sequence::{MemorySequenceLog, SequenceLog};
pub use taxonomy::{MemoryTaxonomy, TermHierarchyIndex, TermLookup, TermSet};
pub use types::*;
