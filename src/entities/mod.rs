//! Entity revision access.
//!
//! Revisions are loaded through the [`EntityStore`] trait, scoped to a
//! workspace first and unscoped second. [`CachedEntityStore`] memoizes
//! revision loads, and [`Normalizer`] turns a revision into the document
//! embedded in the feed.

mod cache;
mod normalize;
mod store;

pub use cache::CachedEntityStore;
pub use normalize::{JsonNormalizer, Normalizer};
pub use store::{EntityStore, MemoryEntityStore};
