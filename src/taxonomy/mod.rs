//! Taxonomy term hierarchy.
//!
//! Filters configure term sets by uuid. [`TermHierarchyIndex`] resolves those
//! uuids and closes them over the descendant relation, so that a filter on a
//! term also accepts every narrower term below it.

mod hierarchy;
mod lookup;

pub use hierarchy::{TermHierarchyIndex, TermSet};
pub use lookup::{MemoryTaxonomy, TermLookup};
