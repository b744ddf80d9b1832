//! Reference closure over entity graphs.

mod expander;

pub use expander::{ReferenceExpander, ReferenceSet};
