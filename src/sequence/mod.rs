//! Sequence log access.
//!
//! The sequence log is the ordered index of entity mutations per workspace.
//! The resolver only reads ranges from it; [`MemorySequenceLog`] is an
//! in-process implementation used by embedders without a storage engine and
//! by the tests.

mod log;

pub use log::{MemorySequenceLog, SequenceLog};
