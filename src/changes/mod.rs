//! Resolved changes feed.
//!
//! [`ChangeResolver`] scans a range of the sequence log, filters it, applies
//! the limit, and then adds every entity the accepted entries reference,
//! directly or transitively. The result holds one record per uuid, ordered by
//! sequence, with reference-only records last.

mod cancel;
mod request;
mod resolver;

pub use cancel::CancellationFlag;
pub use request::ChangesRequest;
pub use resolver::{ChangeResolver, ChangesFeed};
