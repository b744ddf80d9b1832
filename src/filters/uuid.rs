//! Filter by explicit entity uuids.

use super::{FilterContext, FilterParameters, ReplicationFilter};
use crate::error::Result;
use crate::types::Entity;
use std::collections::HashSet;

/// Matches entities whose uuid is allow-listed.
#[derive(Clone, Debug)]
pub struct UuidFilter {
    uuids: HashSet<String>,
}

impl UuidFilter {
    pub const ID: &'static str = "uuid";

    pub fn new<I, S>(uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uuids: uuids.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from the `uuids` parameter.
    pub fn from_parameters(params: &FilterParameters, _ctx: &FilterContext<'_>) -> Result<Self> {
        Ok(Self::new(params.string_list("uuids")?))
    }
}

impl ReplicationFilter for UuidFilter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn filter(&self, entity: &Entity) -> bool {
        self.uuids.contains(&entity.uuid)
    }
}
