//! Changes request parameters.

use super::cancel::CancellationFlag;
use crate::filters::FilterParameters;
use crate::types::{Sequence, DEFAULT_WORKSPACE};
use serde::Deserialize;

/// Parameters of one changes request.
///
/// Deserializes from the `_changes` query names; absent keys take defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChangesRequest {
    pub workspace: String,

    /// Exclusive lower bound (0 = from the start).
    pub since: Sequence,

    /// Inclusive upper bound (0 = to the end).
    pub stop: Sequence,

    /// Max distinct uuids taken from the log range (0 = unbounded).
    pub limit: usize,

    pub include_docs: bool,

    /// Registry id of the filter.
    pub filter: Option<String>,

    pub parameters: FilterParameters,

    #[serde(skip)]
    pub cancel: Option<CancellationFlag>,
}

impl Default for ChangesRequest {
    fn default() -> Self {
        Self {
            workspace: DEFAULT_WORKSPACE.to_string(),
            since: Sequence(0),
            stop: Sequence(0),
            limit: 0,
            include_docs: false,
            filter: None,
            parameters: FilterParameters::default(),
            cancel: None,
        }
    }
}

impl ChangesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = workspace.into();
        self
    }

    pub fn since(mut self, since: u64) -> Self {
        self.since = Sequence(since);
        self
    }

    pub fn stop(mut self, stop: u64) -> Self {
        self.stop = Sequence(stop);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn include_docs(mut self, include_docs: bool) -> Self {
        self.include_docs = include_docs;
        self
    }

    pub fn filter(mut self, id: impl Into<String>) -> Self {
        self.filter = Some(id.into());
        self
    }

    pub fn parameters(mut self, parameters: FilterParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn cancel_with(mut self, flag: CancellationFlag) -> Self {
        self.cancel = Some(flag);
        self
    }
}
