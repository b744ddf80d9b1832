//! Sequence log trait and in-memory implementation.

use crate::error::Result;
use crate::types::{Entity, Sequence, SequenceEntry};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Ordered store of sequence entries.
pub trait SequenceLog: Send + Sync {
    /// Entries of a workspace with `since <= seq <= stop`, ascending by seq.
    ///
    /// Both bounds are inclusive. A `stop` of zero means "to the end".
    fn range(&self, workspace: &str, since: Sequence, stop: Sequence)
        -> Result<Vec<SequenceEntry>>;
}

/// Per-workspace log state.
#[derive(Default)]
struct WorkspaceLog {
    entries: BTreeMap<Sequence, SequenceEntry>,
    head: Sequence,
}

/// In-memory sequence log.
#[derive(Default)]
pub struct MemorySequenceLog {
    workspaces: RwLock<HashMap<String, WorkspaceLog>>,
}

impl MemorySequenceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a revision of an entity, assigning the next sequence.
    pub fn record(&self, workspace: &str, entity: &Entity) -> SequenceEntry {
        let mut workspaces = self.workspaces.write();
        let log = workspaces.entry(workspace.to_string()).or_default();

        let seq = log.head.next();
        let entry = SequenceEntry::for_entity(seq, entity);
        log.entries.insert(seq, entry.clone());
        log.head = seq;
        entry
    }

    /// Insert an entry with a caller-assigned sequence.
    ///
    /// An existing entry with the same sequence is replaced.
    pub fn push(&self, workspace: &str, entry: SequenceEntry) {
        let mut workspaces = self.workspaces.write();
        let log = workspaces.entry(workspace.to_string()).or_default();

        log.head = log.head.max(entry.seq);
        log.entries.insert(entry.seq, entry);
    }

    /// Highest sequence recorded in a workspace.
    pub fn head(&self, workspace: &str) -> Sequence {
        self.workspaces
            .read()
            .get(workspace)
            .map(|log| log.head)
            .unwrap_or_default()
    }

    /// Number of entries in a workspace.
    pub fn len(&self, workspace: &str) -> usize {
        self.workspaces
            .read()
            .get(workspace)
            .map(|log| log.entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, workspace: &str) -> bool {
        self.len(workspace) == 0
    }
}

impl SequenceLog for MemorySequenceLog {
    fn range(
        &self,
        workspace: &str,
        since: Sequence,
        stop: Sequence,
    ) -> Result<Vec<SequenceEntry>> {
        let workspaces = self.workspaces.read();
        let Some(log) = workspaces.get(workspace) else {
            return Ok(Vec::new());
        };

        let entries = if stop.is_unbounded() {
            log.entries.range(since..).map(|(_, e)| e.clone()).collect()
        } else if stop < since {
            Vec::new()
        } else {
            log.entries
                .range(since..=stop)
                .map(|(_, e)| e.clone())
                .collect()
        };

        Ok(entries)
    }
}
