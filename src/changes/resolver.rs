//! Change resolution: scan, filter, limit, close over references, sort.

use super::cancel::CancellationFlag;
use super::request::ChangesRequest;
use crate::config::ResolverConfig;
use crate::entities::{CachedEntityStore, EntityStore, JsonNormalizer, Normalizer};
use crate::error::Result;
use crate::filters::{FilterContext, FilterRegistry, ReplicationFilter, UuidFilter};
use crate::references::ReferenceExpander;
use crate::sequence::SequenceLog;
use crate::taxonomy::{TermHierarchyIndex, TermLookup};
use crate::types::{ChangeRecord, Entity, Sequence, SequenceEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The `_changes` response document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangesFeed {
    pub results: Vec<ChangeRecord>,

    /// Cursor for the next request's `since`.
    pub last_seq: Sequence,

    /// Entries left out because of the limit.
    pub pending: usize,
}

/// Per-entry revision slots: `None` until a load was attempted.
type Revisions = [Option<Option<Entity>>];

/// Records collected so far, one per uuid.
#[derive(Default)]
struct Collected {
    records: Vec<ChangeRecord>,
    positions: HashMap<String, usize>,
}

impl Collected {
    fn contains(&self, uuid: &str) -> bool {
        self.positions.contains_key(uuid)
    }

    /// Insert or overwrite the record for its uuid. Returns true if the uuid is new.
    fn upsert(&mut self, record: ChangeRecord) -> bool {
        match self.positions.get(&record.id) {
            Some(&position) => {
                self.records[position] = record;
                false
            }
            None => {
                self.positions.insert(record.id.clone(), self.records.len());
                self.records.push(record);
                true
            }
        }
    }

    /// Ascending by seq; records without seq keep their order after all others.
    fn into_sorted(mut self) -> Vec<ChangeRecord> {
        self.records
            .sort_by_key(|r| r.seq.map_or((1, 0), |seq| (0, seq.0)));
        self.records
    }
}

/// Produces the resolved changes feed.
pub struct ChangeResolver {
    log: Arc<dyn SequenceLog>,
    store: Arc<dyn EntityStore>,
    terms: Arc<dyn TermLookup>,
    normalizer: Arc<dyn Normalizer>,
    filters: FilterRegistry,
    config: ResolverConfig,
    expander: ReferenceExpander,
}

impl ChangeResolver {
    /// Create a resolver with the built-in filters and the JSON normalizer.
    pub fn new(
        log: Arc<dyn SequenceLog>,
        store: Arc<dyn EntityStore>,
        terms: Arc<dyn TermLookup>,
    ) -> Self {
        let config = ResolverConfig::default();
        let expander = ReferenceExpander::new(Arc::clone(&store), config.excluded_fields.clone());

        Self {
            log,
            store,
            terms,
            normalizer: Arc::new(JsonNormalizer),
            filters: FilterRegistry::with_builtin(),
            config,
            expander,
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self.rebuild_expander();
        self
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = filters;
        self
    }

    /// Put an LRU revision cache of `config.revision_cache_size` in front of the store.
    pub fn with_revision_cache(mut self) -> Self {
        let cached = CachedEntityStore::new(
            Arc::clone(&self.store),
            self.config.revision_cache_size,
        );
        self.store = Arc::new(cached);
        self.rebuild_expander();
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    fn rebuild_expander(&mut self) {
        self.expander = ReferenceExpander::new(
            Arc::clone(&self.store),
            self.config.excluded_fields.clone(),
        );
    }

    /// Resolve the ordered change records of a request.
    pub fn resolve(&self, request: &ChangesRequest) -> Result<Vec<ChangeRecord>> {
        self.resolve_feed(request).map(|feed| feed.results)
    }

    /// Resolve a request into a full feed document.
    pub fn resolve_feed(&self, request: &ChangesRequest) -> Result<ChangesFeed> {
        let workspace = request.workspace.as_str();
        let since = request.since;
        let cancel = request.cancel.clone().unwrap_or_default();

        // Term closures are cached for this request only.
        let terms = TermHierarchyIndex::new(Arc::clone(&self.terms));
        let filter = self.build_filter(request, &terms)?;

        let sequences = self.log.range(workspace, since, request.stop)?;
        let range_end = sequences.last().map(|e| e.seq);

        let entries: Vec<SequenceEntry> = sequences
            .into_iter()
            .filter(|e| !e.local && !e.is_stub)
            .filter(|e| since.is_unbounded() || e.seq != since)
            .collect();

        let mut revisions: Vec<Option<Option<Entity>>> = vec![None; entries.len()];
        if request.include_docs || filter.is_some() {
            for (index, entry) in entries.iter().enumerate() {
                cancel.check()?;
                revisions[index] = Some(self.load_revision(entry, workspace));
            }
        }

        let mut collected = Collected::default();
        let mut accepted: Vec<usize> = Vec::new();
        let mut emitted = 0usize;
        let mut pending = 0usize;
        let mut first_skipped: Option<Sequence> = None;

        for (index, entry) in entries.iter().enumerate() {
            cancel.check()?;

            if let Some(filter) = &filter {
                match &revisions[index] {
                    Some(Some(revision)) if filter.filter(revision) => {}
                    _ => continue,
                }
            }

            let known = collected.contains(&entry.entity_uuid);
            if !known && request.limit > 0 && emitted >= request.limit {
                pending += 1;
                first_skipped.get_or_insert(entry.seq);
                continue;
            }

            let revision = revisions[index].as_ref().and_then(Option::as_ref);
            let doc = self.document(request, revision)?;
            if collected.upsert(ChangeRecord::from_entry(entry).with_doc(doc)) {
                emitted += 1;
            }
            accepted.push(index);
        }

        let primary = collected.records.len();
        self.close_references(
            request,
            &entries,
            &mut revisions,
            &accepted,
            &mut collected,
            &cancel,
        )?;

        let last_seq = match first_skipped {
            Some(seq) => Sequence(seq.0.saturating_sub(1)),
            None => range_end.unwrap_or(since),
        };

        debug!(
            workspace,
            since = since.0,
            entries = entries.len(),
            primary,
            referenced = collected.records.len() - primary,
            pending,
            filter = filter.as_ref().map_or("none", |f| f.id()),
            "resolved changes"
        );

        Ok(ChangesFeed {
            results: collected.into_sorted(),
            last_seq,
            pending,
        })
    }

    /// Add every entity referenced by the accepted entries.
    ///
    /// Referenced entities bypass the filter and the limit. Their record comes
    /// from their latest entry in the range when there is one, otherwise it is
    /// synthesized from the entity without a seq.
    fn close_references(
        &self,
        request: &ChangesRequest,
        entries: &[SequenceEntry],
        revisions: &mut Revisions,
        accepted: &[usize],
        collected: &mut Collected,
        cancel: &CancellationFlag,
    ) -> Result<()> {
        let workspace = request.workspace.as_str();

        let mut by_uuid: HashMap<&str, usize> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            by_uuid.insert(entry.entity_uuid.as_str(), index);
        }

        for &root_index in accepted {
            cancel.check()?;

            let Some(root) = self
                .revision_at(revisions, entries, root_index, workspace)
                .cloned()
            else {
                continue;
            };
            if !root.fieldable {
                continue;
            }

            for referenced in self.expander.expand(&root, workspace) {
                if collected.contains(&referenced.uuid) {
                    continue;
                }

                let record = match by_uuid.get(referenced.uuid.as_str()) {
                    Some(&index) => {
                        let revision = if request.include_docs {
                            self.revision_at(revisions, entries, index, workspace)
                        } else {
                            None
                        };
                        let doc = self.document(request, revision)?;
                        ChangeRecord::from_entry(&entries[index]).with_doc(doc)
                    }
                    None => {
                        let doc = self.document(request, Some(&referenced))?;
                        ChangeRecord::from_entity(&referenced).with_doc(doc)
                    }
                };
                collected.upsert(record);
            }
        }

        Ok(())
    }

    fn build_filter(
        &self,
        request: &ChangesRequest,
        terms: &TermHierarchyIndex,
    ) -> Result<Option<Box<dyn ReplicationFilter>>> {
        let ctx = FilterContext {
            terms,
            config: &self.config,
        };

        match request.filter.as_deref() {
            Some(id) if !id.is_empty() => self
                .filters
                .create(id, &request.parameters, &ctx)
                .map(Some),
            _ if request.parameters.contains("uuids") => self
                .filters
                .create(UuidFilter::ID, &request.parameters, &ctx)
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Revision of `entries[index]`, loading it on first use only.
    fn revision_at<'r>(
        &self,
        revisions: &'r mut Revisions,
        entries: &[SequenceEntry],
        index: usize,
        workspace: &str,
    ) -> Option<&'r Entity> {
        revisions[index]
            .get_or_insert_with(|| self.load_revision(&entries[index], workspace))
            .as_ref()
    }

    /// Load the revision of an entry. Failures count as absent.
    fn load_revision(&self, entry: &SequenceEntry, workspace: &str) -> Option<Entity> {
        match self
            .store
            .load_revision_in(&entry.entity_type, &entry.revision_id, workspace)
        {
            Ok(revision) => revision,
            Err(e) => {
                warn!(
                    seq = entry.seq.0,
                    entity = %entry.entity_key(),
                    revision = %entry.revision_id,
                    error = %e,
                    "revision load failed, treating entry as absent"
                );
                None
            }
        }
    }

    fn document(
        &self,
        request: &ChangesRequest,
        revision: Option<&Entity>,
    ) -> Result<Option<serde_json::Value>> {
        match revision {
            Some(revision) if request.include_docs => {
                self.normalizer.normalize(revision).map(Some)
            }
            _ => Ok(None),
        }
    }
}
