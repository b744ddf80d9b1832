//! Descendant closure of term sets.

use super::lookup::TermLookup;
use crate::error::{FeedError, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Term ids closed under "is descendant of".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermSet {
    ids: HashSet<String>,
}

impl TermSet {
    pub fn contains(&self, term_id: &str) -> bool {
        self.ids.contains(term_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// Resolves term uuid sets to closed term sets, caching per input set.
///
/// One index belongs to one resolution request. It must not be kept across
/// requests, since the taxonomy may change between them.
pub struct TermHierarchyIndex {
    lookup: Arc<dyn TermLookup>,
    /// Sorted, deduplicated uuids -> closed set.
    cache: Mutex<HashMap<Vec<String>, Arc<TermSet>>>,
}

impl TermHierarchyIndex {
    pub fn new(lookup: Arc<dyn TermLookup>) -> Self {
        Self {
            lookup,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Close a set of term uuids over the descendant relation.
    ///
    /// Fails with [`FeedError::UnresolvedTerms`] naming every uuid that does
    /// not resolve to a term. Input order and duplicates do not matter.
    pub fn close<I, S>(&self, uuids: I) -> Result<Arc<TermSet>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key: Vec<String> = uuids.into_iter().map(|u| u.as_ref().to_string()).collect();
        key.sort();
        key.dedup();

        if let Some(set) = self.cache.lock().get(&key) {
            return Ok(Arc::clone(set));
        }

        let mut roots = Vec::with_capacity(key.len());
        let mut unresolved = Vec::new();
        for uuid in &key {
            match self.lookup.resolve_uuid(uuid)? {
                Some(id) => roots.push(id),
                None => unresolved.push(uuid.clone()),
            }
        }
        if !unresolved.is_empty() {
            return Err(FeedError::UnresolvedTerms(unresolved));
        }

        let mut ids: HashSet<String> = HashSet::new();
        let mut stack = roots;
        while let Some(term) = stack.pop() {
            if !ids.insert(term.clone()) {
                continue;
            }
            for child in self.lookup.children(&term)? {
                if !ids.contains(&child) {
                    stack.push(child);
                }
            }
        }

        debug!(terms = key.len(), closed = ids.len(), "closed term set");

        let set = Arc::new(TermSet { ids });
        self.cache.lock().insert(key, Arc::clone(&set));
        Ok(set)
    }

    /// Number of distinct input sets closed so far.
    pub fn cached_sets(&self) -> usize {
        self.cache.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::MemoryTaxonomy;

    fn taxonomy() -> Arc<MemoryTaxonomy> {
        // 1 (chan-A)
        // +- 2 (chan-B)
        // |  +- 4 (chan-D)
        // +- 3 (chan-C)
        // 5 (other)
        let taxonomy = MemoryTaxonomy::new();
        taxonomy.add_term("1", "chan-A", None);
        taxonomy.add_term("2", "chan-B", Some("1"));
        taxonomy.add_term("3", "chan-C", Some("1"));
        taxonomy.add_term("4", "chan-D", Some("2"));
        taxonomy.add_term("5", "other", None);
        Arc::new(taxonomy)
    }

    #[test]
    fn test_close_includes_full_subtree() {
        let index = TermHierarchyIndex::new(taxonomy());

        let set = index.close(["chan-A"]).unwrap();
        let mut ids: Vec<_> = set.iter().collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
        assert!(!set.contains("5"));
    }

    #[test]
    fn test_close_leaf() {
        let index = TermHierarchyIndex::new(taxonomy());

        let set = index.close(["chan-D"]).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("4"));
    }

    #[test]
    fn test_unresolved_terms_are_all_reported() {
        let index = TermHierarchyIndex::new(taxonomy());

        let err = index.close(["zz-missing", "chan-A", "aa-missing"]).unwrap_err();
        match err {
            FeedError::UnresolvedTerms(uuids) => {
                assert_eq!(uuids, vec!["aa-missing", "zz-missing"]);
            }
            other => panic!("Expected UnresolvedTerms, got {:?}", other),
        }
        assert_eq!(index.cached_sets(), 0);
    }

    #[test]
    fn test_cache_is_order_insensitive() {
        let index = TermHierarchyIndex::new(taxonomy());

        let a = index.close(["chan-C", "chan-B"]).unwrap();
        let b = index.close(["chan-B", "chan-C", "chan-B"]).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(index.cached_sets(), 1);
    }

    #[test]
    fn test_cyclic_taxonomy_terminates() {
        let taxonomy = MemoryTaxonomy::new();
        taxonomy.add_term("1", "a", Some("2"));
        taxonomy.add_term("2", "b", Some("1"));
        let index = TermHierarchyIndex::new(Arc::new(taxonomy));

        let set = index.close(["a"]).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let index = TermHierarchyIndex::new(taxonomy());
        let set = index.close(Vec::<String>::new()).unwrap();
        assert!(set.is_empty());
    }
}
