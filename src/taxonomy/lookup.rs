//! Term lookup trait and in-memory taxonomy.

use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Read access to a term hierarchy.
pub trait TermLookup: Send + Sync {
    /// Resolve a term uuid to its term id.
    fn resolve_uuid(&self, uuid: &str) -> Result<Option<String>>;

    /// Immediate children of a term.
    fn children(&self, term_id: &str) -> Result<Vec<String>>;
}

#[derive(Default)]
struct Terms {
    by_uuid: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,
}

/// In-memory taxonomy.
#[derive(Default)]
pub struct MemoryTaxonomy {
    terms: RwLock<Terms>,
}

impl MemoryTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term below `parent` (a term id), or at the root.
    pub fn add_term(&self, id: &str, uuid: &str, parent: Option<&str>) {
        let mut terms = self.terms.write();
        terms.by_uuid.insert(uuid.to_string(), id.to_string());
        if let Some(parent) = parent {
            terms
                .children
                .entry(parent.to_string())
                .or_default()
                .push(id.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.terms.read().by_uuid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TermLookup for MemoryTaxonomy {
    fn resolve_uuid(&self, uuid: &str) -> Result<Option<String>> {
        Ok(self.terms.read().by_uuid.get(uuid).cloned())
    }

    fn children(&self, term_id: &str) -> Result<Vec<String>> {
        Ok(self
            .terms
            .read()
            .children
            .get(term_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_resolve() {
        let taxonomy = MemoryTaxonomy::new();
        taxonomy.add_term("1", "chan-A", None);
        taxonomy.add_term("2", "chan-B", Some("1"));
        taxonomy.add_term("3", "chan-C", Some("1"));

        assert_eq!(taxonomy.len(), 3);
        assert_eq!(taxonomy.resolve_uuid("chan-B").unwrap(), Some("2".into()));
        assert_eq!(taxonomy.resolve_uuid("nope").unwrap(), None);
        assert_eq!(taxonomy.children("1").unwrap(), vec!["2", "3"]);
        assert!(taxonomy.children("2").unwrap().is_empty());
    }
}
