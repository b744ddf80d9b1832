//! Core types for the changes feed.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the default workspace.
pub const DEFAULT_WORKSPACE: &str = "live";

/// Position in the sequence log (per-workspace).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Sequence(pub u64);

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seq({})", self.0)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sequence {
    pub fn next(self) -> Self {
        Sequence(self.0 + 1)
    }

    /// Whether this is the "from start" / "to end" marker.
    pub fn is_unbounded(self) -> bool {
        self.0 == 0
    }
}

/// Identifies an entity by type and local id.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub entity_type: String,
    pub id: String,
}

impl EntityKey {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Debug for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

/// A single entry of the sequence log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceEntry {
    pub seq: Sequence,
    pub entity_type: String,
    pub entity_id: String,
    /// Unique key of the entity across types.
    pub entity_uuid: String,
    pub revision_id: String,
    pub rev: String,
    #[serde(default)]
    pub deleted: bool,
    /// Local entries are never replicated.
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub is_stub: bool,
}

impl SequenceEntry {
    /// Build a log entry for the given revision of an entity.
    pub fn for_entity(seq: Sequence, entity: &Entity) -> Self {
        Self {
            seq,
            entity_type: entity.entity_type.clone(),
            entity_id: entity.id.clone(),
            entity_uuid: entity.uuid.clone(),
            revision_id: entity.revision_id.clone(),
            rev: entity.rev.clone(),
            deleted: entity.deleted,
            local: false,
            is_stub: false,
        }
    }

    pub fn entity_key(&self) -> EntityKey {
        EntityKey::new(&self.entity_type, &self.entity_id)
    }
}

/// One value of a field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldItem {
    /// Reference to another entity.
    Reference {
        target_type: String,
        target_id: String,
    },
    /// Any other value.
    Value(serde_json::Value),
}

impl FieldItem {
    pub fn reference(target_type: impl Into<String>, target_id: impl Into<String>) -> Self {
        FieldItem::Reference {
            target_type: target_type.into(),
            target_id: target_id.into(),
        }
    }

    /// The referenced entity, if this item is a reference.
    pub fn target(&self) -> Option<EntityKey> {
        match self {
            FieldItem::Reference {
                target_type,
                target_id,
            } => Some(EntityKey::new(target_type, target_id)),
            FieldItem::Value(_) => None,
        }
    }
}

/// A loaded revision of an entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: String,
    pub bundle: String,
    pub id: String,
    pub uuid: String,
    #[serde(default)]
    pub revision_id: String,
    #[serde(default)]
    pub rev: String,
    #[serde(default)]
    pub deleted: bool,

    /// Whether the entity carries structured fields (content, not config).
    #[serde(default = "default_fieldable")]
    pub fieldable: bool,

    #[serde(default)]
    pub fields: BTreeMap<String, Vec<FieldItem>>,
}

fn default_fieldable() -> bool {
    true
}

impl Entity {
    /// Create a fieldable entity with no fields.
    pub fn new(
        entity_type: impl Into<String>,
        bundle: impl Into<String>,
        id: impl Into<String>,
        uuid: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            id: id.into(),
            uuid: uuid.into(),
            revision_id: String::new(),
            rev: String::new(),
            deleted: false,
            fieldable: true,
            fields: BTreeMap::new(),
        }
    }

    /// Set a scalar field.
    pub fn with_value(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields
            .entry(field.into())
            .or_default()
            .push(FieldItem::Value(value));
        self
    }

    /// Add a reference to a field.
    pub fn with_reference(
        mut self,
        field: impl Into<String>,
        target_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        self.fields
            .entry(field.into())
            .or_default()
            .push(FieldItem::reference(target_type, target_id));
        self
    }

    /// Mark the entity as not fieldable (config-like).
    pub fn not_fieldable(mut self) -> Self {
        self.fieldable = false;
        self
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.entity_type, &self.id)
    }

    /// `"{type}.{bundle}"`.
    pub fn type_bundle(&self) -> String {
        format!("{}.{}", self.entity_type, self.bundle)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Items of a field (empty when the field is absent).
    pub fn field(&self, field: &str) -> &[FieldItem] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entities referenced by a field.
    pub fn references<'a>(&'a self, field: &str) -> impl Iterator<Item = EntityKey> + 'a {
        self.field(field).iter().filter_map(FieldItem::target)
    }
}

/// A `{rev}` entry in a change record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRef {
    pub rev: String,
}

/// One row of the changes feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Present for rows taken from the log range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<Sequence>,

    pub id: String,

    pub changes: Vec<RevisionRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<serde_json::Value>,
}

impl ChangeRecord {
    /// Build a record from a log entry.
    pub fn from_entry(entry: &SequenceEntry) -> Self {
        Self {
            seq: Some(entry.seq),
            id: entry.entity_uuid.clone(),
            changes: vec![RevisionRef {
                rev: entry.rev.clone(),
            }],
            deleted: entry.deleted.then_some(true),
            doc: None,
        }
    }

    /// Build a minimal record for an entity that has no entry in the range.
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            seq: None,
            id: entity.uuid.clone(),
            changes: vec![RevisionRef {
                rev: entity.rev.clone(),
            }],
            deleted: entity.deleted.then_some(true),
            doc: None,
        }
    }

    pub fn with_doc(mut self, doc: Option<serde_json::Value>) -> Self {
        self.doc = doc;
        self
    }
}

/// Compute a CouchDB style revision token: `{generation}-{digest}`.
pub fn rev_token(generation: u64, content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(generation.to_le_bytes());
    hasher.update(content);
    let digest = hasher.finalize();
    format!("{}-{}", generation, hex::encode(&digest[..16]))
}

/// Generation part of a revision token (0 when malformed or empty).
pub fn rev_generation(rev: &str) -> u64 {
    rev.split_once('-')
        .and_then(|(generation, _)| generation.parse().ok())
        .unwrap_or(0)
}
