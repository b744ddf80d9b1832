//! Document normalization for `include_docs`.

use crate::error::Result;
use crate::types::Entity;
use serde_json::{Map, Value};

/// Turns a revision into the document embedded in a change record.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, entity: &Entity) -> Result<Value>;
}

/// Flat JSON document: `_id`, `_rev`, `@type`, optional `_deleted`, then one
/// key per field holding its item list.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonNormalizer;

impl Normalizer for JsonNormalizer {
    fn normalize(&self, entity: &Entity) -> Result<Value> {
        let mut doc = Map::new();
        doc.insert("_id".into(), Value::String(entity.uuid.clone()));
        doc.insert("_rev".into(), Value::String(entity.rev.clone()));
        doc.insert("@type".into(), Value::String(entity.type_bundle()));
        if entity.deleted {
            doc.insert("_deleted".into(), Value::Bool(true));
        }

        for (name, items) in &entity.fields {
            doc.insert(name.clone(), serde_json::to_value(items)?);
        }

        Ok(Value::Object(doc))
    }
}
