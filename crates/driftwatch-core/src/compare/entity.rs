//! Keyed entity-list diffing shared by every comparator.
//!
//! Entities are matched by their stable `id`. Scalar fields of matched
//! entities are compared one by one; declared child collections are diffed
//! recursively with the parent's path as prefix, so every change stays
//! traceable to its root entity.

use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

use crate::errors::DriftError;
use crate::model::change::{ChangeType, RawChange};
use crate::model::snapshot::SnapshotType;

/// Fields that change on every save and carry no configuration meaning.
const NOISE_FIELDS: &[&str] = &["updated_at", "updatedAt", "date_updated", "dateUpdated"];

/// Shape of one entity collection inside a snapshot payload.
#[derive(Debug, Clone, Copy)]
pub struct EntitySpec {
    /// Entity type reported on every change (`stage`, `ai_worker`, ...)
    pub entity_type: &'static str,
    /// Key of the array holding these entities in the parent object
    pub collection_key: &'static str,
    /// Path segment used for these entities; top-level collections use the
    /// entity type, nested ones the collection key
    pub path_segment: &'static str,
    pub children: &'static [EntitySpec],
}

pub(crate) struct EntityDiffer<'a> {
    snapshot_type: SnapshotType,
    out: &'a mut Vec<RawChange>,
}

impl<'a> EntityDiffer<'a> {
    pub(crate) fn new(snapshot_type: SnapshotType, out: &'a mut Vec<RawChange>) -> Self {
        Self { snapshot_type, out }
    }

    /// Diff the top-level collection `spec` between two payload roots.
    pub(crate) fn diff_root(
        &mut self,
        spec: &EntitySpec,
        before: &Value,
        after: &Value,
    ) -> Result<(), DriftError> {
        let before_root = self.as_object(before, "$")?;
        let after_root = self.as_object(after, "$")?;
        self.diff_collection(spec, before_root, after_root, None)
    }

    fn diff_collection(
        &mut self,
        spec: &EntitySpec,
        before_parent: &Map<String, Value>,
        after_parent: &Map<String, Value>,
        prefix: Option<&str>,
    ) -> Result<(), DriftError> {
        let location = match prefix {
            Some(p) => format!("{}.{}", p, spec.collection_key),
            None => spec.collection_key.to_string(),
        };
        let before_items = self.collect_entities(before_parent.get(spec.collection_key), &location)?;
        let after_items = self.collect_entities(after_parent.get(spec.collection_key), &location)?;

        let after_index: HashMap<&str, &Map<String, Value>> =
            after_items.iter().map(|(id, e)| (id.as_str(), *e)).collect();
        let before_ids: BTreeSet<&str> = before_items.iter().map(|(id, _)| id.as_str()).collect();

        for (id, before_entity) in &before_items {
            let path = entity_path(prefix, spec.path_segment, id);
            match after_index.get(id.as_str()) {
                None => self.out.push(RawChange {
                    entity_id: id.clone(),
                    entity_type: spec.entity_type.to_string(),
                    change_type: ChangeType::Removed,
                    description: format!("{} {} removed", describe(spec, before_entity, id), at(prefix)),
                    diff_path: path,
                    before_value: Some(Value::Object((*before_entity).clone())),
                    after_value: None,
                }),
                Some(after_entity) => {
                    self.diff_fields(spec, id, &path, before_entity, after_entity);
                    for child in spec.children {
                        self.diff_collection(child, before_entity, after_entity, Some(&path))?;
                    }
                }
            }
        }

        for (id, after_entity) in &after_items {
            if before_ids.contains(id.as_str()) {
                continue;
            }
            self.out.push(RawChange {
                entity_id: id.clone(),
                entity_type: spec.entity_type.to_string(),
                change_type: ChangeType::Added,
                description: format!("{} {} added", describe(spec, after_entity, id), at(prefix)),
                diff_path: entity_path(prefix, spec.path_segment, id),
                before_value: None,
                after_value: Some(Value::Object((*after_entity).clone())),
            });
        }

        Ok(())
    }

    fn diff_fields(
        &mut self,
        spec: &EntitySpec,
        id: &str,
        path: &str,
        before: &Map<String, Value>,
        after: &Map<String, Value>,
    ) {
        let child_keys: BTreeSet<&str> = spec.children.iter().map(|c| c.collection_key).collect();
        let keys: BTreeSet<&str> = before
            .keys()
            .chain(after.keys())
            .map(String::as_str)
            .filter(|k| *k != "id" && !child_keys.contains(k) && !NOISE_FIELDS.contains(k))
            .collect();

        for key in keys {
            let old = before.get(key);
            let new = after.get(key);
            if old == new {
                continue;
            }
            self.out.push(RawChange {
                entity_id: id.to_string(),
                entity_type: spec.entity_type.to_string(),
                change_type: ChangeType::Modified,
                diff_path: format!("{}.{}", path, key),
                before_value: old.cloned(),
                after_value: new.cloned(),
                description: format!("{} {} field '{}' changed", spec.entity_type, id, key),
            });
        }
    }

    fn collect_entities<'v>(
        &self,
        collection: Option<&'v Value>,
        location: &str,
    ) -> Result<Vec<(String, &'v Map<String, Value>)>, DriftError> {
        let items = match collection {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(self.malformed(location, "expected an array of entities")),
        };

        let mut seen = BTreeSet::new();
        let mut entities = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let item_location = format!("{}[{}]", location, index);
            let entity = self.as_object(item, &item_location)?;
            let id = match entity.get("id") {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => return Err(self.malformed(&item_location, "entity has no stable id")),
            };
            if !seen.insert(id.clone()) {
                return Err(self.malformed(&item_location, &format!("duplicate entity id {}", id)));
            }
            entities.push((id, entity));
        }
        Ok(entities)
    }

    fn as_object<'v>(&self, value: &'v Value, location: &str) -> Result<&'v Map<String, Value>, DriftError> {
        value
            .as_object()
            .ok_or_else(|| self.malformed(location, "expected an object"))
    }

    fn malformed(&self, path: &str, reason: &str) -> DriftError {
        DriftError::MalformedPayload {
            snapshot_type: self.snapshot_type,
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn entity_path(prefix: Option<&str>, segment: &str, id: &str) -> String {
    match prefix {
        Some(p) => format!("{}.{}[{}]", p, segment, id),
        None => format!("{}[{}]", segment, id),
    }
}

fn describe(spec: &EntitySpec, entity: &Map<String, Value>, id: &str) -> String {
    match entity.get("name").and_then(Value::as_str) {
        Some(name) => format!("{} '{}' ({})", spec.entity_type, name, id),
        None => format!("{} {}", spec.entity_type, id),
    }
}

fn at(prefix: Option<&str>) -> String {
    match prefix {
        Some(p) => format!("in {}", p),
        None => "at top level".to_string(),
    }
}
