//! Comparator Set.
//!
//! One comparator per configuration domain. Each consumes the payloads of two
//! snapshots of the same domain and produces an ordered list of raw
//! (unclassified) changes.
//!
//! ## Guarantees
//!
//! - **Determinism**: identical inputs always yield an identical ordered list.
//! - **Keyed matching**: entities are matched by stable id. REMOVED if only in
//!   `before`, ADDED if only in `after`, MODIFIED per differing field otherwise.
//! - **Traceability**: nested collections carry the parent path, e.g.
//!   `pipeline[P].stages[B]`.
//!
//! ## Ordering
//!
//! Within a collection, removals and modifications follow `before` order,
//! then additions follow `after` order. A matched entity's field changes
//! precede its children's changes.

pub mod ai_worker;
pub mod calendar;
pub mod entity;
pub mod location;
pub mod pipeline;
pub mod workflow;

use serde_json::Value;

use crate::errors::DriftError;
use crate::model::change::RawChange;
use crate::model::snapshot::SnapshotType;
use entity::{EntityDiffer, EntitySpec};

/// Context handed to a comparator alongside the two payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareContext {
    pub snapshot_type: SnapshotType,
    pub tenant_id: Option<String>,
}

impl CompareContext {
    pub fn new(snapshot_type: SnapshotType) -> Self {
        Self {
            snapshot_type,
            tenant_id: None,
        }
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

/// Closed dispatch over the supported domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Pipeline,
    Workflow,
    Calendar,
    AiWorker,
    Location,
}

impl Comparator {
    pub fn for_type(snapshot_type: SnapshotType) -> Self {
        match snapshot_type {
            SnapshotType::Pipeline => Comparator::Pipeline,
            SnapshotType::Workflow => Comparator::Workflow,
            SnapshotType::Calendar => Comparator::Calendar,
            SnapshotType::AiWorker => Comparator::AiWorker,
            SnapshotType::Location => Comparator::Location,
        }
    }

    pub fn snapshot_type(&self) -> SnapshotType {
        match self {
            Comparator::Pipeline => SnapshotType::Pipeline,
            Comparator::Workflow => SnapshotType::Workflow,
            Comparator::Calendar => SnapshotType::Calendar,
            Comparator::AiWorker => SnapshotType::AiWorker,
            Comparator::Location => SnapshotType::Location,
        }
    }

    fn root_spec(&self) -> &'static EntitySpec {
        match self {
            Comparator::Pipeline => &pipeline::PIPELINE,
            Comparator::Workflow => &workflow::WORKFLOW,
            Comparator::Calendar => &calendar::CALENDAR,
            Comparator::AiWorker => &ai_worker::AI_WORKER,
            Comparator::Location => &location::LOCATION,
        }
    }

    /// Compare two payloads of this comparator's domain.
    ///
    /// # Errors
    ///
    /// `DriftError::MalformedPayload` when a payload root is not an object, a
    /// collection is not an array, or an entity lacks a unique id.
    pub fn compare(
        &self,
        before: &Value,
        after: &Value,
        context: &CompareContext,
    ) -> Result<Vec<RawChange>, DriftError> {
        let mut changes = Vec::new();
        EntityDiffer::new(context.snapshot_type, &mut changes).diff_root(
            self.root_spec(),
            before,
            after,
        )?;
        Ok(changes)
    }
}

/// Compare two payloads using the comparator registered for `context.snapshot_type`.
pub fn compare(
    before: &Value,
    after: &Value,
    context: &CompareContext,
) -> Result<Vec<RawChange>, DriftError> {
    Comparator::for_type(context.snapshot_type).compare(before, after, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_type_has_a_comparator() {
        for ty in SnapshotType::ALL {
            assert_eq!(Comparator::for_type(ty).snapshot_type(), ty);
        }
    }

    #[test]
    fn test_compare_is_deterministic() {
        let before = json!({"pipelines": [
            {"id": "P1", "name": "a", "stages": [{"id": "S1"}, {"id": "S2", "name": "x"}]},
            {"id": "P2", "name": "b"}
        ]});
        let after = json!({"pipelines": [
            {"id": "P3", "name": "c"},
            {"id": "P1", "name": "a2", "stages": [{"id": "S2", "name": "y"}, {"id": "S3"}]}
        ]});
        let ctx = CompareContext::new(SnapshotType::Pipeline);

        let first = compare(&before, &after, &ctx).unwrap();
        let second = compare(&before, &after, &ctx).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
