//! Automation workflows: triggers start them, actions do the work.

use super::entity::EntitySpec;

pub const TRIGGER: EntitySpec = EntitySpec {
    entity_type: "trigger",
    collection_key: "triggers",
    path_segment: "triggers",
    children: &[],
};

pub const ACTION: EntitySpec = EntitySpec {
    entity_type: "action",
    collection_key: "actions",
    path_segment: "actions",
    children: &[],
};

pub const WORKFLOW: EntitySpec = EntitySpec {
    entity_type: "workflow",
    collection_key: "workflows",
    path_segment: "workflow",
    children: &[TRIGGER, ACTION],
};
