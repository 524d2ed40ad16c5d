//! AI-agent definitions: capabilities, model settings and callable actions.

use super::entity::EntitySpec;

pub const WORKER_ACTION: EntitySpec = EntitySpec {
    entity_type: "action",
    collection_key: "actions",
    path_segment: "actions",
    children: &[],
};

pub const AI_WORKER: EntitySpec = EntitySpec {
    entity_type: "ai_worker",
    collection_key: "ai_workers",
    path_segment: "ai_worker",
    children: &[WORKER_ACTION],
};
